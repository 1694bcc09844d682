//! Top and bottom boundaries of a toolbox environment
//!
//! The top option is a string whose second character selects the upper
//! halfspace type; the bottom option's first character selects the lower
//! halfspace type. An acoustic halfspace (`'A'`) needs its depth, speed and
//! density, a grain-size bottom (`'G'`) needs its depth and `mz`.

use crate::error::{Result, ToolboxError};
use oa_common::EnvironmentParameters;

/// Upper boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Top {
    /// Option string, e.g. `"CVF    "`
    pub opt: String,
    /// Halfspace depth [m]
    pub z: Option<f64>,
    /// Compressional speed [m/s]
    pub c_p: Option<f64>,
    /// Shear speed [m/s]
    pub c_s: f64,
    /// Density [g/cm³]
    pub rho: Option<f64>,
    /// Compressional attenuation
    pub a_p: f64,
    /// Shear attenuation
    pub a_s: f64,
}

impl Default for Top {
    fn default() -> Self {
        Self {
            opt: "CVF    ".to_string(),
            z: None,
            c_p: None,
            c_s: 0.0,
            rho: None,
            a_p: 0.0,
            a_s: 0.0,
        }
    }
}

impl Top {
    /// Validated top boundary with no halfspace properties
    pub fn new(opt: impl Into<String>) -> Result<Self> {
        let top = Self {
            opt: opt.into(),
            ..Self::default()
        };
        top.validate()?;
        Ok(top)
    }

    /// Top boundary from the `top_*` run parameters
    pub fn from_parameters(params: &EnvironmentParameters) -> Result<Self> {
        let top = Self {
            opt: params.top_opt.clone(),
            z: params.top_z,
            c_p: params.top_c_p,
            c_s: params.top_c_s,
            rho: params.top_rho,
            a_p: params.top_a_p,
            a_s: params.top_a_s,
        };
        top.validate()?;
        Ok(top)
    }

    /// Halfspace type character
    pub fn halfspace(&self) -> char {
        self.opt.chars().nth(1).unwrap_or(' ')
    }

    /// True when the run traces a single beam (sixth option character `'I'`)
    pub fn single_beam(&self) -> bool {
        self.opt.chars().nth(5) == Some('I')
    }

    /// Check that the properties required by the option are present
    pub fn validate(&self) -> Result<()> {
        if self.opt.chars().count() < 2 {
            return Err(ToolboxError::InvalidOption {
                kind: "top option",
                value: self.opt.clone(),
            });
        }
        if self.halfspace() == 'A' {
            require(self.z, "z", "top", 'A')?;
            require(self.c_p, "c_p", "top", 'A')?;
            require(self.rho, "rho", "top", 'A')?;
        }
        Ok(())
    }
}

/// Lower boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Bottom {
    /// Option string, e.g. `"A"`
    pub opt: String,
    /// Interfacial roughness [m]
    pub sigma: f64,
    /// Halfspace depth [m]
    pub z: Option<f64>,
    /// Compressional speed [m/s]
    pub c_p: Option<f64>,
    /// Shear speed [m/s]
    pub c_s: f64,
    /// Density [g/cm³]
    pub rho: Option<f64>,
    /// Compressional attenuation
    pub a_p: f64,
    /// Shear attenuation
    pub a_s: f64,
    /// Grain size (phi units)
    pub mz: Option<f64>,
}

impl Default for Bottom {
    fn default() -> Self {
        Self {
            opt: "A".to_string(),
            sigma: 0.0,
            z: None,
            c_p: None,
            c_s: 0.0,
            rho: None,
            a_p: 0.0,
            a_s: 0.0,
            mz: None,
        }
    }
}

impl Bottom {
    /// Acoustic halfspace at depth `z`
    pub fn acoustic(z: f64, c_p: f64, rho: f64) -> Self {
        Self {
            z: Some(z),
            c_p: Some(c_p),
            rho: Some(rho),
            ..Self::default()
        }
    }

    /// Bottom boundary from the `bot_*` run parameters
    ///
    /// `z` is the depth used when `bot_z` is not set.
    pub fn from_parameters(params: &EnvironmentParameters, z: f64) -> Result<Self> {
        let bottom = Self {
            opt: params.bot_opt.clone(),
            sigma: params.bot_sigma,
            z: Some(params.bot_z.unwrap_or(z)),
            c_p: params.bot_c_p,
            c_s: params.bot_c_s,
            rho: params.bot_rho,
            a_p: params.bot_a_p,
            a_s: params.bot_a_s,
            mz: params.bot_mz,
        };
        bottom.validate()?;
        Ok(bottom)
    }

    /// Halfspace type character
    pub fn halfspace(&self) -> char {
        self.opt.chars().next().unwrap_or(' ')
    }

    /// Check that the properties required by the option are present
    pub fn validate(&self) -> Result<()> {
        match self.halfspace() {
            'A' => {
                require(self.z, "z", "bottom", 'A')?;
                require(self.c_p, "c_p", "bottom", 'A')?;
                require(self.rho, "rho", "bottom", 'A')?;
            }
            'G' => {
                require(self.z, "z", "bottom", 'G')?;
                require(self.mz, "mz", "bottom", 'G')?;
            }
            ' ' if self.opt.is_empty() => {
                return Err(ToolboxError::InvalidOption {
                    kind: "bottom option",
                    value: String::new(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}

/// The value of a property an option requires
pub(crate) fn require(
    value: Option<f64>,
    property: &'static str,
    option: &'static str,
    kind: char,
) -> Result<f64> {
    value.ok_or(ToolboxError::UndefinedProperty {
        property,
        option,
        value: kind,
    })
}
