//! JSON run configuration for the Acoustics Toolbox models
//!
//! Keys follow the toolbox runners: environment keys are shared between
//! KRAKEN and BELLHOP (flattened into each parameter set) and every optional
//! key falls back to a serde default.

use crate::array::{Receiver, Source};
use crate::error::{CommonError, Result};
use crate::profile::{OneOrMany, SoundSpeedProfile};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// One sound speed layer of the water column or sediment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Depths [m]
    pub z: OneOrMany,
    /// Compressional speed [m/s]
    pub c_p: OneOrMany,
    /// Shear speed [m/s]
    #[serde(default = "default_zero")]
    pub c_s: OneOrMany,
    /// Density [g/cm³]
    #[serde(default = "default_density")]
    pub rho: OneOrMany,
    /// Compressional attenuation
    #[serde(default = "default_zero")]
    pub a_p: OneOrMany,
    /// Shear attenuation
    #[serde(default = "default_zero")]
    pub a_s: OneOrMany,
    /// Number of mesh points (0 lets the model choose)
    #[serde(default)]
    pub nmesh: usize,
    /// RMS interface roughness [m]
    #[serde(default)]
    pub sigma: f64,
}

fn default_zero() -> OneOrMany {
    OneOrMany::One(0.0)
}

fn default_density() -> OneOrMany {
    OneOrMany::One(1.0)
}

impl LayerSpec {
    /// Fluid layer with default density and no attenuation
    pub fn new(z: impl Into<OneOrMany>, c_p: impl Into<OneOrMany>) -> Self {
        Self {
            z: z.into(),
            c_p: c_p.into(),
            c_s: default_zero(),
            rho: default_density(),
            a_p: default_zero(),
            a_s: default_zero(),
            nmesh: 0,
            sigma: 0.0,
        }
    }

    /// Build the validated profile
    pub fn to_profile(&self) -> Result<SoundSpeedProfile> {
        SoundSpeedProfile::with_properties(
            self.z.clone(),
            self.c_p.clone(),
            self.c_s.clone(),
            self.rho.clone(),
            self.a_p.clone(),
            self.a_s.clone(),
        )
    }

    /// Deepest depth of the layer
    pub fn z_max(&self) -> f64 {
        self.z
            .as_slice()
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Environment keys shared by every toolbox model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentParameters {
    /// Layers from the surface down
    pub layerdata: Vec<LayerSpec>,

    /// Top boundary option string
    #[serde(default = "default_top_opt")]
    pub top_opt: String,
    /// Upper halfspace depth [m]
    #[serde(default)]
    pub top_z: Option<f64>,
    /// Upper halfspace compressional speed [m/s]
    #[serde(default)]
    pub top_c_p: Option<f64>,
    /// Upper halfspace shear speed [m/s]
    #[serde(default)]
    pub top_c_s: f64,
    /// Upper halfspace density [g/cm³]
    #[serde(default)]
    pub top_rho: Option<f64>,
    /// Upper halfspace compressional attenuation
    #[serde(default)]
    pub top_a_p: f64,
    /// Upper halfspace shear attenuation
    #[serde(default)]
    pub top_a_s: f64,

    /// Bottom boundary option string
    #[serde(default = "default_bot_opt")]
    pub bot_opt: String,
    /// Bottom interface roughness [m]
    #[serde(default)]
    pub bot_sigma: f64,
    /// Lower halfspace depth [m]; each model picks its own default
    #[serde(default)]
    pub bot_z: Option<f64>,
    /// Lower halfspace compressional speed [m/s]
    #[serde(default)]
    pub bot_c_p: Option<f64>,
    /// Lower halfspace shear speed [m/s]
    #[serde(default)]
    pub bot_c_s: f64,
    /// Lower halfspace density [g/cm³]
    #[serde(default)]
    pub bot_rho: Option<f64>,
    /// Lower halfspace compressional attenuation
    #[serde(default)]
    pub bot_a_p: f64,
    /// Lower halfspace shear attenuation
    #[serde(default)]
    pub bot_a_s: f64,
    /// Grain size for the grain-size bottom option
    #[serde(default)]
    pub bot_mz: Option<f64>,

    /// Scratch directory for toolbox input and output files
    #[serde(default = "default_tmpdir")]
    pub tmpdir: String,
    /// Source depths [m]
    #[serde(default = "default_one")]
    pub src_z: OneOrMany,
    /// Receiver depths [m]
    #[serde(default = "default_one")]
    pub rec_z: OneOrMany,
    /// Receiver ranges [km]
    #[serde(default = "default_one")]
    pub rec_r: OneOrMany,
    /// Receiver array tilt [deg]
    #[serde(default)]
    pub tilt: Option<f64>,
    /// Receiver array azimuth [deg]
    #[serde(default)]
    pub azimuth: Option<f64>,
    /// Receiver array tilt pivot depth [m]
    #[serde(default)]
    pub z_pivot: Option<f64>,
}

fn default_top_opt() -> String {
    "CVF    ".to_string()
}

fn default_bot_opt() -> String {
    "A".to_string()
}

fn default_tmpdir() -> String {
    "tmp".to_string()
}

fn default_one() -> OneOrMany {
    OneOrMany::One(1.0)
}

impl EnvironmentParameters {
    /// Environment with default boundaries around the given layers
    pub fn new(layerdata: Vec<LayerSpec>) -> Self {
        Self {
            layerdata,
            top_opt: default_top_opt(),
            top_z: None,
            top_c_p: None,
            top_c_s: 0.0,
            top_rho: None,
            top_a_p: 0.0,
            top_a_s: 0.0,
            bot_opt: default_bot_opt(),
            bot_sigma: 0.0,
            bot_z: None,
            bot_c_p: None,
            bot_c_s: 0.0,
            bot_rho: None,
            bot_a_p: 0.0,
            bot_a_s: 0.0,
            bot_mz: None,
            tmpdir: default_tmpdir(),
            src_z: default_one(),
            rec_z: default_one(),
            rec_r: default_one(),
            tilt: None,
            azimuth: None,
            z_pivot: None,
        }
    }

    /// Deepest depth over all layers
    pub fn deepest_layer(&self) -> Result<f64> {
        self.layerdata
            .last()
            .map(LayerSpec::z_max)
            .ok_or_else(|| CommonError::InvalidConfig("`layerdata` has no layers".to_string()))
    }

    /// Validated layer profiles
    pub fn profiles(&self) -> Result<Vec<SoundSpeedProfile>> {
        if self.layerdata.is_empty() {
            return Err(CommonError::InvalidConfig(
                "`layerdata` has no layers".to_string(),
            ));
        }
        self.layerdata.iter().map(LayerSpec::to_profile).collect()
    }

    /// Source array built from `src_z`
    pub fn source(&self) -> Result<Source> {
        Source::new(self.src_z.to_vec())
    }

    /// Receiver array built from `rec_z`, `rec_r` and the optional tilt
    pub fn receiver(&self) -> Result<Receiver> {
        let receiver = Receiver::new(self.rec_z.to_vec(), self.rec_r.to_vec())?;
        Ok(match self.tilt {
            Some(tilt) => receiver.with_tilt(tilt, self.azimuth, self.z_pivot),
            None => receiver,
        })
    }
}

/// Parameters of a KRAKEN run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KrakenParameters {
    /// Run title
    #[serde(default = "default_kraken_title")]
    pub title: String,
    /// Frequency [Hz]
    #[serde(default = "default_kraken_freq")]
    pub freq: f64,
    /// Environment
    #[serde(flatten)]
    pub env: EnvironmentParameters,
    /// Lower phase speed limit [m/s]
    #[serde(default = "default_clow")]
    pub clow: f64,
    /// Upper phase speed limit [m/s]; `null` takes the deepest layer's
    /// maximum compressional speed
    #[serde(default = "default_chigh")]
    pub chigh: Option<f64>,
    /// Executable name, `KRAKEN` or `KRAKENC`
    #[serde(default = "default_model")]
    pub model: String,
    /// Keep the toolbox files after the run
    #[serde(default)]
    pub keep_files: bool,
    /// Directory holding the toolbox executables; the search path when unset
    #[serde(default)]
    pub model_path: Option<String>,
}

fn default_kraken_title() -> String {
    "Kraken".to_string()
}

fn default_kraken_freq() -> f64 {
    100.0
}

fn default_clow() -> f64 {
    1500.0
}

fn default_chigh() -> Option<f64> {
    Some(1600.0)
}

fn default_model() -> String {
    "KRAKEN".to_string()
}

impl KrakenParameters {
    /// Default KRAKEN run for the given layers
    pub fn new(layerdata: Vec<LayerSpec>) -> Self {
        Self {
            title: default_kraken_title(),
            freq: default_kraken_freq(),
            env: EnvironmentParameters::new(layerdata),
            clow: default_clow(),
            chigh: default_chigh(),
            model: default_model(),
            keep_files: false,
            model_path: None,
        }
    }

    /// Lower halfspace depth, one metre below the deepest layer when unset
    pub fn bot_z(&self) -> Result<f64> {
        match self.env.bot_z {
            Some(z) => Ok(z),
            None => Ok(self.env.deepest_layer()? + 1.0),
        }
    }
}

/// Parameters of a BELLHOP run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BellhopParameters {
    /// Run title
    #[serde(default = "default_bellhop_title")]
    pub title: String,
    /// Frequency [Hz]
    #[serde(default = "default_bellhop_freq")]
    pub freq: f64,
    /// Environment
    #[serde(flatten)]
    pub env: EnvironmentParameters,
    /// Run type character
    #[serde(default = "default_run_type")]
    pub run_type: char,
    /// Beam type character
    #[serde(default = "default_beam_type")]
    pub beam_type: char,
    /// Source beam pattern file choice
    #[serde(default = "default_pattern_file_choice")]
    pub pattern_file_choice: char,
    /// Point or line source
    #[serde(default = "default_source_type")]
    pub source_type: char,
    /// Rectilinear or irregular receiver grid
    #[serde(default = "default_grid_type")]
    pub grid_type: char,
    /// Launch angle limits or list [deg]
    #[serde(default = "default_alpha")]
    pub alpha: Vec<f64>,
    /// Number of beams
    #[serde(default = "default_nbeams")]
    pub nbeams: usize,
    /// Index of a single beam to trace
    #[serde(default)]
    pub isingle: Option<usize>,
    /// Maximum depth traced [m]
    #[serde(default = "default_zbox")]
    pub zbox: f64,
    /// Maximum range traced [km]
    #[serde(default = "default_rbox")]
    pub rbox: f64,
    /// Integration step [m], 0 lets the model choose
    #[serde(default)]
    pub step: f64,
    /// Keep the toolbox files after the run
    #[serde(default)]
    pub keep_files: bool,
    /// Directory holding the toolbox executables; the search path when unset
    #[serde(default)]
    pub model_path: Option<String>,
}

fn default_bellhop_title() -> String {
    "Bellhop".to_string()
}

fn default_bellhop_freq() -> f64 {
    400.0
}

fn default_run_type() -> char {
    'R'
}

fn default_beam_type() -> char {
    'G'
}

fn default_pattern_file_choice() -> char {
    'O'
}

fn default_source_type() -> char {
    'R'
}

fn default_grid_type() -> char {
    'R'
}

fn default_alpha() -> Vec<f64> {
    vec![-11.0, 11.0]
}

fn default_nbeams() -> usize {
    51
}

fn default_zbox() -> f64 {
    1000.0
}

fn default_rbox() -> f64 {
    100.0
}

impl BellhopParameters {
    /// Default BELLHOP ray trace for the given layers
    pub fn new(layerdata: Vec<LayerSpec>) -> Self {
        Self {
            title: default_bellhop_title(),
            freq: default_bellhop_freq(),
            env: EnvironmentParameters::new(layerdata),
            run_type: default_run_type(),
            beam_type: default_beam_type(),
            pattern_file_choice: default_pattern_file_choice(),
            source_type: default_source_type(),
            grid_type: default_grid_type(),
            alpha: default_alpha(),
            nbeams: default_nbeams(),
            isingle: None,
            zbox: default_zbox(),
            rbox: default_rbox(),
            step: 0.0,
            keep_files: false,
            model_path: None,
        }
    }

    /// Lower halfspace depth, the deepest layer when unset
    pub fn bot_z(&self) -> Result<f64> {
        match self.env.bot_z {
            Some(z) => Ok(z),
            None => self.env.deepest_layer(),
        }
    }
}

/// Source-side and receiver-side environments of an adiabatic run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdiabaticParameters {
    /// Environment at the source
    pub src: KrakenParameters,
    /// Environment at the receiver
    pub rec: KrakenParameters,
}

/// Loading and saving of JSON parameter documents
pub trait ParameterFile: Serialize + for<'de> Deserialize<'de> + Sized {
    /// Load parameters from a JSON file
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save parameters to a pretty-printed JSON file
    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build parameters from a JSON object
    fn from_map(map: Map<String, Value>) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Convert parameters to a JSON object
    fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(CommonError::InvalidConfig(format!(
                "parameters serialized to a non-object value: {other}"
            ))),
        }
    }
}

impl ParameterFile for KrakenParameters {}
impl ParameterFile for BellhopParameters {}
impl ParameterFile for AdiabaticParameters {}
