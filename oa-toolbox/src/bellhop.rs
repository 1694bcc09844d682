//! BELLHOP ray-tracing model
//!
//! A run writes `<title>.env`, launches `bellhop.exe` in the working
//! directory and reads the ray fans from `<title>.ray`.

use crate::environment::{Environment, clean_up_files, write_vector};
use crate::error::{Result, ToolboxError};
use crate::rays::{RayFile, read_rays};
use crate::runner::run_model;
use oa_common::{BellhopParameters, Receiver, Source};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Files produced by a BELLHOP run
pub const BELLHOP_EXTENSIONS: [&str; 3] = ["env", "prt", "ray"];

macro_rules! option_char {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Character written to the run type string
            pub fn code(&self) -> char {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl TryFrom<char> for $name {
            type Error = ToolboxError;

            fn try_from(c: char) -> Result<Self> {
                match c {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(ToolboxError::InvalidOption {
                        kind: $kind,
                        value: c.to_string(),
                    }),
                }
            }
        }
    };
}

option_char!(
    /// What the run produces
    RunType, "run type" {
        /// Ray file
        Rays = 'R',
        /// Eigenray file
        Eigenrays = 'E',
        /// Amplitude-delay file (text)
        Arrivals = 'A',
        /// Amplitude-delay file (binary)
        ArrivalsBinary = 'a',
        /// Coherent transmission loss
        Coherent = 'C',
        /// Incoherent transmission loss
        Incoherent = 'I',
        /// Semicoherent transmission loss (Lloyd mirror source pattern)
        Semicoherent = 'S',
    }
);

option_char!(
    /// Beam type
    BeamType, "beam type" {
        /// Geometric hat beams in Cartesian coordinates
        GeometricCartesian = 'G',
        /// Geometric hat beams in ray-centred coordinates
        GeometricRayCentered = 'g',
        /// Geometric Gaussian beams
        GeometricGaussian = 'B',
    }
);

option_char!(
    /// Source beam pattern
    PatternFileChoice, "pattern file choice" {
        /// Read a source beam pattern file
        Read = '*',
        /// Omnidirectional source
        Omni = 'O',
    }
);

option_char!(
    /// Source geometry
    SourceType, "source type" {
        /// Point source, cylindrical coordinates
        Point = 'R',
        /// Line source, Cartesian coordinates
        Line = 'X',
    }
);

option_char!(
    /// Receiver grid
    GridType, "grid type" {
        /// Rectilinear grid
        Rectilinear = 'R',
        /// Irregular grid
        Irregular = 'I',
    }
);

/// Run type options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BellhopOptions {
    /// What the run produces
    pub run_type: RunType,
    /// Beam type
    pub beam_type: BeamType,
    /// Source beam pattern
    pub pattern_file_choice: PatternFileChoice,
    /// Source geometry
    pub source_type: SourceType,
    /// Receiver grid
    pub grid_type: GridType,
}

impl Default for BellhopOptions {
    fn default() -> Self {
        Self {
            run_type: RunType::Rays,
            beam_type: BeamType::GeometricCartesian,
            pattern_file_choice: PatternFileChoice::Omni,
            source_type: SourceType::Point,
            grid_type: GridType::Rectilinear,
        }
    }
}

impl BellhopOptions {
    /// Options from their characters, rejecting unknown ones
    pub fn from_chars(
        run_type: char,
        beam_type: char,
        pattern_file_choice: char,
        source_type: char,
        grid_type: char,
    ) -> Result<Self> {
        Ok(Self {
            run_type: run_type.try_into()?,
            beam_type: beam_type.try_into()?,
            pattern_file_choice: pattern_file_choice.try_into()?,
            source_type: source_type.try_into()?,
            grid_type: grid_type.try_into()?,
        })
    }

    /// The five-character run type string
    pub fn opt(&self) -> String {
        [
            self.run_type.code(),
            self.beam_type.code(),
            self.pattern_file_choice.code(),
            self.source_type.code(),
            self.grid_type.code(),
        ]
        .iter()
        .collect()
    }
}

/// Launch angles
#[derive(Debug, Clone, PartialEq)]
pub struct BeamFan {
    /// Angle limits, or every angle when more than two are given [degrees]
    pub alpha: Vec<f64>,
    /// Number of beams
    pub nbeams: usize,
    /// Index of the single beam to trace
    pub isingle: Option<usize>,
}

impl Default for BeamFan {
    fn default() -> Self {
        Self {
            alpha: vec![-11.0, 11.0],
            nbeams: 51,
            isingle: None,
        }
    }
}

/// Ray integration limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericalIntegrator {
    /// Deepest depth a ray is traced to [m]
    pub zbox: f64,
    /// Longest range a ray is traced to [km]
    pub rbox: f64,
    /// Step size [m]; 0 lets BELLHOP choose
    pub step: f64,
}

/// BELLHOP environment: common blocks plus geometry, run type, fan and integrator
#[derive(Debug, Clone, PartialEq)]
pub struct BellhopEnvironment {
    /// Common environment
    pub environment: Environment,
    /// Source depths
    pub source: Source,
    /// Receiver geometry
    pub receiver: Receiver,
    /// Run type
    pub options: BellhopOptions,
    /// Launch angles
    pub fan: BeamFan,
    /// Integration limits
    pub integrator: NumericalIntegrator,
}

impl BellhopEnvironment {
    /// Environment from run parameters
    pub fn from_parameters(params: &BellhopParameters) -> Result<Self> {
        let environment =
            Environment::from_parameters(&params.title, params.freq, &params.env, params.bot_z()?)?;
        Ok(Self {
            environment,
            source: params.env.source()?,
            receiver: params.env.receiver()?,
            options: BellhopOptions::from_chars(
                params.run_type,
                params.beam_type,
                params.pattern_file_choice,
                params.source_type,
                params.grid_type,
            )?,
            fan: BeamFan {
                alpha: params.alpha.clone(),
                nbeams: params.nbeams,
                isingle: params.isingle,
            },
            integrator: NumericalIntegrator {
                zbox: params.zbox,
                rbox: params.rbox,
                step: params.step,
            },
        })
    }

    /// A single-beam top option needs `isingle`, and `isingle` needs one
    pub fn check_single_trace(&self) -> Result<()> {
        let flag = self.environment.top.opt.chars().nth(5).unwrap_or(' ');
        match (flag, self.fan.isingle) {
            ('I', None) => Err(ToolboxError::UndefinedProperty {
                property: "isingle",
                option: "top",
                value: 'I',
            }),
            (' ', Some(index)) => Err(ToolboxError::InvalidOption {
                kind: "single beam index without single-trace top option",
                value: index.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Write blocks 7 to 10
    pub fn write_blocks<W: Write>(&self, w: &mut W) -> Result<()> {
        self.check_single_trace()?;

        write_vector(w, "SD", &self.source.z, self.source.equally_spaced())?;
        write_vector(w, "RD", &self.receiver.z, self.receiver.equally_spaced())?;
        write!(w, "{} \t \t \t \t ! NR\r\n    ", self.receiver.nr())?;
        for r in &self.receiver.r {
            write!(w, "{r:6.6} ")?;
        }

        write!(w, "\r\n'{}' \t \t \t ! Run Type", self.options.opt())?;

        let isingle = self.fan.isingle.map(|i| i.to_string()).unwrap_or_default();
        write!(w, "\r\n{} {isingle} \t \t \t \t \t ! NBEAMS", self.fan.nbeams)?;
        match self.fan.alpha[..] {
            [first, last] => write!(
                w,
                "\r\n{first:6.2} {last:6.2} / \t ! ALPHA(1:NBEAMS) (degrees)"
            )?,
            _ => {
                write!(w, "\r\n    ")?;
                for a in &self.fan.alpha {
                    write!(w, "{a:6.2} ")?;
                }
                write!(w, "\t ! ALPHA(1:NBEAMS) (degrees)")?;
            }
        }

        let NumericalIntegrator { zbox, rbox, step } = self.integrator;
        write!(
            w,
            "\r\n{step} {zbox} {rbox} \t \t \t \t ! STEP (m)  ZBOX (m)  RBOX (km)"
        )?;
        Ok(())
    }

    /// Write `<title>.env`
    pub fn write_envfil(&self) -> Result<PathBuf> {
        let (path, mut writer) = self.environment.create_envfil()?;
        self.write_blocks(&mut writer)?;
        writer.flush()?;
        log::debug!("wrote {}", path.display());
        Ok(path)
    }
}

/// A BELLHOP run and its ray fans
#[derive(Debug, Clone)]
pub struct BellhopModel {
    environment: BellhopEnvironment,
    rays: Option<RayFile>,
}

impl BellhopModel {
    /// Model for an environment; nothing runs until [`BellhopModel::run`]
    pub fn new(environment: BellhopEnvironment) -> Self {
        Self {
            environment,
            rays: None,
        }
    }

    /// Run the model and read the ray file
    pub fn run(&mut self, model_path: Option<&Path>, keep_files: bool) -> Result<&RayFile> {
        let env = &self.environment.environment;
        let result = self.environment.write_envfil().and_then(|_| {
            run_model("bellhop", model_path, env)?;
            read_rays(env.file_path("ray"))
        });
        if !keep_files {
            clean_up_files(&env.tmpdir, &BELLHOP_EXTENSIONS, &env.title)?;
        }
        let rays = result?;
        log::info!("bellhop: {} rays from {} source depths", rays.num_rays(), rays.sources.len());
        let rays: &RayFile = self.rays.insert(rays);
        Ok(rays)
    }

    /// Environment of the run
    pub fn environment(&self) -> &BellhopEnvironment {
        &self.environment
    }

    /// Ray fans, once the model has run
    pub fn rays(&self) -> Option<&RayFile> {
        self.rays.as_ref()
    }

    /// Take the ray fans out of the model
    pub fn into_rays(self) -> Option<RayFile> {
        self.rays
    }
}

/// Run BELLHOP for a parameter set and return its ray fans
pub fn run_bellhop(params: &BellhopParameters) -> Result<RayFile> {
    let mut model = BellhopModel::new(BellhopEnvironment::from_parameters(params)?);
    model.run(params.model_path.as_deref().map(Path::new), params.keep_files)?;
    model
        .into_rays()
        .ok_or_else(|| ToolboxError::format(".ray", "no rays were read"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oa_common::LayerSpec;

    fn params(dir: &Path) -> BellhopParameters {
        let mut params = BellhopParameters::new(vec![LayerSpec::new(vec![0.0, 100.0], 1500.0)]);
        params.env.tmpdir = dir.to_string_lossy().into_owned();
        params.env.bot_c_p = Some(1600.0);
        params.env.bot_rho = Some(1.8);
        params.env.src_z = 50.0.into();
        params.env.rec_z = vec![10.0, 20.0, 30.0].into();
        params.env.rec_r = vec![1.0, 2.0].into();
        params
    }

    fn render(env: &BellhopEnvironment) -> Result<String> {
        let mut buf = Vec::new();
        env.write_blocks(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    #[test]
    fn test_options() {
        let opts = BellhopOptions::default();
        assert_eq!(opts.opt(), "RGORR");
        let opts = BellhopOptions::from_chars('a', 'B', '*', 'X', 'I').unwrap();
        assert_eq!(opts.opt(), "aB*XI");
        assert_eq!(opts.run_type, RunType::ArrivalsBinary);
        let err = BellhopOptions::from_chars('Z', 'G', 'O', 'R', 'R').unwrap_err();
        assert_eq!(err.to_string(), "invalid run type: `Z`");
        assert!(BeamType::try_from('x').is_err());
    }

    #[test]
    fn test_bellhop_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let env = BellhopEnvironment::from_parameters(&params(dir.path())).unwrap();
        assert_eq!(env.environment.bottom.z, Some(100.0));
        let text = render(&env).unwrap();
        let expected = "    1 \t \t \t \t ! NSD\r\n    50.000000 / \t ! SD(1)  ... (m) \r\n\
             \x20   3 \t \t \t \t ! NRD\r\n    10.000000 30.000000/ \t ! RD(1)  ... (m) \r\n\
             2 \t \t \t \t ! NR\r\n    1.000000 2.000000 \
             \r\n'RGORR' \t \t \t ! Run Type\
             \r\n51  \t \t \t \t \t ! NBEAMS\
             \r\n-11.00  11.00 / \t ! ALPHA(1:NBEAMS) (degrees)\
             \r\n0 1000 100 \t \t \t \t ! STEP (m)  ZBOX (m)  RBOX (km)";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_explicit_angles() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = BellhopEnvironment::from_parameters(&params(dir.path())).unwrap();
        env.fan.alpha = vec![-10.0, 0.0, 10.0];
        let text = render(&env).unwrap();
        assert!(text.contains("\r\n    -10.00   0.00  10.00 \t ! ALPHA(1:NBEAMS) (degrees)"));
    }

    #[test]
    fn test_single_trace_consistency() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = BellhopEnvironment::from_parameters(&params(dir.path())).unwrap();

        env.fan.isingle = Some(3);
        assert!(render(&env).unwrap_err().is_configuration_error());

        env.environment.top.opt = "CVF  I".to_string();
        let text = render(&env).unwrap();
        assert!(text.contains("\r\n51 3 \t \t \t \t \t ! NBEAMS"));

        env.fan.isingle = None;
        assert!(matches!(
            render(&env),
            Err(ToolboxError::UndefinedProperty { property: "isingle", .. })
        ));
    }

    #[test]
    fn test_invalid_option_in_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = params(dir.path());
        params.grid_type = 'Q';
        assert!(BellhopEnvironment::from_parameters(&params).is_err());
    }
}
