//! KRAKEN normal-mode model
//!
//! A run writes `<title>.env`, launches `kraken.exe` (or `krakenc.exe`) in the
//! working directory, reads `<title>.mod` and evaluates the pressure field
//! at the receivers.

use crate::environment::{Environment, clean_up_files, write_vector};
use crate::error::{Result, ToolboxError};
use crate::modes::{Modes, adiabatic_modes, read_modes};
use crate::runner::run_model;
use ndarray::Array2;
use num_complex::Complex64;
use oa_common::{AdiabaticParameters, KrakenParameters, ParameterFile, Receiver, Source};
use oa_signal::{Parameters, SignalError, pressure_field};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Files produced by a KRAKEN run
pub const KRAKEN_EXTENSIONS: [&str; 3] = ["env", "mod", "prt"];

/// KRAKEN flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KrakenModelKind {
    /// Real-arithmetic KRAKEN
    #[default]
    Kraken,
    /// Complex-arithmetic KRAKENC, for elastic and leaky media
    KrakenC,
}

impl KrakenModelKind {
    /// Executable base name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kraken => "kraken",
            Self::KrakenC => "krakenc",
        }
    }
}

impl FromStr for KrakenModelKind {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kraken" => Ok(Self::Kraken),
            "krakenc" => Ok(Self::KrakenC),
            _ => Err(ToolboxError::InvalidOption {
                kind: "KRAKEN model",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for KrakenModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_uppercase())
    }
}

/// KRAKEN environment: common blocks plus phase speed limits and geometry
#[derive(Debug, Clone, PartialEq)]
pub struct KrakenEnvironment {
    /// Common environment
    pub environment: Environment,
    /// Source depths
    pub source: Source,
    /// Receiver geometry
    pub receiver: Receiver,
    /// Lower phase speed limit [m/s]
    pub clow: f64,
    /// Upper phase speed limit [m/s]; the deepest layer's maximum speed when unset
    pub chigh: Option<f64>,
}

impl KrakenEnvironment {
    /// Environment with `clow = 0` and automatic `chigh`
    pub fn new(environment: Environment, source: Source, receiver: Receiver) -> Self {
        Self {
            environment,
            source,
            receiver,
            clow: 0.0,
            chigh: None,
        }
    }

    /// Set the phase speed limits
    pub fn with_phase_speeds(mut self, clow: f64, chigh: Option<f64>) -> Self {
        self.clow = clow;
        self.chigh = chigh;
        self
    }

    /// Environment from run parameters
    pub fn from_parameters(params: &KrakenParameters) -> Result<Self> {
        let environment =
            Environment::from_parameters(&params.title, params.freq, &params.env, params.bot_z()?)?;
        Ok(Self::new(environment, params.env.source()?, params.env.receiver()?)
            .with_phase_speeds(params.clow, params.chigh))
    }

    /// Upper phase speed limit written to the file
    pub fn chigh(&self) -> f64 {
        self.chigh.unwrap_or_else(|| {
            self.environment
                .layers
                .last()
                .map_or(0.0, |layer| layer.ssp.c_p_max())
        })
    }

    /// Write blocks 7 to 9
    pub fn write_blocks<W: Write>(&self, w: &mut W) -> Result<()> {
        write!(w, "{:6.0} {:6.0} \t \t ! cLow cHigh (m/s) \r\n", self.clow, self.chigh())?;
        write!(w, "{:8.2} \t \t \t ! RMax (km) \r\n", self.receiver.r_max())?;
        write_vector(w, "SD", &self.source.z, self.source.equally_spaced())?;
        write_vector(w, "RD", &self.receiver.z, self.receiver.equally_spaced())?;
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

/// A KRAKEN run and its results
#[derive(Debug, Clone)]
pub struct KrakenModel {
    environment: KrakenEnvironment,
    modes: Option<Modes>,
    field: Option<Array2<Complex64>>,
}

impl KrakenModel {
    /// Model for an environment; nothing runs until [`KrakenModel::run`]
    pub fn new(environment: KrakenEnvironment) -> Self {
        Self {
            environment,
            modes: None,
            field: None,
        }
    }

    /// Run the model and read its modes
    ///
    /// With `compute_field` the pressure at the receivers is evaluated too.
    /// Model files are removed afterwards unless `keep_files` is set, also
    /// when reading them fails.
    pub fn run(
        &mut self,
        kind: KrakenModelKind,
        model_path: Option<&Path>,
        compute_field: bool,
        keep_files: bool,
    ) -> Result<&Modes> {
        let env = &self.environment.environment;
        let result = self.environment.write_envfil().and_then(|_| {
            run_model(kind.name(), model_path, env)?;
            read_modes(env.file_path("mod"), env.freq, None)
        });
        if !keep_files {
            clean_up_files(&env.tmpdir, &KRAKEN_EXTENSIONS, &env.title)?;
        }
        let modes = result?;
        log::info!("{kind}: {} modes at {:.2} Hz", modes.m, modes.freq);

        self.field = if compute_field {
            Some(modes.field(&self.environment.source, &self.environment.receiver)?)
        } else {
            None
        };
        let modes: &Modes = self.modes.insert(modes);
        Ok(modes)
    }

    /// Environment of the run
    pub fn environment(&self) -> &KrakenEnvironment {
        &self.environment
    }

    /// Modes, once the model has run
    pub fn modes(&self) -> Option<&Modes> {
        self.modes.as_ref()
    }

    /// Pressure field, when it was computed
    pub fn field(&self) -> Option<&Array2<Complex64>> {
        self.field.as_ref()
    }

    /// Take the pressure field out of the model
    pub fn take_field(&mut self) -> Option<Array2<Complex64>> {
        self.field.take()
    }
}

fn model_path(params: &KrakenParameters) -> Option<&Path> {
    params.model_path.as_deref().map(Path::new)
}

fn run_modes(params: &KrakenParameters) -> Result<KrakenModel> {
    let kind: KrakenModelKind = params.model.parse()?;
    let mut model = KrakenModel::new(KrakenEnvironment::from_parameters(params)?);
    model.run(kind, model_path(params), false, params.keep_files)?;
    Ok(model)
}

/// Range-independent KRAKEN field (receiver depth × range)
pub fn run_kraken(params: &KrakenParameters) -> Result<Array2<Complex64>> {
    let kind: KrakenModelKind = params.model.parse()?;
    let mut model = KrakenModel::new(KrakenEnvironment::from_parameters(params)?);
    model.run(kind, model_path(params), true, params.keep_files)?;
    model
        .take_field()
        .ok_or_else(|| ToolboxError::NoModes(model.environment.environment.file_path("mod")))
}

/// Two-environment adiabatic field (receiver depth × range)
///
/// Modes are computed separately at the source and receiver environments.
/// The field uses the source-side shapes at the source depth, the
/// receiver-side shapes at the receiver depths and the mean wavenumbers over
/// the modes present on both sides.
pub fn run_kraken_adiabatic(params: &AdiabaticParameters) -> Result<Array2<Complex64>> {
    let src = run_modes(&params.src)?;
    let rec = run_modes(&params.rec)?;
    let (Some(src_modes), Some(rec_modes)) = (src.modes(), rec.modes()) else {
        return Err(ToolboxError::NoModes(src.environment.environment.file_path("mod")));
    };
    let receiver = &rec.environment.receiver;
    let (phi_src, phi_rec, k) =
        adiabatic_modes(src_modes, &src.environment.source, rec_modes, receiver)?;
    log::info!("adiabatic field from {} modes", k.len());
    Ok(pressure_field(
        &phi_src,
        &phi_rec,
        &k,
        &receiver.r_meters().to_vec(),
        receiver.r_offsets.as_ref(),
    )?)
}

/// Replica model for matched-field processing
///
/// Parameters are a KRAKEN parameter map; the replicas are the field at
/// every receiver depth (rows) and range (columns).
pub fn kraken_replica(parameters: &Parameters) -> oa_signal::Result<Array2<Complex64>> {
    let params = KrakenParameters::from_map(parameters.clone())?;
    run_kraken(&params).map_err(|e| SignalError::Model(e.to_string()))
}
