//! Signal processing for ocean acoustics
//!
//! - Normal-mode pressure fields from mode shapes and wavenumbers
//! - Covariance estimation and beamformers (Bartlett, MVDR)
//! - Multi-frequency matched-field processing over a replica model
//! - Complex pressure extraction from multichannel recordings
//! - Noise generation and time vectors

pub mod beamforming;
pub mod error;
pub mod field;
pub mod linalg;
pub mod mfp;
pub mod noise;
pub mod processing;
pub mod timeseries;

pub use beamforming::{Beamformer, covariance, enforce_hermitian};
pub use error::{Result, SignalError};
pub use field::pressure_field;
pub use mfp::{
    MatchedFieldProcessor, MultiFrequencyMethod, ParameterFormatter, Parameters, ReplicaModel,
    default_parameter_formatter,
};
pub use noise::{complex_white_noise, snrdb_to_sigma, white_noise};
pub use processing::{FftParameters, PeakFinding, ProcessOptions, Processor, Window};
