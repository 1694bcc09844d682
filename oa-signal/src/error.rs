//! Error types for signal processing

use thiserror::Error;

/// Errors raised by field computation, beamforming and processing
#[derive(Error, Debug)]
pub enum SignalError {
    /// Matrix is singular or nearly singular
    #[error("matrix is singular or nearly singular")]
    SingularMatrix,

    /// Array dimensions are inconsistent
    #[error("dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Operation that found the mismatch
        context: &'static str,
        /// Expected size
        expected: usize,
        /// Actual size
        got: usize,
    },

    /// An argument is outside its valid domain
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No FFT bin falls inside the search band
    #[error("no frequency bin in [{lower}, {upper}) Hz")]
    EmptyBand {
        /// Lower band edge [Hz]
        lower: f64,
        /// Upper band edge [Hz]
        upper: f64,
    },

    /// The replica model failed
    #[error("replica model failed: {0}")]
    Model(String),

    /// Shared-type error
    #[error(transparent)]
    Common(#[from] oa_common::CommonError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for signal processing
pub type Result<T> = std::result::Result<T, SignalError>;

impl SignalError {
    /// Returns `true` if the error comes from inconsistent array shapes
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, SignalError::DimensionMismatch { .. })
    }

    /// Returns `true` if the replica model reported the failure
    pub fn is_model_error(&self) -> bool {
        matches!(self, SignalError::Model(_))
    }
}
