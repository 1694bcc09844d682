//! Error types shared by the ocean acoustics crates.

use thiserror::Error;

/// Errors raised while building profiles, arrays and configurations.
#[derive(Debug, Error)]
pub enum CommonError {
    /// A profile property has neither one value nor one value per depth.
    #[error("mismatch in number of elements in `{property}` ({got}) and `z` ({expected})")]
    LengthMismatch {
        /// Name of the offending property
        property: &'static str,
        /// Number of depths
        expected: usize,
        /// Number of values supplied
        got: usize,
    },

    /// A profile has no depth samples.
    #[error("sound speed profile has no depth samples")]
    EmptyProfile,

    /// Profile depths go backwards.
    #[error("profile depths must be non-decreasing (z[{index}] = {value})")]
    NonMonotonicDepth {
        /// Index of the first depth smaller than its predecessor
        index: usize,
        /// The offending depth
        value: f64,
    },

    /// An array was given no elements.
    #[error("{0} array has no elements")]
    EmptyArray(&'static str),

    /// Range offsets do not match the receiver geometry.
    #[error("range offsets have shape {got:?}, expected ({depths}) or ({depths}, {ranges})")]
    OffsetShape {
        /// Shape that was supplied
        got: Vec<usize>,
        /// Number of receiver depths
        depths: usize,
        /// Number of receiver ranges
        ranges: usize,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A row of a delimited profile file could not be read.
    #[error("{path}:{line}: {message}")]
    ProfileRow {
        /// File being read
        path: String,
        /// One-based line number
        line: usize,
        /// What was wrong with the row
        message: String,
    },

    /// A `.npy` file could not be decoded.
    #[error("npy: {0}")]
    Npy(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for common operations.
pub type Result<T> = std::result::Result<T, CommonError>;

impl CommonError {
    /// Returns `true` for errors describing inconsistent profile or array shapes.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            CommonError::LengthMismatch { .. }
                | CommonError::EmptyProfile
                | CommonError::NonMonotonicDepth { .. }
                | CommonError::EmptyArray(_)
                | CommonError::OffsetShape { .. }
        )
    }

    /// Returns `true` for errors raised while reading or writing files.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            CommonError::Io(_)
                | CommonError::Json(_)
                | CommonError::Npy(_)
                | CommonError::ProfileRow { .. }
        )
    }
}
