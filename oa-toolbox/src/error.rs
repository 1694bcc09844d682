//! Error types for the Acoustics Toolbox interface.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing inputs, running models and reading outputs.
#[derive(Debug, Error)]
pub enum ToolboxError {
    /// A boundary option needs a property that was not given.
    #[error("{property} must be defined when {option} option is '{value}'")]
    UndefinedProperty {
        /// Missing property
        property: &'static str,
        /// Option that requires it
        option: &'static str,
        /// Value of the option
        value: char,
    },

    /// An option string or character is not recognised.
    #[error("invalid {kind}: `{value}`")]
    InvalidOption {
        /// Which option was being parsed
        kind: &'static str,
        /// Rejected value
        value: String,
    },

    /// The model executable could not be launched.
    #[error("unknown command: {}", .0.display())]
    UnknownCommand(PathBuf),

    /// The model executable exited with an error status.
    #[error("{model} exited with status {status}")]
    ModelFailed {
        /// Executable name
        model: String,
        /// Exit code, -1 when terminated by a signal
        status: i32,
    },

    /// The mode file reports that no modes were computed.
    #[error("no modes available to read in {}", .0.display())]
    NoModes(PathBuf),

    /// A model output file is malformed or truncated.
    #[error("malformed {file}: {message}")]
    Format {
        /// File kind (`.mod`, `.ray`)
        file: &'static str,
        /// What went wrong
        message: String,
    },

    /// A requested mode index does not exist.
    #[error("mode index {index} out of range ({available} modes)")]
    ModeIndex {
        /// Requested index
        index: usize,
        /// Number of modes in the file
        available: usize,
    },

    /// A link target already exists and is not ours.
    #[error("{} already exists and does not link to {}", path.display(), target.display())]
    LinkConflict {
        /// Existing entry
        path: PathBuf,
        /// Intended link target
        target: PathBuf,
    },

    /// Operation not available on this platform or for this input.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Shared-type error
    #[error(transparent)]
    Common(#[from] oa_common::CommonError),

    /// Signal processing error
    #[error(transparent)]
    Signal(#[from] oa_signal::SignalError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for toolbox operations.
pub type Result<T> = std::result::Result<T, ToolboxError>;

impl ToolboxError {
    /// Returns `true` if the environment or its options are invalid.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ToolboxError::UndefinedProperty { .. }
                | ToolboxError::InvalidOption { .. }
                | ToolboxError::Common(_)
        )
    }

    /// Returns `true` if the model executable failed or could not be found.
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            ToolboxError::UnknownCommand(_) | ToolboxError::ModelFailed { .. }
        )
    }

    /// Returns `true` if a model output file could not be interpreted.
    pub fn is_output_error(&self) -> bool {
        matches!(
            self,
            ToolboxError::NoModes(_) | ToolboxError::Format { .. } | ToolboxError::ModeIndex { .. }
        )
    }

    pub(crate) fn format(file: &'static str, message: impl Into<String>) -> Self {
        ToolboxError::Format {
            file,
            message: message.into(),
        }
    }
}
