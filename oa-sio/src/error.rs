//! Error types for SIO recordings.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or converting SIO files.
#[derive(Debug, Error)]
pub enum SioError {
    /// Neither byte order yields the byte-swap constant.
    #[error("problem with byte swap constant: {0}")]
    ByteSwap(u32),

    /// The header describes an impossible layout.
    #[error("malformed header in {}: {message}", path.display())]
    Header {
        /// File being read
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// A requested channel does not exist.
    #[error("channel {channel} out of range 0 to {}", .available.saturating_sub(1))]
    ChannelRange {
        /// Requested channel
        channel: usize,
        /// Channels in the file
        available: usize,
    },

    /// Sample numbers start at 1.
    #[error("start sample must be at least 1, got {0}")]
    StartSample(usize),

    /// The file ends before the requested records.
    #[error("not enough samples in file: expected {expected} records, read {read}")]
    ShortRead {
        /// Records requested
        expected: usize,
        /// Complete records read
        read: usize,
    },

    /// Fewer samples remain after trimming to the start sample than were asked for.
    #[error(
        "requested {requested} samples, returned {returned}; check that start sample {start} \
         is a multiple of the record length {samples_per_record}"
    )]
    Misaligned {
        /// Samples asked for
        requested: usize,
        /// Samples available after trimming
        returned: usize,
        /// 1-based start sample
        start: usize,
        /// Samples per record
        samples_per_record: usize,
    },

    /// Converted files disagree on the number of channels.
    #[error("{} has {got} channels, expected {expected}", path.display())]
    ChannelCount {
        /// Offending file
        path: PathBuf,
        /// Channels in the first file
        expected: usize,
        /// Channels in this file
        got: usize,
    },

    /// A merge was asked for with no input files.
    #[error("no files to merge")]
    NoFiles,

    /// Sampling rates must be positive.
    #[error("sampling frequency must be positive, got {0}")]
    SampleRate(f64),

    /// A time stamp is not in `yj HH:MM` form.
    #[error("cannot read `{value}` as a 'yj HH:MM' time: {message}")]
    TimeFormat {
        /// Text supplied
        value: String,
        /// Parser message
        message: String,
    },

    /// Shared-type error
    #[error(transparent)]
    Common(#[from] oa_common::CommonError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for SIO operations.
pub type Result<T> = std::result::Result<T, SioError>;

impl SioError {
    /// Returns `true` when the file itself is damaged or not an SIO file.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            SioError::ByteSwap(_)
                | SioError::Header { .. }
                | SioError::ShortRead { .. }
                | SioError::ChannelCount { .. }
        )
    }

    /// Returns `true` when the read request does not fit the file.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            SioError::ChannelRange { .. }
                | SioError::StartSample(_)
                | SioError::Misaligned { .. }
                | SioError::NoFiles
                | SioError::SampleRate(_)
                | SioError::TimeFormat { .. }
        )
    }
}
