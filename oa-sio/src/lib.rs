//! SIO multichannel array recordings
//!
//! Reads the header and sample records of `.sio` files written by vertical
//! and horizontal line array acquisition systems, and converts batches of
//! recordings to `.npy` with a JSON header sidecar. Converted files can be
//! merged back into one stream and cut to an analysis window.

pub mod convert;
pub mod error;
pub mod merge;
pub mod sio;

pub use convert::{Conversion, ConvertOptions, NPY_DIR, convert_file, convert_files, remove_channels};
pub use error::{Result, SioError};
pub use merge::{DAY_TIME_FORMAT, DataStream, MergeWindow, merge_npy_files, parse_day_time};
pub use sio::{
    BYTE_SWAP, Endian, HEADER_BYTES, ReadRequest, SampleFormat, SioHeader, read_header, read_sio,
};
