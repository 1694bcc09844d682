//! Common types and utilities for ocean acoustic modeling
//!
//! This crate provides shared functionality between the Acoustics Toolbox
//! interface and the signal-processing crates, including:
//!
//! - Sound speed profiles (measured, Munk, empirical sea-water equations)
//! - Source and receiver arrays (range vectors, array tilt, range offsets)
//! - JSON run configuration loading/saving
//! - `.npy` export and JSON result formatting

mod array;
mod config;
mod error;
mod npy;
mod output;
mod profile;
mod types;

pub use array::*;
pub use config::*;
pub use error::*;
pub use npy::*;
pub use output::*;
pub use profile::*;
pub use types::*;

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
