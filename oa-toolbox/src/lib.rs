//! Interface to the Acoustics Toolbox propagation models
//!
//! This crate writes the model input files, launches the Fortran executables
//! and reads their outputs:
//!
//! - `.env` environment files (common blocks plus KRAKEN or BELLHOP blocks)
//! - KRAKEN `.mod` mode files and normal-mode pressure fields, including the
//!   two-environment adiabatic approximation
//! - BELLHOP `.ray` ray fans
//! - Symbolic links that put the toolbox executables on the search path
//!
//! The models themselves are not part of this crate; they must be built
//! separately and either be on `PATH` or be given as a model directory.

pub mod bellhop;
pub mod environment;
pub mod error;
pub mod halfspace;
pub mod install;
pub mod kraken;
pub mod modes;
pub mod rays;
pub mod runner;

pub use bellhop::{BeamFan, BellhopEnvironment, BellhopModel, BellhopOptions, NumericalIntegrator, run_bellhop};
pub use environment::{Environment, Layer, clean_up_files};
pub use error::{Result, ToolboxError};
pub use halfspace::{Bottom, Top};
pub use install::{find_executable, link_executables, unlink_executables};
pub use kraken::{
    KrakenEnvironment, KrakenModel, KrakenModelKind, kraken_replica, run_kraken,
    run_kraken_adiabatic,
};
pub use modes::{Modes, ModesHalfspace, read_modes};
pub use rays::{Ray, RayFile, read_rays};
pub use runner::run_model;
