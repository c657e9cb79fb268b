//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the SEQIJR parameter record (`ModelParams`)
//! - the 9-component state vector and its index constants
//! - simulated trajectories (`Trajectory`)
//! - observed country case series (`CountrySeries`)
//! - run configuration and export schemas (`ForecastConfig`, `ForecastFile`)

pub mod types;

pub use types::*;
