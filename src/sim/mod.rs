//! Trajectory production: fixed-step integration of a model over a window.

pub mod predictor;

pub use predictor::*;
