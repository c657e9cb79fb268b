//! Numerical building blocks.

pub mod rk4;

pub use rk4::*;
