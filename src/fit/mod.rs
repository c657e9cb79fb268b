//! Alignment of simulated time with observed calendar time.
//!
//! Responsibilities:
//!
//! - run the unconstrained seed pass and locate the anchor crossing
//! - re-seed a calendar-anchored forecast pass from the anchor sample
//! - optionally fork an intervention branch from a pivot day

pub mod align;
pub mod anchor;

pub use align::*;
pub use anchor::*;
