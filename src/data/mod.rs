//! Observed-data collaborators: remote case series, population figures, and
//! synthetic offline series.
//!
//! Nothing in here knows about the model; these modules only produce
//! [`crate::domain::CountrySeries`] values for the pipeline to consume.

pub mod csse;
pub mod population;
pub mod sample;

pub use csse::{ConfirmedTable, CsseClient};
pub use population::{load_population_table, resolve_population};
pub use sample::{synthetic_series, SampleSpec};
