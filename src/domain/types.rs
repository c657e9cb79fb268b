//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during integration and alignment
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use chrono::NaiveDate;
use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of components in the SEQIJR state vector.
pub const STATE_DIM: usize = 9;

/// One sample of the epidemic state.
///
/// Component order is fixed (see [`comp`]): the six live compartments
/// S, E, Q, I, J, R followed by the three cumulative counters aJ (isolated
/// cases), aIJ (all infections), aD (deaths).
pub type StateVector = SVector<f64, STATE_DIM>;

/// Index constants into a [`StateVector`].
pub mod comp {
    /// Susceptible.
    pub const S: usize = 0;
    /// Exposed (infected, pre-symptomatic, not yet quarantined).
    pub const E: usize = 1;
    /// Quarantined (exposed and traced into quarantine).
    pub const Q: usize = 2;
    /// Infectious, undetected.
    pub const I: usize = 3;
    /// Infectious, isolated.
    pub const J: usize = 4;
    /// Recovered.
    pub const R: usize = 5;
    /// Cumulative isolated cases (compared against observed confirmed counts).
    pub const AJ: usize = 6;
    /// Cumulative infections.
    pub const AIJ: usize = 7;
    /// Cumulative disease-induced deaths.
    pub const AD: usize = 8;
}

/// Canonical epidemic-seed condition: a fully susceptible population of
/// scale `n` with a single undetected infectious case.
pub fn seed_state(n: f64) -> StateVector {
    let mut y = StateVector::zeros();
    y[comp::S] = n;
    y[comp::I] = 1.0;
    y[comp::AIJ] = 1.0;
    y
}

/// SEQIJR rate parameters plus the population scale `n`.
///
/// All rates are per day. `e_e`/`e_q`/`e_j` are dimensionless infectiousness
/// modifiers for exposed/quarantined/isolated carriers relative to undetected
/// infectious ones.
///
/// The record is a plain value type: an intervention fork builds a new value
/// differing in exactly one field rather than mutating a shared instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Population scale N (a configured fraction of the real population).
    pub n: f64,
    /// Inflow rate (births/immigration into S).
    pub pi: f64,
    /// Natural mortality rate.
    pub mu: f64,
    /// Transmission coefficient.
    pub b: f64,
    /// Infectiousness modifier for exposed carriers.
    pub e_e: f64,
    /// Infectiousness modifier for quarantined carriers.
    pub e_q: f64,
    /// Infectiousness modifier for isolated carriers.
    pub e_j: f64,
    /// Recovery rate of isolated cases (J -> R).
    pub g_1: f64,
    /// Recovery rate of undetected infectious cases (I -> R).
    pub g_2: f64,
    /// Symptom-onset rate of exposed cases (E -> I).
    pub s_1: f64,
    /// Symptom-onset rate of quarantined cases (Q -> J).
    pub s_2: f64,
    /// Quarantine-entry rate of exposed cases (E -> Q).
    pub k_1: f64,
    /// Isolation-entry rate of undetected infectious cases (I -> J).
    pub k_2: f64,
    /// Disease-induced mortality rate of undetected infectious cases.
    pub d_1: f64,
    /// Disease-induced mortality rate of isolated cases.
    pub d_2: f64,
}

impl ModelParams {
    /// Check the configuration invariants: `n` strictly positive, every rate
    /// finite and non-negative.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.n.is_finite() && self.n > 0.0) {
            return Err(AppError::config(format!(
                "Population scale must be positive and finite, got {}.",
                self.n
            )));
        }
        for (name, value) in self.rates() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AppError::config(format!(
                    "Rate parameter '{name}' must be non-negative and finite, got {value}."
                )));
            }
        }
        Ok(())
    }

    /// Copy of the params with a different isolated-case recovery rate.
    ///
    /// This is the single field a policy-intervention fork changes.
    pub fn with_isolated_recovery(self, g_1: f64) -> Self {
        Self { g_1, ..self }
    }

    fn rates(&self) -> [(&'static str, f64); 14] {
        [
            ("pi", self.pi),
            ("mu", self.mu),
            ("b", self.b),
            ("e_e", self.e_e),
            ("e_q", self.e_q),
            ("e_j", self.e_j),
            ("g_1", self.g_1),
            ("g_2", self.g_2),
            ("s_1", self.s_1),
            ("s_2", self.s_2),
            ("k_1", self.k_1),
            ("k_2", self.k_2),
            ("d_1", self.d_1),
            ("d_2", self.d_2),
        ]
    }
}

/// A uniformly sampled integration result over `[start, start + steps*step]`.
///
/// Trajectories are immutable once produced: the aligner and the plotting
/// code only ever read samples out of them, because an intervention fork
/// depends on slicing an unmodified state from a previously computed run.
#[derive(Debug, Clone)]
pub struct Trajectory {
    start: f64,
    step: f64,
    times: Vec<f64>,
    states: Vec<StateVector>,
}

impl Trajectory {
    /// Build a trajectory from uniformly spaced samples.
    ///
    /// Times are recomputed as `start + i*step` so two trajectories produced
    /// from the same arguments are bit-identical.
    pub fn from_samples(start: f64, step: f64, states: Vec<StateVector>) -> Self {
        let times = (0..states.len()).map(|i| start + i as f64 * step).collect();
        Self {
            start,
            step,
            times,
            states,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Time of the last sample.
    pub fn end(&self) -> f64 {
        self.times.last().copied().unwrap_or(self.start)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn time_at(&self, index: usize) -> f64 {
        self.times[index]
    }

    /// Copy of the full state at a sample index.
    pub fn state_at(&self, index: usize) -> StateVector {
        self.states[index]
    }

    /// One component across all samples, index-aligned with [`Self::times`].
    pub fn series(&self, component: usize) -> Vec<f64> {
        self.states.iter().map(|y| y[component]).collect()
    }

    /// Sample index at or immediately before time `t` (truncating division).
    ///
    /// Returns `None` when `t` lies before the first or after the last sample.
    pub fn index_at_or_before(&self, t: f64) -> Option<usize> {
        if t < self.start {
            return None;
        }
        let index = ((t - self.start) / self.step) as usize;
        (index < self.len()).then_some(index)
    }

    /// Sample index closest to time `t`, or `None` when `t` is outside the
    /// sampled window.
    pub fn nearest_index(&self, t: f64) -> Option<usize> {
        let index = ((t - self.start) / self.step).round();
        if index < 0.0 {
            return None;
        }
        let index = index as usize;
        (index < self.len()).then_some(index)
    }
}

/// Observed cumulative confirmed cases for one country.
///
/// Immutable once constructed; dates are strictly increasing and
/// index-aligned with `confirmed`.
#[derive(Debug, Clone)]
pub struct CountrySeries {
    pub name: String,
    pub population: u64,
    pub dates: Vec<NaiveDate>,
    pub confirmed: Vec<f64>,
}

impl CountrySeries {
    pub fn new(
        name: impl Into<String>,
        population: u64,
        dates: Vec<NaiveDate>,
        confirmed: Vec<f64>,
    ) -> Result<Self, AppError> {
        let name = name.into();
        if dates.is_empty() {
            return Err(AppError::lookup(format!(
                "Observed series for '{name}' is empty."
            )));
        }
        if dates.len() != confirmed.len() {
            return Err(AppError::lookup(format!(
                "Observed series for '{name}' has {} dates but {} counts.",
                dates.len(),
                confirmed.len()
            )));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AppError::lookup(format!(
                "Observed series for '{name}' has non-increasing dates."
            )));
        }
        if confirmed.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AppError::lookup(format!(
                "Observed series for '{name}' contains invalid counts."
            )));
        }
        Ok(Self {
            name,
            population,
            dates,
            confirmed,
        })
    }

    /// Integer day offsets of each date relative to the first reported date.
    ///
    /// Pure calendar arithmetic, no wall-clock dependency. The first offset
    /// is always 0 and offsets are strictly increasing.
    pub fn day_offsets(&self) -> Vec<i64> {
        let first = self.dates[0];
        self.dates.iter().map(|d| (*d - first).num_days()).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        *self.dates.last().expect("series is never empty")
    }

    /// Day offset of the last observation.
    pub fn last_offset(&self) -> i64 {
        (self.last_date() - self.first_date()).num_days()
    }

    /// Smallest observed confirmed count (the anchor-search threshold).
    pub fn min_confirmed(&self) -> f64 {
        self.confirmed.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// A policy intervention applied from a pivot day onwards.
#[derive(Debug, Clone, Copy)]
pub struct InterventionSpec {
    /// Day offset at which the intervention takes effect; defaults to the
    /// last observed day.
    pub pivot_day: Option<f64>,
    /// New isolated-case recovery rate (g_1) after the pivot.
    pub isolated_recovery: f64,
    /// How many days past the pivot the intervention branch is integrated.
    pub extend_days: f64,
}

/// Where the seed trajectory first exceeded the observed minimum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnchorPoint {
    /// Sample index into the seed trajectory.
    pub index: usize,
    /// Simulated day (days since epidemic seed) of that sample.
    pub sim_day: f64,
    /// Cumulative isolated cases at that sample.
    pub cumulative_isolated: f64,
    /// The observed minimum confirmed count that was crossed.
    pub observed_min: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub countries: Vec<String>,
    /// Model parameter JSON file; the built-in baseline scenario when absent.
    pub config_path: Option<PathBuf>,
    /// `country,population` CSV file for population lookups.
    pub population_file: Option<PathBuf>,
    /// Population override for single-country runs without a file.
    pub population_override: Option<u64>,

    /// Use a deterministic synthetic series instead of fetching.
    pub offline: bool,
    pub sample_seed: u64,
    pub sample_days: usize,
    pub sample_population: u64,

    /// Integration step size (days).
    pub step: f64,
    /// Length of the unconstrained seed pass (days since epidemic seed).
    pub seed_window_days: f64,
    /// Days to forecast past the last observation.
    pub horizon_days: f64,
    pub intervention: Option<InterventionSpec>,

    /// Show top-N under- and over-predicted days.
    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_forecast: Option<PathBuf>,
}

/// A saved forecast file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastFile {
    pub tool: String,
    pub country: String,
    pub population: u64,
    pub first_date: NaiveDate,
    pub step: f64,
    pub basic_reproduction_number: f64,
    pub controlled_reproduction_number: f64,
    pub anchor: AnchorPoint,
    pub params: ModelParams,
    pub observed: ObservedPoints,
    pub forecast: SampledSeries,
    pub intervention: Option<SampledSeries>,
}

/// Observed day-offset/count pairs as stored in a forecast file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedPoints {
    pub day_offsets: Vec<i64>,
    pub confirmed: Vec<f64>,
}

/// The exported slice of a trajectory: time axis plus the series a reader
/// typically plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampledSeries {
    pub days: Vec<f64>,
    pub cumulative_isolated: Vec<f64>,
    pub active_isolated: Vec<f64>,
    pub cumulative_deaths: Vec<f64>,
}

impl SampledSeries {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        Self {
            days: trajectory.times().to_vec(),
            cumulative_isolated: trajectory.series(comp::AJ),
            active_isolated: trajectory.series(comp::J),
            cumulative_deaths: trajectory.series(comp::AD),
        }
    }
}
