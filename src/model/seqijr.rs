//! SEQIJR compartmental model: derivative evaluation and reproduction numbers.
//!
//! The model follows the quarantine/isolation structure of Gumel et al.
//! (2004): susceptibles (S) are infected by contact with undetected
//! infectious cases (I) and, at reduced rates, with exposed (E), quarantined
//! (Q) and isolated (J) carriers. Exposed cases are either traced into
//! quarantine (k_1) or progress to undetected infectious (s_1); quarantined
//! cases progress to isolation (s_2); undetected cases are found and isolated
//! (k_2). I and J recover (g_2/g_1) or die (d_1/d_2). Three extra components
//! accumulate isolations, infections, and deaths so a trajectory can be
//! compared against observed cumulative case counts.
//!
//! Flow structure (natural mortality `mu` applies to every live compartment):
//!
//! ```text
//!         lambda       s_1          k_2
//!     S --------> E --------> I --------> J
//!                 |                       ^
//!                 | k_1        s_2        |
//!                 +--------> Q -----------+
//!
//!     recovery: I --g_2--> R,  J --g_1--> R
//!     death:    I --d_1--> D,  J --d_2--> D
//! ```

use crate::domain::{comp, ModelParams, StateVector};
use crate::error::AppError;

/// The compartmental model: a validated, immutable parameter set.
///
/// An intervention fork never mutates an existing model; it constructs a new
/// one via [`Seqijr::with_isolated_recovery`] so the pre- and post-pivot
/// branches cannot share hidden state.
#[derive(Debug, Clone)]
pub struct Seqijr {
    params: ModelParams,
}

impl Seqijr {
    /// Build a model from a fully specified parameter record.
    ///
    /// Fails (exit 2) on a non-positive population scale or any negative
    /// rate, before any integration starts.
    pub fn new(params: ModelParams) -> Result<Self, AppError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Population scale N.
    pub fn scale(&self) -> f64 {
        self.params.n
    }

    /// New model differing only in the isolated-case recovery rate g_1.
    pub fn with_isolated_recovery(&self, g_1: f64) -> Result<Self, AppError> {
        Self::new(self.params.with_isolated_recovery(g_1))
    }

    /// Instantaneous rates of change at time `_t` for the 9-component state.
    ///
    /// The system is autonomous; the time argument exists for the integrator
    /// interface. Pure and allocation-free: the returned vector lives on the
    /// stack.
    pub fn derivative(&self, _t: f64, y: &StateVector) -> StateVector {
        let p = &self.params;

        let s = y[comp::S];
        let e = y[comp::E];
        let q = y[comp::Q];
        let i = y[comp::I];
        let j = y[comp::J];
        let r = y[comp::R];

        // Force of infection: effective infectious contacts per susceptible.
        let lambda = p.b * s * (i + p.e_e * e + p.e_q * q + p.e_j * j) / p.n;

        let new_isolations = p.s_2 * q + p.k_2 * i;
        let new_deaths = p.d_1 * i + p.d_2 * j;

        let mut dy = StateVector::zeros();
        dy[comp::S] = p.pi - lambda - p.mu * s;
        dy[comp::E] = lambda - (p.k_1 + p.s_1 + p.mu) * e;
        dy[comp::Q] = p.k_1 * e - (p.s_2 + p.mu) * q;
        dy[comp::I] = p.s_1 * e - (p.k_2 + p.g_2 + p.d_1 + p.mu) * i;
        dy[comp::J] = new_isolations - (p.g_1 + p.d_2 + p.mu) * j;
        dy[comp::R] = p.g_2 * i + p.g_1 * j - p.mu * r;
        dy[comp::AJ] = new_isolations;
        dy[comp::AIJ] = lambda;
        dy[comp::AD] = new_deaths;
        dy
    }

    /// Basic reproduction number R_0: expected secondary infections from one
    /// case in a fully susceptible population with the quarantine and
    /// isolation controls switched off (k_1 = k_2 = 0).
    pub fn basic_reproduction_number(&self) -> f64 {
        let p = &self.params;
        let out_e = p.s_1 + p.mu;
        let out_i = p.g_2 + p.d_1 + p.mu;
        p.b * (p.e_e / out_e + p.s_1 / (out_e * out_i))
    }

    /// Controlled reproduction number R_c: same threshold with quarantine and
    /// isolation active.
    ///
    /// Next-generation expression: each term is the transmission coefficient
    /// times the expected person-days an index case contributes in E, Q, I,
    /// and J respectively, weighted by that compartment's infectiousness.
    pub fn controlled_reproduction_number(&self) -> f64 {
        let p = &self.params;
        let out_e = p.k_1 + p.s_1 + p.mu;
        let out_q = p.s_2 + p.mu;
        let out_i = p.k_2 + p.g_2 + p.d_1 + p.mu;
        let out_j = p.g_1 + p.d_2 + p.mu;

        let time_in_e = p.e_e / out_e;
        let time_in_q = p.e_q * p.k_1 / (out_e * out_q);
        let time_in_i = p.s_1 / (out_e * out_i);
        // Two routes into J: E -> I -> J and E -> Q -> J.
        let time_in_j = p.e_j * (p.s_1 * p.k_2 * out_q + p.k_1 * p.s_2 * out_i)
            / (out_e * out_q * out_i * out_j);

        p.b * (time_in_e + time_in_q + time_in_i + time_in_j)
    }
}
