//! Two-to-three-pass alignment and forecasting.
//!
//! Simulated time counts days since an abstract epidemic seed; observed data
//! counts days since the first reported case. The aligner reconciles the two:
//!
//! 1. **Seed pass** — integrate from the canonical seed state over a long
//!    window.
//! 2. **Anchor search** — find the first sample whose cumulative
//!    isolated-case count strictly exceeds the minimum observed confirmed
//!    count. Failure here is a data/parameter mismatch (exit 4), not a
//!    configuration error.
//! 3. **Re-seed** — the full state at the anchor sample becomes the initial
//!    condition for calendar day 0 ("the day the simulation first matched the
//!    earliest thing we actually observed").
//! 4. **Forecast pass** — integrate from the re-seeded state over the
//!    observed day-offset range plus a forecast horizon.
//! 5. **Intervention fork** (optional) — slice the forecast at the sample at
//!    or before a pivot day, swap in a model differing in exactly one rate,
//!    and integrate a second branch from there.
//!
//! The passes are strictly sequential and no trajectory is ever mutated after
//! production: the fork reads a state out of the forecast, it does not touch
//! it.

use crate::domain::{
    comp, seed_state, AnchorPoint, CountrySeries, InterventionSpec, Trajectory,
};
use crate::error::AppError;
use crate::fit::anchor::first_crossing;
use crate::model::Seqijr;
use crate::sim::predict;

/// Knobs for one alignment run.
#[derive(Debug, Clone, Copy)]
pub struct AlignOptions {
    /// Length of the seed pass in simulated days.
    pub seed_window_days: f64,
    /// Step size shared by all passes.
    pub step: f64,
    /// Days to forecast past the last observed day.
    pub horizon_days: f64,
    pub intervention: Option<InterventionSpec>,
}

/// The post-pivot scenario branch.
#[derive(Debug, Clone)]
pub struct InterventionBranch {
    pub spec: InterventionSpec,
    /// Day offset of the forecast sample the branch was forked from.
    pub pivot_day: f64,
    /// Index of that sample in the forecast trajectory.
    pub pivot_index: usize,
    pub trajectory: Trajectory,
}

/// Everything one alignment run produces.
#[derive(Debug, Clone)]
pub struct AlignedForecast {
    pub anchor: AnchorPoint,
    /// The unconstrained seed pass (kept for diagnostics).
    pub seed: Trajectory,
    /// The calendar-anchored forecast; its time axis is observed day offsets.
    pub forecast: Trajectory,
    pub intervention: Option<InterventionBranch>,
}

/// Run the full alignment: seed pass, anchor search, re-seeded forecast, and
/// the optional intervention fork.
pub fn align_and_forecast(
    model: &Seqijr,
    series: &CountrySeries,
    opts: &AlignOptions,
) -> Result<AlignedForecast, AppError> {
    let seed = predict(
        model,
        seed_state(model.scale()),
        0.0,
        opts.seed_window_days,
        opts.step,
    )?;

    let anchor = locate_anchor(&seed, series.min_confirmed())?;

    let offsets = series.day_offsets();
    let t_start = offsets[0] as f64;
    let t_end = *offsets.last().expect("series is never empty") as f64 + opts.horizon_days;

    let forecast = predict(model, seed.state_at(anchor.index), t_start, t_end, opts.step)?;

    let intervention = match opts.intervention {
        Some(spec) => Some(fork_intervention(
            model,
            &forecast,
            spec,
            series.last_offset() as f64,
        )?),
        None => None,
    };

    Ok(AlignedForecast {
        anchor,
        seed,
        forecast,
        intervention,
    })
}

/// Scan the seed trajectory for the anchor crossing.
fn locate_anchor(seed: &Trajectory, observed_min: f64) -> Result<AnchorPoint, AppError> {
    let cumulative_isolated = seed.series(comp::AJ);
    let index = first_crossing(&cumulative_isolated, observed_min).ok_or_else(|| {
        AppError::anchor(format!(
            "Seed trajectory never exceeds the minimum observed count ({observed_min:.1}) \
             within {:.0} days; the seed window may be too short or the parameters too mild.",
            seed.end()
        ))
    })?;

    Ok(AnchorPoint {
        index,
        sim_day: seed.time_at(index),
        cumulative_isolated: cumulative_isolated[index],
        observed_min,
    })
}

/// Fork the forecast at the pivot with a modified isolated-recovery rate.
fn fork_intervention(
    model: &Seqijr,
    forecast: &Trajectory,
    spec: InterventionSpec,
    default_pivot: f64,
) -> Result<InterventionBranch, AppError> {
    let pivot = spec.pivot_day.unwrap_or(default_pivot);

    let pivot_index = forecast.index_at_or_before(pivot).ok_or_else(|| {
        AppError::config(format!(
            "Intervention pivot day {pivot:.1} lies outside the forecast window \
             [{:.1}, {:.1}].",
            forecast.start(),
            forecast.end()
        ))
    })?;
    let pivot_day = forecast.time_at(pivot_index);

    if !(spec.extend_days.is_finite() && spec.extend_days > 0.0) {
        return Err(AppError::config(format!(
            "Intervention extension must be positive, got {}.",
            spec.extend_days
        )));
    }

    let forked = model.with_isolated_recovery(spec.isolated_recovery)?;
    let trajectory = predict(
        &forked,
        forecast.state_at(pivot_index),
        pivot_day,
        pivot_day + spec.extend_days,
        forecast.step(),
    )?;

    Ok(InterventionBranch {
        spec,
        pivot_day,
        pivot_index,
        trajectory,
    })
}
