//! The predictor: drive a [`Seqijr`] model across a time window.
//!
//! Responsibilities:
//!
//! - validate the window and step before any integration starts (exit 2)
//! - produce a deterministic sample count: `ceil((end - start) / step) + 1`,
//!   with tolerant rounding so a near-even window keeps its exact count
//! - fail distinctly (exit 5) when the state goes non-finite mid-run, since
//!   there is no step-size adaptation to fall back on
//!
//! The returned [`Trajectory`] is owned by the caller and never mutated by
//! this module again.

use crate::domain::{StateVector, Trajectory};
use crate::error::AppError;
use crate::math::rk4_step;
use crate::model::Seqijr;

/// Tolerance for deciding that a window divides evenly by the step.
///
/// `(end - start) / step` accumulates float noise for innocuous inputs like
/// `36.0 / 0.1`; windows within this tolerance of a whole number of steps are
/// rounded instead of ceiled so the sample count stays deterministic.
const EVEN_DIVISION_EPS: f64 = 1e-9;

/// Integrate `model` from `initial` over `[start, end]` at a fixed step.
///
/// Identical arguments always produce an identical trajectory: the stepper is
/// deterministic and sample times are recomputed as `start + i * step` rather
/// than accumulated. When the window is not a whole multiple of `step`, the
/// final sample lands past `end` by less than one step.
pub fn predict(
    model: &Seqijr,
    initial: StateVector,
    start: f64,
    end: f64,
    step: f64,
) -> Result<Trajectory, AppError> {
    if !(start.is_finite() && end.is_finite()) {
        return Err(AppError::config("Integration window must be finite."));
    }
    if end < start {
        return Err(AppError::config(format!(
            "Integration window ends before it starts: [{start}, {end}]."
        )));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(AppError::config(format!(
            "Integration step must be positive, got {step}."
        )));
    }
    if initial.iter().any(|v| !v.is_finite()) {
        return Err(AppError::numerical(
            "Initial state contains non-finite components.",
        ));
    }

    let n_steps = step_count(end - start, step);
    let f = |t: f64, y: &StateVector| model.derivative(t, y);

    let mut states = Vec::with_capacity(n_steps + 1);
    states.push(initial);

    let mut y = initial;
    for i in 0..n_steps {
        let t = start + i as f64 * step;
        y = rk4_step(&f, t, y, step);

        if y.iter().any(|v| !v.is_finite()) {
            return Err(AppError::numerical(format!(
                "Integration produced a non-finite state at t = {:.3} (step {}).",
                t + step,
                i + 1
            )));
        }
        states.push(y);
    }

    Ok(Trajectory::from_samples(start, step, states))
}

fn step_count(span: f64, step: f64) -> usize {
    let raw = span / step;
    let counted = if (raw - raw.round()).abs() < EVEN_DIVISION_EPS * raw.abs().max(1.0) {
        raw.round()
    } else {
        raw.ceil()
    };
    counted as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{comp, seed_state, ModelParams};

    fn baseline(n: f64) -> ModelParams {
        ModelParams {
            n,
            pi: 0.0,
            mu: 1.0 / (80.0 * 365.0),
            b: 0.8,
            e_e: 0.25,
            e_q: 0.0,
            e_j: 0.1,
            g_1: 1.0 / 19.0,
            g_2: 1.0 / 7.0,
            s_1: 1.0 / 14.0,
            s_2: 1.0 / 7.0,
            k_1: 1.0 / 3.0,
            k_2: 1.0 / 14.0,
            d_1: 0.05 / 7.0,
            d_2: 0.03 / 7.0,
        }
    }

    #[test]
    fn window_validation() {
        let model = Seqijr::new(baseline(1000.0)).unwrap();
        let y0 = seed_state(1000.0);

        assert_eq!(
            predict(&model, y0, 10.0, 5.0, 0.5).unwrap_err().exit_code(),
            2
        );
        assert_eq!(
            predict(&model, y0, 0.0, 5.0, 0.0).unwrap_err().exit_code(),
            2
        );
        assert_eq!(
            predict(&model, y0, 0.0, 5.0, -0.5).unwrap_err().exit_code(),
            2
        );

        let mut bad = y0;
        bad[comp::S] = f64::NAN;
        assert_eq!(
            predict(&model, bad, 0.0, 5.0, 0.5).unwrap_err().exit_code(),
            5
        );
    }

    #[test]
    fn sample_counts() {
        let model = Seqijr::new(baseline(1000.0)).unwrap();
        let y0 = seed_state(1000.0);

        // Even division: 10 / 0.5 -> 21 samples.
        let t = predict(&model, y0, 0.0, 10.0, 0.5).unwrap();
        assert_eq!(t.len(), 21);

        // Near-even division must not pick up a spurious extra step.
        let t = predict(&model, y0, 0.0, 36.0, 0.1).unwrap();
        assert_eq!(t.len(), 361);

        // Uneven division: ceil(10 / 3) = 4 steps, final sample past the end.
        let t = predict(&model, y0, 0.0, 10.0, 3.0).unwrap();
        assert_eq!(t.len(), 5);
        assert_eq!(t.end(), 12.0);
    }

    #[test]
    fn zero_length_window_returns_initial_state() {
        let model = Seqijr::new(baseline(1000.0)).unwrap();
        let y0 = seed_state(1000.0);

        let t = predict(&model, y0, 7.0, 7.0, 0.5).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.time_at(0), 7.0);
        assert_eq!(t.state_at(0), y0);
    }

    #[test]
    fn prediction_is_deterministic() {
        let model = Seqijr::new(baseline(1000.0)).unwrap();
        let y0 = seed_state(1000.0);

        let a = predict(&model, y0, 0.0, 60.0, 0.5).unwrap();
        let b = predict(&model, y0, 0.0, 60.0, 0.5).unwrap();

        assert_eq!(a.times(), b.times());
        for i in 0..a.len() {
            assert_eq!(a.state_at(i), b.state_at(i), "sample {i} differs");
        }
    }

    #[test]
    fn cumulative_series_are_non_decreasing() {
        let model = Seqijr::new(baseline(1000.0)).unwrap();
        let t = predict(&model, seed_state(1000.0), 0.0, 60.0, 0.5).unwrap();

        for idx in [comp::AJ, comp::AIJ, comp::AD] {
            let series = t.series(idx);
            assert!(
                series.windows(2).all(|w| w[1] >= w[0]),
                "cumulative component {idx} decreased"
            );
        }
    }

    #[test]
    fn baseline_outbreak_grows() {
        // N = 1000, one undetected case, 60 days at step 0.5: the cumulative
        // isolated-case count must rise throughout.
        let model = Seqijr::new(baseline(1000.0)).unwrap();
        let t = predict(&model, seed_state(1000.0), 0.0, 60.0, 0.5).unwrap();

        let aj = t.series(comp::AJ);
        let at_day = |day: f64| aj[t.nearest_index(day).unwrap()];

        assert_eq!(at_day(0.0), 0.0);
        assert!(at_day(30.0) > at_day(0.0));
        assert!(at_day(60.0) > at_day(30.0));
    }

    #[test]
    fn halving_the_step_barely_moves_the_forecast() {
        // Convergence check: the scheme is (well above) first order, so the
        // day-30 cumulative isolated count must be nearly identical at half
        // the step size.
        let model = Seqijr::new(baseline(1000.0)).unwrap();
        let y0 = seed_state(1000.0);

        let coarse = predict(&model, y0, 0.0, 30.0, 0.5).unwrap();
        let fine = predict(&model, y0, 0.0, 30.0, 0.25).unwrap();

        let aj_coarse = coarse.state_at(coarse.len() - 1)[comp::AJ];
        let aj_fine = fine.state_at(fine.len() - 1)[comp::AJ];

        let rel = (aj_coarse - aj_fine).abs() / aj_fine.max(1e-12);
        assert!(rel < 1e-3, "step halving moved aJ(30) by {rel:.2e} relative");
    }
}
