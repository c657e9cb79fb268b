//! Fixed-step classical Runge-Kutta (RK4) integration.
//!
//! The epidemic system is smooth and non-stiff, so a fixed-step explicit
//! scheme is a good accuracy-per-step trade-off: RK4 gives 4th-order global
//! accuracy at four derivative evaluations per step, and fixed stepping keeps
//! every run bit-for-bit deterministic. There is no adaptivity; a caller
//! needing finer resolution requests a smaller step explicitly.
//!
//! States are statically sized nalgebra vectors, so a step allocates nothing:
//! the stage values live on the stack.

use nalgebra::SVector;

/// Advance `y` from `t` to `t + h` with one classical RK4 step.
///
/// `f(t, y)` evaluates the instantaneous derivative; it is called once per
/// stage (four times per step) and must be pure.
pub fn rk4_step<const D: usize, F>(f: &F, t: f64, y: SVector<f64, D>, h: f64) -> SVector<f64, D>
where
    F: Fn(f64, &SVector<f64, D>) -> SVector<f64, D>,
{
    let k1 = f(t, &y);
    let k2 = f(t + 0.5 * h, &(y + k1 * (0.5 * h)));
    let k3 = f(t + 0.5 * h, &(y + k2 * (0.5 * h)));
    let k4 = f(t + h, &(y + k3 * h));

    y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::SVector;

    type V1 = SVector<f64, 1>;

    #[test]
    fn exponential_growth_matches_closed_form() {
        // dy/dt = y, y(0) = 1 -> y(t) = e^t.
        let f = |_t: f64, y: &V1| *y;

        let mut y = V1::from([1.0]);
        let h = 0.01;
        for i in 0..100 {
            y = rk4_step(&f, i as f64 * h, y, h);
        }

        let expected = 1.0_f64.exp();
        assert!(
            (y[0] - expected).abs() < 1e-8,
            "RK4 exp(1) error too large: {}",
            (y[0] - expected).abs()
        );
    }

    #[test]
    fn non_autonomous_term_uses_stage_times() {
        // dy/dt = 2t, y(0) = 0 -> y(t) = t^2. Exact for RK4 only when the
        // stage times are passed through correctly.
        let f = |t: f64, _y: &V1| V1::from([2.0 * t]);

        let mut y = V1::from([0.0]);
        let h = 0.25;
        for i in 0..8 {
            y = rk4_step(&f, i as f64 * h, y, h);
        }

        assert!((y[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn halving_the_step_improves_accuracy_by_fourth_order() {
        let f = |_t: f64, y: &V1| *y;
        let integrate = |h: f64, steps: usize| {
            let mut y = V1::from([1.0]);
            for i in 0..steps {
                y = rk4_step(&f, i as f64 * h, y, h);
            }
            y[0]
        };

        let expected = 1.0_f64.exp();
        let err_coarse = (integrate(0.1, 10) - expected).abs();
        let err_fine = (integrate(0.05, 20) - expected).abs();

        // 4th order: halving h should shrink the error by roughly 2^4.
        assert!(err_fine * 8.0 < err_coarse);
    }
}
