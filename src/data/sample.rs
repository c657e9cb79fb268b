//! Synthetic observed-series generation for offline runs.
//!
//! `--offline` swaps the network fetch for a deterministic, seeded synthetic
//! country: a logistic cumulative-case curve with mild multiplicative noise,
//! forced monotone so it behaves like a real cumulative report. Useful for
//! demos without connectivity and for exercising the full pipeline in tests.

use chrono::NaiveDate;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::CountrySeries;
use crate::error::AppError;

/// Fraction of the population the synthetic outbreak eventually reaches.
const ATTACK_FRACTION: f64 = 0.02;

/// Logistic growth rate per day.
const GROWTH_RATE: f64 = 0.15;

/// Std dev of the multiplicative log-noise on daily reports.
const NOISE_SIGMA: f64 = 0.05;

/// First date of the synthetic report (the upstream dataset's epoch; fixed so
/// runs never depend on the wall clock).
const EPOCH: (i32, u32, u32) = (2020, 1, 22);

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub name: String,
    pub population: u64,
    pub days: usize,
    pub seed: u64,
}

/// Generate a deterministic synthetic [`CountrySeries`].
pub fn synthetic_series(spec: &SampleSpec) -> Result<CountrySeries, AppError> {
    if spec.days < 2 {
        return Err(AppError::config("Synthetic series needs at least 2 days."));
    }
    if spec.population == 0 {
        return Err(AppError::config("Synthetic population must be positive."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let noise = Normal::new(0.0, NOISE_SIGMA)
        .map_err(|e| AppError::numerical(format!("Noise distribution error: {e}")))?;

    let ceiling = ATTACK_FRACTION * spec.population as f64;
    let midpoint = spec.days as f64 * 0.6;

    let first = NaiveDate::from_ymd_opt(EPOCH.0, EPOCH.1, EPOCH.2)
        .expect("epoch is a valid date");

    let mut dates = Vec::with_capacity(spec.days);
    let mut confirmed = Vec::with_capacity(spec.days);
    let mut running_max: f64 = 1.0;

    for day in 0..spec.days {
        let t = day as f64;
        let level = ceiling / (1.0 + (-GROWTH_RATE * (t - midpoint)).exp());
        let noisy = level * noise.sample(&mut rng).exp();

        // Cumulative reports never go down, and a series that starts at zero
        // confirmed cases has not started yet.
        running_max = running_max.max(noisy.round()).max(1.0);

        dates.push(first + chrono::Duration::days(day as i64));
        confirmed.push(running_max);
    }

    CountrySeries::new(spec.name.clone(), spec.population, dates, confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SampleSpec {
        SampleSpec {
            name: "Sampleland".to_string(),
            population: 10_000_000,
            days: 120,
            seed: 42,
        }
    }

    #[test]
    fn same_seed_same_series() {
        let a = synthetic_series(&spec()).unwrap();
        let b = synthetic_series(&spec()).unwrap();
        assert_eq!(a.confirmed, b.confirmed);
        assert_eq!(a.dates, b.dates);
    }

    #[test]
    fn different_seed_different_series() {
        let a = synthetic_series(&spec()).unwrap();
        let b = synthetic_series(&SampleSpec { seed: 43, ..spec() }).unwrap();
        assert_ne!(a.confirmed, b.confirmed);
    }

    #[test]
    fn series_is_monotone_and_positive() {
        let series = synthetic_series(&spec()).unwrap();
        assert_eq!(series.len(), 120);
        assert!(series.confirmed.windows(2).all(|w| w[1] >= w[0]));
        assert!(series.min_confirmed() >= 1.0);
    }

    #[test]
    fn growth_saturates_below_the_attack_ceiling() {
        let series = synthetic_series(&spec()).unwrap();
        let last = *series.confirmed.last().unwrap();
        let ceiling = ATTACK_FRACTION * 10_000_000.0;
        assert!(last > ceiling * 0.5);
        assert!(last < ceiling * 1.5);
    }

    #[test]
    fn degenerate_specs_are_rejected() {
        assert!(synthetic_series(&SampleSpec { days: 1, ..spec() }).is_err());
        assert!(synthetic_series(&SampleSpec { population: 0, ..spec() }).is_err());
    }
}
