//! Reporting utilities: forecast-vs-observed residuals and formatted output.

use chrono::NaiveDate;

use crate::domain::{comp, CountrySeries, Trajectory};
use crate::error::AppError;

pub mod format;

pub use format::*;

/// One observed day compared against the forecast.
#[derive(Debug, Clone)]
pub struct DayResidual {
    pub day_offset: i64,
    pub date: NaiveDate,
    pub observed: f64,
    /// Forecast cumulative isolated cases at the nearest sample.
    pub predicted: f64,
    /// `observed - predicted`; positive means the forecast ran low.
    pub residual: f64,
}

/// Days where the forecast missed worst in each direction.
#[derive(Debug, Clone)]
pub struct Rankings {
    /// Largest positive residuals (forecast under-predicted).
    pub under: Vec<DayResidual>,
    /// Largest negative residuals (forecast over-predicted).
    pub over: Vec<DayResidual>,
}

/// Compare each observed day against the forecast's cumulative isolated
/// series at the nearest sample.
pub fn compute_residuals(
    series: &CountrySeries,
    forecast: &Trajectory,
) -> Result<Vec<DayResidual>, AppError> {
    let mut out = Vec::with_capacity(series.len());

    for ((offset, date), observed) in series
        .day_offsets()
        .into_iter()
        .zip(&series.dates)
        .zip(&series.confirmed)
    {
        let index = forecast.nearest_index(offset as f64).ok_or_else(|| {
            AppError::config(format!(
                "Observed day {offset} lies outside the forecast window."
            ))
        })?;
        let predicted = forecast.state_at(index)[comp::AJ];
        if !predicted.is_finite() {
            return Err(AppError::numerical(
                "Non-finite forecast value during residual computation.",
            ));
        }

        out.push(DayResidual {
            day_offset: offset,
            date: *date,
            observed: *observed,
            predicted,
            residual: *observed - predicted,
        });
    }

    Ok(out)
}

/// Root-mean-square error over all compared days (0 for an empty slice).
pub fn rmse(residuals: &[DayResidual]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = residuals.iter().map(|r| r.residual * r.residual).sum();
    (sum_sq / residuals.len() as f64).sqrt()
}

/// Rank the top under- and over-predicted days.
pub fn rank_misses(residuals: &[DayResidual], top_n: usize) -> Rankings {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .partial_cmp(&a.residual)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let under = sorted.iter().take(top_n).cloned().collect();

    let mut sorted_over = residuals.to_vec();
    sorted_over.sort_by(|a, b| {
        a.residual
            .partial_cmp(&b.residual)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let over = sorted_over.iter().take(top_n).cloned().collect();

    Rankings { under, over }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountrySeries, StateVector, Trajectory};

    fn flat_trajectory(value: f64, samples: usize) -> Trajectory {
        let mut y = StateVector::zeros();
        y[comp::AJ] = value;
        Trajectory::from_samples(0.0, 0.5, vec![y; samples])
    }

    fn series(counts: &[f64]) -> CountrySeries {
        let first = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let dates = (0..counts.len() as i64)
            .map(|i| first + chrono::Duration::days(i))
            .collect();
        CountrySeries::new("Testland", 1_000, dates, counts.to_vec()).unwrap()
    }

    #[test]
    fn residuals_match_nearest_samples() {
        let observed = series(&[4.0, 6.0, 11.0]);
        let forecast = flat_trajectory(5.0, 10);

        let residuals = compute_residuals(&observed, &forecast).unwrap();
        assert_eq!(residuals.len(), 3);
        assert_eq!(residuals[0].residual, -1.0);
        assert_eq!(residuals[1].residual, 1.0);
        assert_eq!(residuals[2].residual, 6.0);
    }

    #[test]
    fn observation_outside_window_is_an_error() {
        let observed = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        // Only covers day offsets [0, 2].
        let forecast = flat_trajectory(5.0, 5);
        assert!(compute_residuals(&observed, &forecast).is_err());
    }

    #[test]
    fn rmse_of_exact_fit_is_zero() {
        let observed = series(&[5.0, 5.0]);
        let forecast = flat_trajectory(5.0, 4);
        let residuals = compute_residuals(&observed, &forecast).unwrap();
        assert_eq!(rmse(&residuals), 0.0);
    }

    #[test]
    fn rank_misses_orders_both_directions() {
        let observed = series(&[1.0, 5.0, 9.0]);
        let forecast = flat_trajectory(5.0, 10);
        let residuals = compute_residuals(&observed, &forecast).unwrap();

        let rankings = rank_misses(&residuals, 1);
        assert_eq!(rankings.under.len(), 1);
        assert_eq!(rankings.under[0].observed, 9.0);
        assert_eq!(rankings.over[0].observed, 1.0);
    }
}
