//! Read/write forecast JSON files.
//!
//! Forecast JSON is the "portable" representation of a finished run:
//! - the parameter set and both reproduction numbers
//! - the anchor that tied simulation time to calendar time
//! - the observed points and the sampled forecast/intervention series
//!
//! The schema is defined by `domain::ForecastFile`; `epi plot` renders these
//! files without refetching or reintegrating anything.

use std::fs::File;
use std::path::Path;

use crate::app::pipeline::RunOutput;
use crate::domain::{ForecastFile, ObservedPoints, SampledSeries};
use crate::error::AppError;

/// Assemble the portable representation of a run.
pub fn forecast_file_from_run(run: &RunOutput) -> ForecastFile {
    ForecastFile {
        tool: "epi".to_string(),
        country: run.series.name.clone(),
        population: run.series.population,
        first_date: run.series.first_date(),
        step: run.aligned.forecast.step(),
        basic_reproduction_number: run.basic_reproduction_number,
        controlled_reproduction_number: run.controlled_reproduction_number,
        anchor: run.aligned.anchor,
        params: run.params,
        observed: ObservedPoints {
            day_offsets: run.series.day_offsets(),
            confirmed: run.series.confirmed.clone(),
        },
        forecast: SampledSeries::from_trajectory(&run.aligned.forecast),
        intervention: run
            .aligned
            .intervention
            .as_ref()
            .map(|b| SampledSeries::from_trajectory(&b.trajectory)),
    }
}

/// Write a forecast JSON file.
pub fn write_forecast_json(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::config(format!(
            "Failed to create forecast JSON '{}': {e}",
            path.display()
        ))
    })?;

    serde_json::to_writer_pretty(file, &forecast_file_from_run(run))
        .map_err(|e| AppError::config(format!("Failed to write forecast JSON: {e}")))?;

    Ok(())
}

/// Read a forecast JSON file.
pub fn read_forecast_json(path: &Path) -> Result<ForecastFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!(
            "Failed to open forecast JSON '{}': {e}",
            path.display()
        ))
    })?;
    let forecast: ForecastFile = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid forecast JSON: {e}")))?;
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{run_forecasts, RunOutput};
    use crate::domain::{ForecastConfig, InterventionSpec};

    fn offline_run() -> RunOutput {
        let config = ForecastConfig {
            countries: vec!["Sampleland".to_string()],
            config_path: None,
            population_file: None,
            population_override: None,
            offline: true,
            sample_seed: 7,
            sample_days: 90,
            sample_population: 5_000_000,
            step: 0.5,
            seed_window_days: 365.0,
            horizon_days: 7.0,
            intervention: Some(InterventionSpec {
                pivot_day: None,
                isolated_recovery: 1.0,
                extend_days: 14.0,
            }),
            top_n: 5,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            export_results: None,
            export_forecast: None,
        };
        run_forecasts(&config).unwrap().remove(0)
    }

    #[test]
    fn forecast_file_mirrors_the_run() {
        let run = offline_run();
        let file = forecast_file_from_run(&run);

        assert_eq!(file.country, "Sampleland");
        assert_eq!(file.observed.day_offsets.len(), run.series.len());
        assert_eq!(file.forecast.days.len(), run.aligned.forecast.len());
        assert!(file.intervention.is_some());
        assert_eq!(file.anchor.index, run.aligned.anchor.index);
    }

    #[test]
    fn forecast_json_round_trips() {
        let run = offline_run();

        let mut path = std::env::temp_dir();
        path.push("epi-forecast-roundtrip-test.json");

        write_forecast_json(&path, &run).unwrap();
        let back = read_forecast_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back.country, "Sampleland");
        assert_eq!(back.step, run.aligned.forecast.step());
        assert_eq!(
            back.forecast.cumulative_isolated.len(),
            run.aligned.forecast.len()
        );
        assert_eq!(back.params, run.params);
    }
}
