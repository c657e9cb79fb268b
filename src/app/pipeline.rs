//! Shared "forecast pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! series fetch -> model construction -> align/forecast -> residuals -> rankings
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! Multi-country runs fan out in parallel; each country gets its own model,
//! aligner, and trajectories, so nothing is shared mutably between runs.

use rayon::prelude::*;

use crate::data::csse::CsseClient;
use crate::data::population::resolve_population;
use crate::data::sample::{synthetic_series, SampleSpec};
use crate::domain::{CountrySeries, ForecastConfig, ModelParams};
use crate::error::AppError;
use crate::fit::align::{align_and_forecast, AlignOptions, AlignedForecast};
use crate::io::config::{load_model_config, ModelConfig};
use crate::model::Seqijr;
use crate::report::{compute_residuals, rank_misses, rmse, DayResidual, Rankings};

/// All computed outputs of a single-country forecast run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub series: CountrySeries,
    pub params: ModelParams,
    pub basic_reproduction_number: f64,
    pub controlled_reproduction_number: f64,
    pub aligned: AlignedForecast,
    pub residuals: Vec<DayResidual>,
    pub rankings: Rankings,
    pub rmse: f64,
}

/// Execute the full pipeline for every configured country.
pub fn run_forecasts(config: &ForecastConfig) -> Result<Vec<RunOutput>, AppError> {
    let model_config = resolve_model_config(config)?;
    let series_list = load_series(config)?;

    series_list
        .into_par_iter()
        .map(|series| run_forecast_with_series(&model_config, series, config))
        .collect()
}

/// Load the parameter record (file or baseline) and surface the duplicate
/// mortality warning.
pub fn resolve_model_config(config: &ForecastConfig) -> Result<ModelConfig, AppError> {
    let model_config = match &config.config_path {
        Some(path) => load_model_config(path)?,
        None => ModelConfig::baseline(),
    };
    if let Some(warning) = model_config.mortality_suspicion() {
        eprintln!("warning: {warning}");
    }
    Ok(model_config)
}

/// Fetch (or synthesize, for offline runs) the observed series for every
/// configured country. The remote table is fetched once and shared.
pub fn load_series(config: &ForecastConfig) -> Result<Vec<CountrySeries>, AppError> {
    if config.offline {
        return config
            .countries
            .iter()
            .map(|name| {
                let population = config
                    .population_override
                    .unwrap_or(config.sample_population);
                synthetic_series(&SampleSpec {
                    name: name.clone(),
                    population,
                    days: config.sample_days,
                    seed: config.sample_seed,
                })
            })
            .collect();
    }

    let table = CsseClient::from_env().fetch_confirmed()?;
    config
        .countries
        .iter()
        .map(|name| {
            let population = resolve_population(config, name)?;
            table.country_series(name, population)
        })
        .collect()
}

/// Execute the pipeline for one pre-loaded series.
///
/// This is the entry point the TUI uses to refit without refetching.
pub fn run_forecast_with_series(
    model_config: &ModelConfig,
    series: CountrySeries,
    config: &ForecastConfig,
) -> Result<RunOutput, AppError> {
    let params = model_config.params_for_population(series.population);
    let model = Seqijr::new(params)?;

    let aligned = align_and_forecast(
        &model,
        &series,
        &AlignOptions {
            seed_window_days: config.seed_window_days,
            step: config.step,
            horizon_days: config.horizon_days,
            intervention: config.intervention,
        },
    )?;

    let residuals = compute_residuals(&series, &aligned.forecast)?;
    let rankings = rank_misses(&residuals, config.top_n);
    let rmse = rmse(&residuals);

    Ok(RunOutput {
        series,
        params,
        basic_reproduction_number: model.basic_reproduction_number(),
        controlled_reproduction_number: model.controlled_reproduction_number(),
        aligned,
        residuals,
        rankings,
        rmse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InterventionSpec;

    fn offline_config() -> ForecastConfig {
        ForecastConfig {
            countries: vec!["Sampleland".to_string()],
            config_path: None,
            population_file: None,
            population_override: None,
            offline: true,
            sample_seed: 42,
            sample_days: 120,
            sample_population: 10_000_000,
            step: 0.5,
            seed_window_days: 365.0,
            horizon_days: 14.0,
            intervention: None,
            top_n: 5,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            export_results: None,
            export_forecast: None,
        }
    }

    #[test]
    fn offline_pipeline_runs_end_to_end() {
        let runs = run_forecasts(&offline_config()).unwrap();
        assert_eq!(runs.len(), 1);

        let run = &runs[0];
        assert_eq!(run.series.name, "Sampleland");
        assert_eq!(run.residuals.len(), run.series.len());
        assert!(run.rmse.is_finite());
        assert!(run.basic_reproduction_number > run.controlled_reproduction_number);

        // Forecast covers the observed window plus the horizon.
        assert_eq!(
            run.aligned.forecast.end(),
            run.series.last_offset() as f64 + 14.0
        );
    }

    #[test]
    fn multi_country_runs_are_independent() {
        let mut config = offline_config();
        config.countries = vec!["A".to_string(), "B".to_string()];

        let runs = run_forecasts(&config).unwrap();
        assert_eq!(runs.len(), 2);
        // Same seed and population: identical data, identical forecasts.
        assert_eq!(runs[0].series.confirmed, runs[1].series.confirmed);
        assert_eq!(runs[0].rmse, runs[1].rmse);
    }

    #[test]
    fn intervention_threads_through_the_pipeline() {
        let mut config = offline_config();
        config.intervention = Some(InterventionSpec {
            pivot_day: None,
            isolated_recovery: 1.0,
            extend_days: 30.0,
        });

        let runs = run_forecasts(&config).unwrap();
        let branch = runs[0].aligned.intervention.as_ref().unwrap();
        assert_eq!(branch.pivot_day, runs[0].series.last_offset() as f64);
    }
}
