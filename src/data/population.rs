//! Population lookups from a `country,population` CSV file.
//!
//! The original population source is a spreadsheet; operationally a
//! two-column CSV export of it is what gets shipped around, so that is the
//! format we read. The file path comes from `--population-file` or the
//! `EPI_POPULATION_FILE` environment variable; `--population` bypasses the
//! file entirely.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::ForecastConfig;
use crate::error::AppError;

/// Environment variable naming the population CSV file.
pub const POPULATION_FILE_ENV: &str = "EPI_POPULATION_FILE";

/// Load the full `country -> population` table.
pub fn load_population_table(path: &Path) -> Result<HashMap<String, u64>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!(
            "Failed to open population file '{}': {e}",
            path.display()
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read population headers: {e}")))?
        .clone();

    let find = |wanted: &str| {
        headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(wanted))
    };
    let country_idx = find("country")
        .ok_or_else(|| AppError::config("Population file has no 'country' column."))?;
    let population_idx = find("population")
        .ok_or_else(|| AppError::config("Population file has no 'population' column."))?;

    let mut table = HashMap::new();
    for (line, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| AppError::config(format!("Population CSV parse error: {e}")))?;

        let country = record
            .get(country_idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::config(format!("Population file row {} has no country.", line + 2))
            })?;
        let population = record
            .get(population_idx)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                AppError::config(format!(
                    "Population file row {} has an invalid population for '{country}'.",
                    line + 2
                ))
            })?;

        table.insert(country.to_string(), population);
    }

    Ok(table)
}

/// Resolve a country's population from the run configuration.
///
/// Precedence: explicit `--population` override, then the configured file,
/// then [`POPULATION_FILE_ENV`]. A country absent from the table is a lookup
/// error (exit 3); having no source at all is a configuration error.
pub fn resolve_population(config: &ForecastConfig, country: &str) -> Result<u64, AppError> {
    if let Some(population) = config.population_override {
        if population == 0 {
            return Err(AppError::config("Population override must be positive."));
        }
        return Ok(population);
    }

    let path = match &config.population_file {
        Some(path) => path.clone(),
        None => {
            dotenvy::dotenv().ok();
            std::env::var(POPULATION_FILE_ENV)
                .map(PathBuf::from)
                .map_err(|_| {
                    AppError::config(format!(
                        "No population source: pass --population/--population-file \
                         or set {POPULATION_FILE_ENV}."
                    ))
                })?
        }
    };

    let table = load_population_table(&path)?;
    table.get(country).copied().ok_or_else(|| {
        AppError::lookup(format!(
            "Country '{country}' not found in population file '{}'.",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "epi-population-test-{}.csv",
            std::process::id() as u64 + contents.len() as u64
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_table_and_looks_up() {
        let path = write_temp("country,population\nItaly,60360000\nSweden,10230000\n");
        let table = load_population_table(&path).unwrap();
        assert_eq!(table.get("Italy"), Some(&60_360_000));
        assert_eq!(table.get("Sweden"), Some(&10_230_000));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_columns_are_config_errors() {
        let path = write_temp("name,people\nItaly,60360000\n");
        let err = load_population_table(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn invalid_population_value_is_a_config_error() {
        let path = write_temp("country,population\nItaly,lots\n");
        assert!(load_population_table(&path).is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn override_takes_precedence() {
        let config = test_config(Some(123), None);
        assert_eq!(resolve_population(&config, "Anywhere").unwrap(), 123);
    }

    #[test]
    fn missing_country_is_a_lookup_error() {
        let path = write_temp("country,population\nItaly,60360000\n");
        let config = test_config(None, Some(path.clone()));
        let err = resolve_population(&config, "Atlantis").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        std::fs::remove_file(path).ok();
    }

    fn test_config(
        population_override: Option<u64>,
        population_file: Option<PathBuf>,
    ) -> ForecastConfig {
        ForecastConfig {
            countries: vec!["Italy".to_string()],
            config_path: None,
            population_file,
            population_override,
            offline: false,
            sample_seed: 42,
            sample_days: 120,
            sample_population: 10_000_000,
            step: 0.5,
            seed_window_days: 365.0,
            horizon_days: 14.0,
            intervention: None,
            top_n: 10,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            export_results: None,
            export_forecast: None,
        }
    }
}
