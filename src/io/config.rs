//! Model parameter configuration.
//!
//! Parameters come from an explicit, fully specified JSON record — there are
//! no implicit defaults inside the model itself. The key spelling follows the
//! configuration files this tool has historically consumed (`Pi`, `e_E`,
//! `inv_avg_age_in_days`, ...).
//!
//! Both disease-mortality rates are independent fields. Older configs were
//! known to feed one value into both, so loading a config where `d_1` equals
//! `d_2` exactly is flagged as suspicious (it is almost always a copy/paste
//! slip, not a modeling choice) — but not rejected.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::ModelParams;
use crate::error::AppError;

/// The on-disk parameter record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Fraction of the real population used as the model scale N.
    pub population_factor: f64,
    #[serde(rename = "Pi")]
    pub pi: f64,
    /// Natural mortality rate, configured as 1 / (average age in days).
    #[serde(rename = "inv_avg_age_in_days")]
    pub mu: f64,
    pub b: f64,
    #[serde(rename = "e_E")]
    pub e_e: f64,
    #[serde(rename = "e_Q")]
    pub e_q: f64,
    #[serde(rename = "e_J")]
    pub e_j: f64,
    pub g_1: f64,
    pub g_2: f64,
    pub s_1: f64,
    pub s_2: f64,
    pub k_1: f64,
    pub k_2: f64,
    pub d_1: f64,
    pub d_2: f64,
}

impl ModelConfig {
    /// The baseline scenario: a moderately transmissible outbreak with
    /// two-week incubation, fast contact tracing, and slow case finding.
    pub fn baseline() -> Self {
        Self {
            population_factor: 0.05,
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

    /// Concrete model parameters for a country: N is the configured fraction
    /// of its real population.
    pub fn params_for_population(&self, population: u64) -> ModelParams {
        ModelParams {
            n: self.population_factor * population as f64,
            pi: self.pi,
            mu: self.mu,
            b: self.b,
            e_e: self.e_e,
            e_q: self.e_q,
            e_j: self.e_j,
            g_1: self.g_1,
            g_2: self.g_2,
            s_1: self.s_1,
            s_2: self.s_2,
            k_1: self.k_1,
            k_2: self.k_2,
            d_1: self.d_1,
            d_2: self.d_2,
        }
    }

    /// A warning message when the config looks like it came from a source
    /// that fed one mortality value into both fields; `None` when fine.
    pub fn mortality_suspicion(&self) -> Option<String> {
        (self.d_1 == self.d_2).then(|| {
            format!(
                "d_1 and d_2 are exactly equal ({}); undetected and isolated \
                 mortality are independent parameters — double-check the config.",
                self.d_1
            )
        })
    }
}

/// Load a parameter record from a JSON file.
pub fn load_model_config(path: &Path) -> Result<ModelConfig, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("Failed to open config '{}': {e}", path.display()))
    })?;
    let config: ModelConfig = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid config '{}': {e}", path.display())))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_produces_valid_params() {
        let params = ModelConfig::baseline().params_for_population(60_000_000);
        assert!(params.validate().is_ok());
        assert!((params.n - 3_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn baseline_mortalities_differ() {
        assert!(ModelConfig::baseline().mortality_suspicion().is_none());
    }

    #[test]
    fn equal_mortalities_are_flagged() {
        let config = ModelConfig {
            d_2: 0.05 / 7.0,
            d_1: 0.05 / 7.0,
            ..ModelConfig::baseline()
        };
        let warning = config.mortality_suspicion().unwrap();
        assert!(warning.contains("d_1"));
        assert!(warning.contains("d_2"));
    }

    #[test]
    fn parses_historic_key_spelling() {
        let json = r#"{
            "population_factor": 0.05,
            "Pi": 0.0,
            "inv_avg_age_in_days": 0.0000342,
            "b": 0.8,
            "e_E": 0.25,
            "e_Q": 0.0,
            "e_J": 0.1,
            "g_1": 0.0526,
            "g_2": 0.1429,
            "s_1": 0.0714,
            "s_2": 0.1429,
            "k_1": 0.3333,
            "k_2": 0.0714,
            "d_1": 0.00714,
            "d_2": 0.00429
        }"#;

        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pi, 0.0);
        assert!((config.b - 0.8).abs() < 1e-12);
        assert!((config.e_e - 0.25).abs() < 1e-12);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let json = r#"{"population_factor": 0.05, "bogus": 1.0}"#;
        assert!(serde_json::from_str::<ModelConfig>(json).is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ModelConfig::baseline();
        let json = serde_json::to_string(&config).unwrap();
        // The canonical key spelling is preserved on the way out.
        assert!(json.contains("\"Pi\""));
        assert!(json.contains("\"e_E\""));
        let back: ModelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
