//! Command-line parsing for the SEQIJR forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/alignment code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "epi", version, about = "SEQIJR epidemic forecaster (JHU CSSE-based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Align the model against observed cases, print a forecast, and
    /// optionally plot/export.
    Forecast(ForecastArgs),
    /// List country names known to the case series.
    Countries(CountriesArgs),
    /// Plot a previously exported forecast JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `epi forecast`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(ForecastArgs),
}

/// Common options for forecasting.
#[derive(Debug, Parser, Clone)]
pub struct ForecastArgs {
    /// Country to forecast (repeatable).
    #[arg(short = 'c', long = "country", default_value = "Italy")]
    pub countries: Vec<String>,

    /// Model parameter JSON file (built-in baseline scenario when omitted).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// `country,population` CSV file for population lookups.
    #[arg(long = "population-file")]
    pub population_file: Option<PathBuf>,

    /// Population override (skips the population file).
    #[arg(long)]
    pub population: Option<u64>,

    /// Use a deterministic synthetic series instead of fetching.
    #[arg(long)]
    pub offline: bool,

    /// Length of the synthetic series in days (offline runs).
    #[arg(long = "sample-days", default_value_t = 120)]
    pub sample_days: usize,

    /// Random seed for the synthetic series (offline runs).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Synthetic population (offline runs without --population).
    #[arg(long = "sample-population", default_value_t = 10_000_000)]
    pub sample_population: u64,

    /// Integration step size in days.
    #[arg(long, default_value_t = 0.5)]
    pub step: f64,

    /// Seed-pass window in days since the epidemic seed.
    #[arg(long = "seed-window", default_value_t = 365.0)]
    pub seed_window: f64,

    /// Days to forecast past the last observation.
    #[arg(long, default_value_t = 14.0)]
    pub horizon: f64,

    /// Fork an intervention branch from the pivot day.
    #[arg(long)]
    pub intervene: bool,

    /// Isolated-case recovery rate (g_1) after the intervention pivot.
    #[arg(long = "intervention-recovery", default_value_t = 1.0)]
    pub intervention_recovery: f64,

    /// Intervention pivot day offset (defaults to the last observed day).
    #[arg(long = "pivot-day")]
    pub pivot_day: Option<f64>,

    /// Days to integrate the intervention branch past the pivot.
    #[arg(long, default_value_t = 60.0)]
    pub extend: f64,

    /// Show top-N under- and over-predicted days.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-day results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the forecast (params + anchor + sampled series) to JSON.
    #[arg(long = "export-forecast")]
    pub export_forecast: Option<PathBuf>,
}

/// Options for listing countries.
#[derive(Debug, Parser)]
pub struct CountriesArgs {
    /// List the synthetic offline country instead of fetching.
    #[arg(long)]
    pub offline: bool,
}

/// Options for plotting a saved forecast.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Forecast JSON file produced by `epi forecast --export-forecast`.
    #[arg(long, value_name = "JSON")]
    pub forecast: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
