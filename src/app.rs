//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the forecast pipeline
//! - prints reports/plots
//! - writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{Command, CountriesArgs, ForecastArgs, PlotArgs};
use crate::domain::{ForecastConfig, InterventionSpec};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `epi` binary.
pub fn run() -> Result<(), AppError> {
    // We want `epi` and `epi -c Sweden` to behave like `epi tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Countries(args) => handle_countries(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args);
    let runs = pipeline::run_forecasts(&config)?;
    let multi = runs.len() > 1;

    for run in &runs {
        println!("{}", crate::report::format_run_summary(run, &config));
        println!("{}", crate::report::format_rankings(&run.rankings));

        if config.plot {
            let plot =
                crate::plot::render_ascii_plot(run, config.plot_width, config.plot_height);
            println!("{plot}");
        }

        if let Some(path) = &config.export_results {
            let path = path_for_country(path, &run.series.name, multi);
            crate::io::export::write_results_csv(&path, &run.series.name, &run.residuals)?;
        }
        if let Some(path) = &config.export_forecast {
            let path = path_for_country(path, &run.series.name, multi);
            crate::io::forecast::write_forecast_json(&path, run)?;
        }
    }

    Ok(())
}

fn handle_countries(args: CountriesArgs) -> Result<(), AppError> {
    if args.offline {
        println!("Sampleland");
        return Ok(());
    }

    let table = crate::data::csse::CsseClient::from_env().fetch_confirmed()?;
    for name in table.countries() {
        println!("{name}");
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let forecast = crate::io::forecast::read_forecast_json(&args.forecast)?;
    let plot =
        crate::plot::render_ascii_plot_from_forecast_file(&forecast, args.width, args.height);
    println!("{plot}");
    Ok(())
}

pub fn forecast_config_from_args(args: &ForecastArgs) -> ForecastConfig {
    let intervention = args.intervene.then_some(InterventionSpec {
        pivot_day: args.pivot_day,
        isolated_recovery: args.intervention_recovery,
        extend_days: args.extend,
    });

    ForecastConfig {
        countries: args.countries.clone(),
        config_path: args.config.clone(),
        population_file: args.population_file.clone(),
        population_override: args.population,
        offline: args.offline,
        sample_seed: args.seed,
        sample_days: args.sample_days,
        sample_population: args.sample_population,
        step: args.step,
        seed_window_days: args.seed_window,
        horizon_days: args.horizon,
        intervention,
        top_n: args.top,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_forecast: args.export_forecast.clone(),
    }
}

/// Suffix an export path with the country name for multi-country runs so the
/// second run does not overwrite the first.
fn path_for_country(path: &Path, country: &str, multi: bool) -> PathBuf {
    if !multi {
        return path.to_path_buf();
    }

    let slug: String = country
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("export");
    let mut name = format!("{stem}-{slug}");
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    path.with_file_name(name)
}

/// Rewrite argv so `epi` defaults to `epi tui`.
///
/// Rules:
/// - `epi`                     -> `epi tui`
/// - `epi -c Sweden ...`       -> `epi tui -c Sweden ...`
/// - `epi --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "forecast" | "countries" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&["epi"])), args(&["epi", "tui"]));
        assert_eq!(
            rewrite_args(args(&["epi", "-c", "Sweden"])),
            args(&["epi", "tui", "-c", "Sweden"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["epi", "forecast", "-c", "Italy"])),
            args(&["epi", "forecast", "-c", "Italy"])
        );
        assert_eq!(rewrite_args(args(&["epi", "--help"])), args(&["epi", "--help"]));
    }

    #[test]
    fn intervention_flag_enables_the_fork() {
        use clap::Parser;
        let cli = crate::cli::Cli::parse_from([
            "epi",
            "forecast",
            "--offline",
            "--intervene",
            "--pivot-day",
            "80",
        ]);
        let Command::Forecast(fargs) = cli.command else {
            panic!("expected forecast subcommand");
        };

        let config = forecast_config_from_args(&fargs);
        let spec = config.intervention.unwrap();
        assert_eq!(spec.pivot_day, Some(80.0));
        assert_eq!(spec.isolated_recovery, 1.0);
        assert!(config.offline);
        assert_eq!(config.countries, vec!["Italy".to_string()]);
    }

    #[test]
    fn export_paths_are_suffixed_per_country_only_for_multi_runs() {
        let path = PathBuf::from("out/results.csv");
        assert_eq!(path_for_country(&path, "Italy", false), path);
        assert_eq!(
            path_for_country(&path, "Korea, South", true),
            PathBuf::from("out/results-korea__south.csv")
        );
    }
}
