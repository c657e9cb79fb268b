//! Debug bundle writer for inspecting a finished forecast run.
//!
//! Writes a timestamped markdown file with the parameter set, thresholds,
//! alignment result, and worst residuals — enough to reconstruct why a
//! forecast looks the way it does without re-running anything.

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::{comp, ForecastConfig};
use crate::error::AppError;

pub fn write_debug_bundle(
    run: &RunOutput,
    config: &ForecastConfig,
) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir)
        .map_err(|e| AppError::config(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let slug: String = run
        .series
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let path = dir.join(format!("epi_debug_{slug}_{ts}.md"));

    let mut out = String::new();
    out.push_str("# epi debug bundle\n");
    out.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    out.push_str(&format!("- country: {}\n", run.series.name));
    out.push_str(&format!("- population: {}\n", run.series.population));
    out.push_str(&format!(
        "- observed: {} days, {} - {}\n",
        run.series.len(),
        run.series.first_date(),
        run.series.last_date()
    ));
    out.push_str(&format!(
        "- run: step={} seed_window={} horizon={}\n",
        config.step, config.seed_window_days, config.horizon_days
    ));

    out.push_str("\n## Parameters\n");
    out.push_str("| param | value |\n| - | - |\n");
    let p = &run.params;
    for (name, value) in [
        ("N", p.n),
        ("Pi", p.pi),
        ("mu", p.mu),
        ("b", p.b),
        ("e_E", p.e_e),
        ("e_Q", p.e_q),
        ("e_J", p.e_j),
        ("g_1", p.g_1),
        ("g_2", p.g_2),
        ("s_1", p.s_1),
        ("s_2", p.s_2),
        ("k_1", p.k_1),
        ("k_2", p.k_2),
        ("d_1", p.d_1),
        ("d_2", p.d_2),
    ] {
        out.push_str(&format!("| {name} | {value:.6} |\n"));
    }

    out.push_str("\n## Thresholds\n");
    out.push_str(&format!("- R_0 = {:.4}\n", run.basic_reproduction_number));
    out.push_str(&format!("- R_c = {:.4}\n", run.controlled_reproduction_number));

    out.push_str("\n## Alignment\n");
    let anchor = &run.aligned.anchor;
    out.push_str(&format!(
        "- anchor: sample {} (seed day {:.1}), simulated aJ {:.2} > observed min {:.2}\n",
        anchor.index, anchor.sim_day, anchor.cumulative_isolated, anchor.observed_min
    ));
    let forecast = &run.aligned.forecast;
    let last = forecast.len() - 1;
    out.push_str(&format!(
        "- forecast: [{:.1}, {:.1}] at step {} ({} samples)\n",
        forecast.start(),
        forecast.end(),
        forecast.step(),
        forecast.len()
    ));
    out.push_str(&format!(
        "- end state: aJ={:.1} J={:.1} aD={:.2}\n",
        forecast.state_at(last)[comp::AJ],
        forecast.state_at(last)[comp::J],
        forecast.state_at(last)[comp::AD]
    ));
    if let Some(branch) = &run.aligned.intervention {
        let end = branch.trajectory.len() - 1;
        out.push_str(&format!(
            "- intervention: g_1 -> {:.4} from day {:.1}, aJ={:.1} at day {:.1}\n",
            branch.spec.isolated_recovery,
            branch.pivot_day,
            branch.trajectory.state_at(end)[comp::AJ],
            branch.trajectory.end()
        ));
    }

    out.push_str("\n## Fit\n");
    out.push_str(&format!("- rmse: {:.3}\n", run.rmse));
    out.push_str("\n| day | observed | predicted | residual |\n| - | - | - | - |\n");
    for r in run.rankings.under.iter().chain(run.rankings.over.iter()) {
        out.push_str(&format!(
            "| {} | {:.0} | {:.1} | {:.1} |\n",
            r.day_offset, r.observed, r.predicted, r.residual
        ));
    }

    let mut file = File::create(&path)
        .map_err(|e| AppError::config(format!("Failed to create debug file: {e}")))?;
    file.write_all(out.as_bytes())
        .map_err(|e| AppError::config(format!("Failed to write debug file: {e}")))?;

    Ok(path)
}
