//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the model/alignment code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{comp, CountrySeries, ForecastConfig};
use crate::report::{DayResidual, Rankings};

/// Format the full run summary (country banner + thresholds + alignment +
/// forecast diagnostics).
pub fn format_run_summary(run: &RunOutput, config: &ForecastConfig) -> String {
    let mut out = String::new();

    out.push_str(&country_banner(&run.series));

    out.push_str(&format!(
        "Scale: N = {:.0} (factor x population)\n",
        run.params.n
    ));
    out.push_str(&format!(
        "Thresholds: R_0 = {:.3} | R_c = {:.3}\n",
        run.basic_reproduction_number, run.controlled_reproduction_number
    ));
    out.push_str(&format!(
        "Anchor: seed day {:.1} (sample {}) | simulated aJ {:.1} > observed min {:.1}\n",
        run.aligned.anchor.sim_day,
        run.aligned.anchor.index,
        run.aligned.anchor.cumulative_isolated,
        run.aligned.anchor.observed_min,
    ));
    out.push_str(&format!(
        "Fit: rmse = {:.2} over {} observed days\n",
        run.rmse,
        run.residuals.len()
    ));

    let forecast = &run.aligned.forecast;
    let last = forecast.len() - 1;
    out.push_str(&format!(
        "Forecast (+{:.0}d): aJ = {:.0} | active isolated = {:.0} | deaths = {:.1}\n",
        config.horizon_days,
        forecast.state_at(last)[comp::AJ],
        forecast.state_at(last)[comp::J],
        forecast.state_at(last)[comp::AD],
    ));

    if let Some(peak) = peak_isolated(run) {
        out.push_str(&format!(
            "Peak isolated load: {:.0} on day {:.1}\n",
            peak.1, peak.0
        ));
    }

    if let Some(branch) = &run.aligned.intervention {
        let traj = &branch.trajectory;
        let end = traj.len() - 1;
        let baseline_at = forecast
            .nearest_index(traj.end())
            .map(|idx| forecast.state_at(idx)[comp::AJ]);

        out.push_str(&format!(
            "Intervention (g_1 -> {:.3} from day {:.1}): aJ = {:.0} at day {:.1}",
            branch.spec.isolated_recovery,
            branch.pivot_day,
            traj.state_at(end)[comp::AJ],
            traj.end(),
        ));
        if let Some(baseline) = baseline_at {
            out.push_str(&format!(" (unforked: {baseline:.0})"));
        }
        out.push('\n');
    }

    out.push('\n');
    out
}

/// The country banner: name, population, and reported interval.
pub fn country_banner(series: &CountrySeries) -> String {
    let rule = "-".repeat(series.name.len().max(8));
    format!(
        "{rule}\n{}\n  Population: {}\n  Interval: {} - {} ({} days)\n{rule}\n",
        series.name.to_uppercase(),
        series.population,
        series.first_date().format("%y-%m-%d"),
        series.last_date().format("%y-%m-%d"),
        series.last_offset() + 1,
    )
}

/// Format the worst-miss tables.
pub fn format_rankings(rankings: &Rankings) -> String {
    let mut out = String::new();

    out.push_str("Most under-predicted days (observed ran ahead):\n");
    out.push_str(&format_table(&rankings.under));
    out.push('\n');

    out.push_str("Most over-predicted days (observed ran behind):\n");
    out.push_str(&format_table(&rankings.over));

    out
}

fn format_table(rows: &[DayResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>6} {:<12} {:>12} {:>12} {:>12}\n",
        "day", "date", "observed", "predicted", "residual"
    ));
    out.push_str(&format!(
        "{:-<6} {:-<12} {:-<12} {:-<12} {:-<12}\n",
        "", "", "", "", ""
    ));

    for r in rows {
        out.push_str(&format!(
            "{:>6} {:<12} {:>12.0} {:>12.1} {:>12.1}\n",
            r.day_offset,
            r.date.format("%Y-%m-%d"),
            r.observed,
            r.predicted,
            r.residual,
        ));
    }

    out
}

/// Day and height of the maximum active isolated load in the forecast.
fn peak_isolated(run: &RunOutput) -> Option<(f64, f64)> {
    let forecast = &run.aligned.forecast;
    (0..forecast.len())
        .map(|i| (forecast.time_at(i), forecast.state_at(i)[comp::J]))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
