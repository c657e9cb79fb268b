//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed confirmed counts: `o`
//! - forecast cumulative isolated cases: `-` line
//! - intervention branch: `+` line

use crate::app::pipeline::RunOutput;
use crate::domain::{comp, ForecastFile};

/// Render a plot for an in-memory run.
pub fn render_ascii_plot(run: &RunOutput, width: usize, height: usize) -> String {
    let observed: Vec<(f64, f64)> = run
        .residuals
        .iter()
        .map(|r| (r.day_offset as f64, r.observed))
        .collect();

    let forecast = &run.aligned.forecast;
    let curve: Vec<(f64, f64)> = forecast
        .times()
        .iter()
        .zip(forecast.series(comp::AJ))
        .map(|(&t, v)| (t, v))
        .collect();

    let branch: Option<Vec<(f64, f64)>> = run.aligned.intervention.as_ref().map(|b| {
        b.trajectory
            .times()
            .iter()
            .zip(b.trajectory.series(comp::AJ))
            .map(|(&t, v)| (t, v))
            .collect()
    });

    render_plot(&observed, &curve, branch.as_deref(), width, height)
}

/// Render a plot from a saved forecast JSON file.
pub fn render_ascii_plot_from_forecast_file(
    file: &ForecastFile,
    width: usize,
    height: usize,
) -> String {
    let observed: Vec<(f64, f64)> = file
        .observed
        .day_offsets
        .iter()
        .zip(&file.observed.confirmed)
        .map(|(&d, &v)| (d as f64, v))
        .collect();

    let curve: Vec<(f64, f64)> = file
        .forecast
        .days
        .iter()
        .zip(&file.forecast.cumulative_isolated)
        .map(|(&t, &v)| (t, v))
        .collect();

    let branch: Option<Vec<(f64, f64)>> = file.intervention.as_ref().map(|s| {
        s.days
            .iter()
            .zip(&s.cumulative_isolated)
            .map(|(&t, &v)| (t, v))
            .collect()
    });

    render_plot(&observed, &curve, branch.as_deref(), width, height)
}

fn render_plot(
    observed: &[(f64, f64)],
    curve: &[(f64, f64)],
    branch: Option<&[(f64, f64)]>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = x_range(observed, curve, branch).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(observed, curve, branch).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curves first so observed points can overlay them.
    draw_series(&mut grid, curve, '-', x_min, x_max, y_min, y_max);
    if let Some(branch) = branch {
        draw_series(&mut grid, branch, '+', x_min, x_max, y_min, y_max);
    }
    for &(x, y) in observed {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: day=[{x_min:.1}, {x_max:.1}] | cases=[{y_min:.1}, {y_max:.1}] \
         (o observed, - forecast, + intervention)\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn draw_series(
    grid: &mut [Vec<char>],
    points: &[(f64, f64)],
    mark: char,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let width = grid[0].len();
    for &(x, y) in points {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = mark;
    }
}

fn x_range(
    observed: &[(f64, f64)],
    curve: &[(f64, f64)],
    branch: Option<&[(f64, f64)]>,
) -> Option<(f64, f64)> {
    minmax(all_points(observed, curve, branch).map(|(x, _)| x))
}

fn y_range(
    observed: &[(f64, f64)],
    curve: &[(f64, f64)],
    branch: Option<&[(f64, f64)]>,
) -> Option<(f64, f64)> {
    minmax(all_points(observed, curve, branch).map(|(_, y)| y))
}

fn all_points<'a>(
    observed: &'a [(f64, f64)],
    curve: &'a [(f64, f64)],
    branch: Option<&'a [(f64, f64)]>,
) -> impl Iterator<Item = (f64, f64)> + 'a {
    observed
        .iter()
        .chain(curve.iter())
        .chain(branch.unwrap_or(&[]).iter())
        .copied()
}

fn minmax(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    (min.is_finite() && max > min).then_some((min, max))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    ((u * (width - 1) as f64).round() as usize).min(width - 1)
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top of the plot.
    let row = ((1.0 - u) * (height - 1) as f64).round() as usize;
    row.min(height - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_deterministic_and_sized() {
        let observed = [(0.0, 1.0), (5.0, 10.0)];
        let curve = [(0.0, 0.0), (2.5, 5.0), (5.0, 12.0)];

        let a = render_plot(&observed, &curve, None, 40, 10);
        let b = render_plot(&observed, &curve, None, 40, 10);
        assert_eq!(a, b);

        // Header plus one line per grid row.
        assert_eq!(a.lines().count(), 11);
        assert!(a.contains('o'));
        assert!(a.contains('-'));
    }

    #[test]
    fn intervention_branch_uses_its_own_mark() {
        let observed = [(0.0, 1.0)];
        let curve = [(0.0, 0.0), (5.0, 10.0)];
        let branch = [(5.0, 10.0), (10.0, 12.0)];

        let plot = render_plot(&observed, &curve, Some(&branch), 40, 10);
        assert!(plot.contains('+'));
    }

    #[test]
    fn observed_points_overlay_curves() {
        // A point and a curve sample land in the same cell: the point wins.
        let observed = [(0.0, 0.0)];
        let curve = [(0.0, 0.0), (1.0, 1.0)];
        let plot = render_plot(&observed, &curve, None, 20, 8);
        assert!(plot.contains('o'));
    }

    #[test]
    fn degenerate_ranges_do_not_panic() {
        let plot = render_plot(&[], &[], None, 20, 8);
        assert_eq!(plot.lines().count(), 9);

        let flat = [(1.0, 5.0), (1.0, 5.0)];
        let plot = render_plot(&flat, &[], None, 20, 8);
        assert!(plot.contains('o'));
    }
}
