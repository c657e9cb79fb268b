//! Export per-day results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per observed day, observed vs forecast.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::report::DayResidual;

/// Write per-day forecast-vs-observed results to a CSV file.
pub fn write_results_csv(
    path: &Path,
    country: &str,
    residuals: &[DayResidual],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::config(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "country,day_offset,date,observed,predicted,residual")
        .map_err(|e| AppError::config(format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        writeln!(
            file,
            "{},{},{},{:.1},{:.4},{:.4}",
            country,
            r.day_offset,
            r.date.format("%Y-%m-%d"),
            r.observed,
            r.predicted,
            r.residual,
        )
        .map_err(|e| AppError::config(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
