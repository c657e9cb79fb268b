//! JHU CSSE time-series integration.
//!
//! The upstream dataset is a wide CSV: one row per country/province, one
//! column per calendar day (headers like `3/1/20`), cumulative confirmed
//! counts in the cells. This module fetches it, recognizes the date-labeled
//! columns, and sums provinces into per-country series.
//!
//! Design goals (matching the rest of the data layer):
//! - **Deterministic behavior**: column order is normalized by parsed date.
//! - **Row-level tolerance**: a malformed row is skipped and counted, it does
//!   not fail the whole table.
//! - **Separation of concerns**: no model or alignment logic here.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use csv::StringRecord;
use reqwest::blocking::Client;

use crate::domain::CountrySeries;
use crate::error::AppError;

/// Upstream cumulative-confirmed CSV (JHU CSSE COVID-19 repository).
pub const DEFAULT_CONFIRMED_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_confirmed_global.csv";

/// Environment variable overriding the confirmed-series URL.
pub const CONFIRMED_URL_ENV: &str = "EPI_CONFIRMED_URL";

const COUNTRY_COLUMN: &str = "country/region";

/// Date format used by CSSE column headers (e.g. `3/1/20`).
const HEADER_DATE_FORMAT: &str = "%m/%d/%y";

pub struct CsseClient {
    client: Client,
    url: String,
}

impl CsseClient {
    /// Client using the default upstream URL, overridable via
    /// [`CONFIRMED_URL_ENV`] (read through `.env` like all our env knobs).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let url =
            std::env::var(CONFIRMED_URL_ENV).unwrap_or_else(|_| DEFAULT_CONFIRMED_URL.to_string());
        Self {
            client: Client::new(),
            url,
        }
    }

    pub fn fetch_confirmed(&self) -> Result<ConfirmedTable, AppError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::lookup(format!("Case-series request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::lookup(format!(
                "Case-series request failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::lookup(format!("Failed to read case-series response: {e}")))?;

        parse_confirmed_csv(&body)
    }
}

/// The parsed upstream table: shared date axis plus one row per
/// country/province.
#[derive(Debug, Clone)]
pub struct ConfirmedTable {
    dates: Vec<NaiveDate>,
    rows: Vec<(String, Vec<f64>)>,
    /// Rows dropped due to malformed cells.
    pub rows_skipped: usize,
}

impl ConfirmedTable {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Sorted, de-duplicated country names (provinces share one name).
    pub fn countries(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|(name, _)| name.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Sum all provinces of `name` into a [`CountrySeries`].
    ///
    /// An unknown country is a lookup error (exit 3) surfaced before any
    /// model construction.
    pub fn country_series(&self, name: &str, population: u64) -> Result<CountrySeries, AppError> {
        let mut summed = vec![0.0; self.dates.len()];
        let mut found = false;

        for (country, values) in &self.rows {
            if country != name {
                continue;
            }
            found = true;
            for (total, v) in summed.iter_mut().zip(values) {
                *total += v;
            }
        }

        if !found {
            return Err(AppError::lookup(format!(
                "Country '{name}' not found in the case series; \
                 run `epi countries` to list known names."
            )));
        }

        CountrySeries::new(name, population, self.dates.clone(), summed)
    }
}

/// Parse the wide CSSE CSV into a [`ConfirmedTable`].
pub fn parse_confirmed_csv(text: &str) -> Result<ConfirmedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::lookup(format!("Failed to read case-series headers: {e}")))?
        .clone();

    let country_idx = headers
        .iter()
        .position(|h| normalize_header(h) == COUNTRY_COLUMN)
        .ok_or_else(|| AppError::lookup("Case series has no 'Country/Region' column."))?;

    // Date columns are recognized by parsing, not by position; anything that
    // isn't date-like (Lat, Long, Province/State, ...) is ignored.
    let mut date_columns: Vec<(usize, NaiveDate)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| parse_header_date(h).map(|d| (idx, d)))
        .collect();

    if date_columns.is_empty() {
        return Err(AppError::lookup(
            "Case series has no date-labeled columns.",
        ));
    }
    date_columns.sort_by_key(|(_, date)| *date);

    let dates: Vec<NaiveDate> = date_columns.iter().map(|(_, d)| *d).collect();

    let mut rows = Vec::new();
    let mut rows_skipped = 0usize;

    for result in reader.records() {
        let Ok(record) = result else {
            rows_skipped += 1;
            continue;
        };
        match parse_row(&record, country_idx, &date_columns) {
            Some(row) => rows.push(row),
            None => rows_skipped += 1,
        }
    }

    if rows.is_empty() {
        return Err(AppError::lookup("Case series contains no usable rows."));
    }

    Ok(ConfirmedTable {
        dates,
        rows,
        rows_skipped,
    })
}

fn parse_row(
    record: &StringRecord,
    country_idx: usize,
    date_columns: &[(usize, NaiveDate)],
) -> Option<(String, Vec<f64>)> {
    let country = record.get(country_idx)?.trim();
    if country.is_empty() {
        return None;
    }

    let mut values = Vec::with_capacity(date_columns.len());
    for (idx, _) in date_columns {
        let cell = record.get(*idx)?.trim();
        // Upstream occasionally leaves cells blank; treat those as zero
        // rather than dropping the whole row.
        let value = if cell.is_empty() {
            0.0
        } else {
            cell.parse::<f64>().ok().filter(|v| v.is_finite())?
        };
        values.push(value);
    }

    Some((country.to_string(), values))
}

fn normalize_header(name: &str) -> String {
    // Strip a potential UTF-8 BOM on the first header, then lowercase.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn parse_header_date(header: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(header.trim(), HEADER_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20
,Italy,41.87,12.57,0,2,5
New South Wales,Australia,-33.87,151.21,1,1,2
Victoria,Australia,-37.81,144.96,0,1,1
,\"Korea, South\",35.91,127.77,1,1,2
";

    #[test]
    fn parses_dates_and_sums_provinces() {
        let table = parse_confirmed_csv(SAMPLE).unwrap();

        assert_eq!(table.dates().len(), 3);
        assert_eq!(
            table.dates()[0],
            NaiveDate::from_ymd_opt(2020, 1, 22).unwrap()
        );

        let australia = table.country_series("Australia", 25_000_000).unwrap();
        assert_eq!(australia.confirmed, vec![1.0, 2.0, 3.0]);

        let italy = table.country_series("Italy", 60_000_000).unwrap();
        assert_eq!(italy.confirmed, vec![0.0, 2.0, 5.0]);
    }

    #[test]
    fn quoted_country_names_survive() {
        let table = parse_confirmed_csv(SAMPLE).unwrap();
        let korea = table.country_series("Korea, South", 51_000_000).unwrap();
        assert_eq!(korea.confirmed, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn unknown_country_is_a_lookup_error() {
        let table = parse_confirmed_csv(SAMPLE).unwrap();
        let err = table.country_series("Atlantis", 1).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn countries_are_sorted_and_unique() {
        let table = parse_confirmed_csv(SAMPLE).unwrap();
        assert_eq!(
            table.countries(),
            vec!["Australia", "Italy", "Korea, South"]
        );
    }

    #[test]
    fn missing_date_columns_is_an_error() {
        let err =
            parse_confirmed_csv("Province/State,Country/Region,Lat\n,Italy,41.87\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let csv = "\
Province/State,Country/Region,Lat,Long,1/22/20
,Italy,41.87,12.57,0
,Sweden,60.13,18.64,not-a-number
";
        let table = parse_confirmed_csv(csv).unwrap();
        assert_eq!(table.rows_skipped, 1);
        assert!(table.country_series("Italy", 1).is_ok());
        assert!(table.country_series("Sweden", 1).is_err());
    }

    #[test]
    fn blank_cells_read_as_zero() {
        let csv = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20
,Italy,41.87,12.57,,3
";
        let table = parse_confirmed_csv(csv).unwrap();
        let italy = table.country_series("Italy", 1).unwrap();
        assert_eq!(italy.confirmed, vec![0.0, 3.0]);
    }
}
