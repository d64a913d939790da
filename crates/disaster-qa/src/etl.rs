//! Raw-to-clean transform for the disaster CSV.
//!
//! Keeps the six columns the query pipeline needs, renames them, drops rows
//! that cannot satisfy the dataset invariants and appends a lowercase
//! `search_key` column.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::DatasetError;

/// Raw columns the transform reads. All must be present in the header.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Year",
    "Disaster Type",
    "Country",
    "Latitude",
    "Longitude",
    "Total Deaths",
];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Year")]
    year: Option<f64>,
    #[serde(rename = "Disaster Type")]
    kind: Option<String>,
    #[serde(rename = "Country")]
    country: Option<String>,
    #[serde(rename = "Latitude")]
    lat: Option<f64>,
    #[serde(rename = "Longitude")]
    lon: Option<f64>,
    #[serde(rename = "Total Deaths")]
    deaths: Option<f64>,
}

/// Output row, column order matches the cleaned file header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRow {
    pub year: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub deaths: u64,
    pub search_key: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EtlReport {
    pub rows_read: usize,
    pub rows_written: usize,
}

impl EtlReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_written
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn clean(raw: RawRow) -> Option<CleanRow> {
    let year = raw.year.filter(|y| y.is_finite())?;
    let lat = raw.lat.filter(|v| v.is_finite())?;
    let lon = raw.lon.filter(|v| v.is_finite())?;
    let kind = non_blank(raw.kind)?;
    let country = non_blank(raw.country)?;
    let deaths = raw.deaths.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);

    Some(CleanRow {
        year: year as i32,
        search_key: format!("{} {}", country.to_lowercase(), kind.to_lowercase()),
        kind,
        country,
        lat,
        lon,
        deaths: deaths as u64,
    })
}

/// Stream rows from `input` to `output`, returning how many were kept.
pub fn transform<R: Read, W: Write>(input: R, output: W) -> Result<EtlReport, DatasetError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);

    let headers = reader.headers()?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns(missing));
    }

    let mut writer = csv::Writer::from_writer(output);
    let mut report = EtlReport::default();

    for row in reader.deserialize::<RawRow>() {
        report.rows_read += 1;
        if let Some(clean_row) = clean(row?) {
            writer.serialize(&clean_row)?;
            report.rows_written += 1;
        }
    }
    writer.flush()?;
    Ok(report)
}

pub fn run(raw_csv: &Path, clean_csv: &Path) -> Result<EtlReport, DatasetError> {
    if !raw_csv.exists() {
        return Err(DatasetError::Missing(format!(
            "{} (download the raw disaster CSV and place it there)",
            raw_csv.display()
        )));
    }
    let parent = clean_csv
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    // The previous dataset is only replaced once the whole transform succeeded.
    let input = std::fs::File::open(raw_csv)?;
    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    let report = transform(input, staged.as_file_mut())?;
    staged.persist(clean_csv).map_err(|e| DatasetError::Io(e.error))?;

    tracing::info!(
        raw = %raw_csv.display(),
        clean = %clean_csv.display(),
        read = report.rows_read,
        written = report.rows_written,
        dropped = report.rows_dropped(),
        "ETL finished"
    );
    Ok(report)
}
