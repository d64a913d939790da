//! In-memory disaster dataset and the two read-only queries served from it.
//!
//! The dataset is loaded once from the cleaned CSV produced by [`crate::etl`]
//! and never mutated afterwards, so it can be shared behind an `Arc` by any
//! number of concurrent readers.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use crate::error::{DatasetError, QueryError};

/// One row of the cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterRecord {
    pub year: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub deaths: u64,
}

/// Row shape as it sits on disk. Every column is optional so that missing
/// cells become a row-level error instead of a CSV decode failure.
#[derive(Debug, Deserialize)]
struct CsvRow {
    year: Option<i32>,
    #[serde(rename = "type")]
    kind: Option<String>,
    country: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    deaths: Option<f64>,
}

impl CsvRow {
    fn into_record(self, row: usize) -> Result<DisasterRecord, DatasetError> {
        let missing = |field: &str| DatasetError::InvalidRow {
            row,
            reason: format!("missing {}", field),
        };

        let kind = self.kind.filter(|s| !s.trim().is_empty()).ok_or_else(|| missing("type"))?;
        let country = self
            .country
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| missing("country"))?;

        let deaths = self.deaths.unwrap_or(0.0);
        if deaths < 0.0 || !deaths.is_finite() {
            return Err(DatasetError::InvalidRow {
                row,
                reason: format!("deaths must be a non-negative number, got {}", deaths),
            });
        }

        Ok(DisasterRecord {
            year: self.year.ok_or_else(|| missing("year"))?,
            kind,
            country,
            lat: self.lat.ok_or_else(|| missing("lat"))?,
            lon: self.lon.ok_or_else(|| missing("lon"))?,
            deaths: deaths as u64,
        })
    }
}

/// Immutable collection of disaster records in their original file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<DisasterRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<DisasterRecord>) -> Self {
        Self { records }
    }

    /// Load the cleaned CSV at `path`.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::Missing(path.display().to_string()));
        }
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;

        tracing::info!(
            path = %path.display(),
            records = dataset.len(),
            "Loaded disaster dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut records = Vec::new();
        for (idx, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
            records.push(row?.into_record(idx + 1)?);
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DisasterRecord] {
        &self.records
    }

    /// Record with the highest death toll in `year`. On a tie the earliest
    /// row in file order wins.
    pub fn deadliest_record(&self, year: i32) -> Option<&DisasterRecord> {
        self.records
            .iter()
            .filter(|r| r.year == year)
            .fold(None, |best: Option<&DisasterRecord>, r| match best {
                Some(b) if b.deaths >= r.deaths => Some(b),
                _ => Some(r),
            })
    }

    pub fn deadliest_in_year(&self, year: i32) -> Result<String, QueryError> {
        let record = self
            .deadliest_record(year)
            .ok_or_else(|| QueryError::NotFound("Information not available!".to_string()))?;

        Ok(format!(
            "The deadliest disaster in {} was {} in {} with a number of {} deaths",
            year,
            record.kind.to_lowercase(),
            record.country,
            record.deaths
        ))
    }

    /// Number of records whose type and country contain the given substrings
    /// (case-insensitive) and whose year lies in `[start, end]`.
    pub fn count_matching(&self, kind: &str, country: &str, start: i32, end: i32) -> usize {
        let kind = kind.to_lowercase();
        let country = country.to_lowercase();

        self.records
            .iter()
            .filter(|r| {
                (start..=end).contains(&r.year)
                    && r.kind.to_lowercase().contains(&kind)
                    && r.country.to_lowercase().contains(&country)
            })
            .count()
    }

    pub fn count_events(&self, kind: &str, country: &str, start: i32, end: i32) -> String {
        let count = self.count_matching(kind, country, start, end);
        format!(
            "{} {} events were recorded in {} from {} to {}",
            count, kind, country, start, end
        )
    }
}
