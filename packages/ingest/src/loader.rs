//! Input loaders for delimited and JSON case data.
//!
//! Both loaders produce permissive [`RawRecord`]s: every field optional,
//! coercion and validation deferred to [`crate::clean`]. A row that
//! cannot even be deserialized (e.g. text in a numeric column) is logged
//! and counted, not fatal. Missing *columns* are another matter: the
//! required `disease` and `city` columns must exist in the CSV header,
//! otherwise the whole batch is rejected up front.

use std::path::Path;

use serde::Deserialize;

use crate::IngestError;

/// Columns that must be present in every input.
pub const REQUIRED_COLUMNS: &[&str] = &["disease", "city"];

/// One raw input row before cleaning. Field aliases cover the column
/// spellings seen across the source data sets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    /// Disease name.
    #[serde(default)]
    pub disease: Option<String>,
    /// City name.
    #[serde(default)]
    pub city: Option<String>,
    /// Neighborhood / area within the city.
    #[serde(default, alias = "area")]
    pub locality: Option<String>,
    /// State or province.
    #[serde(default)]
    pub state: Option<String>,
    /// Latitude.
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    /// Longitude.
    #[serde(default, alias = "lon", alias = "lng")]
    pub longitude: Option<f64>,
    /// Occurrence date as text; parsed by the cleaner.
    #[serde(default)]
    pub date: Option<String>,
    /// Case-count weight.
    #[serde(default, alias = "case_count")]
    pub cases: Option<u64>,
}

/// Loads raw records from a `.csv` or `.json` file, dispatching on the
/// extension.
///
/// Returns the rows plus a count of rows that failed to deserialize.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read, the format is
/// unsupported, or a required column is missing from a CSV header.
pub fn load_records(path: &Path) -> Result<(Vec<RawRecord>, u64), IngestError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    match extension.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        _ => Err(IngestError::UnsupportedFormat { extension }),
    }
}

fn load_csv(path: &Path) -> Result<(Vec<RawRecord>, u64), IngestError> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| (*col).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns { missing });
    }

    let mut records = Vec::new();
    let mut malformed: u64 = 0;

    for (i, row) in reader.deserialize::<RawRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("Skipping malformed row {}: {e}", i + 2);
                malformed += 1;
            }
        }
    }

    log::info!(
        "Loaded {} record(s) from {} ({malformed} malformed)",
        records.len(),
        path.display()
    );
    Ok((records, malformed))
}

fn load_json(path: &Path) -> Result<(Vec<RawRecord>, u64), IngestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let records: Vec<RawRecord> = serde_json::from_str(&raw)?;
    log::info!("Loaded {} record(s) from {}", records.len(), path.display());
    Ok((records, 0))
}
