#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading, validation, and geocoding of raw disease case records.
//!
//! The ingest path is: load delimited or JSON input into permissive raw
//! rows, clean and coerce them into [`CaseRecord`]s (dropping bad rows
//! with per-reason counts), then resolve coordinates for records that
//! are missing them. Only schema-level problems — a required column
//! absent from the whole input — abort the run; everything else is a
//! per-row skip.

pub mod clean;
pub mod loader;

use outbreak_map_case_models::CaseRecord;
use outbreak_map_geocoder::{PlaceQuery, Resolver, ResolveReport};
use thiserror::Error;

pub use clean::{CleanReport, clean_records};
pub use loader::load_records;

/// Errors from loading and validating input data.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// CSV reader failed (malformed file, not a malformed row).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON document failed to parse.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input extension is neither `.csv` nor `.json`.
    #[error("Unsupported input format: .{extension} (expected .csv or .json)")]
    UnsupportedFormat {
        /// The unsupported extension.
        extension: String,
    },

    /// A required column is missing from the entire input. Fatal for the
    /// whole batch, reported before any aggregation.
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns {
        /// Names of the absent required columns.
        missing: Vec<String>,
    },
}

/// Counts from one [`geocode_missing`] pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeocodeSummary {
    /// Rows that received coordinates this pass.
    pub resolved_rows: u64,
    /// Rows still without coordinates (excluded from geospatial
    /// artifacts, still counted in non-geo aggregations).
    pub unresolved_rows: u64,
    /// Where the unique-place resolutions came from.
    pub report: ResolveReport,
}

/// Fills in coordinates for records that are missing them.
///
/// Unique `(city, state)` pairs are resolved once through the resolver's
/// table → cache → network chain and the results are written back onto
/// every matching record. Unresolved places are logged and skipped.
pub async fn geocode_missing(
    records: &mut [CaseRecord],
    resolver: &mut Resolver,
    country: &str,
) -> GeocodeSummary {
    let mut queries: Vec<PlaceQuery> = records
        .iter()
        .filter(|r| !r.has_valid_coordinates())
        .map(|r| PlaceQuery {
            city: r.city.clone(),
            state: r.state.clone(),
            country: country.to_string(),
        })
        .collect();
    queries.sort();
    queries.dedup();

    if queries.is_empty() {
        return GeocodeSummary::default();
    }

    log::info!("Resolving coordinates for {} unique place(s)...", queries.len());
    let (resolved, report) = resolver.resolve_all(&queries).await;

    let mut summary = GeocodeSummary {
        report,
        ..GeocodeSummary::default()
    };

    for record in records.iter_mut() {
        if record.has_valid_coordinates() {
            continue;
        }
        let key = PlaceQuery {
            city: record.city.clone(),
            state: record.state.clone(),
            country: country.to_string(),
        }
        .cache_key();

        if let Some(&(lat, lon)) = resolved.get(&key) {
            record.latitude = Some(lat);
            record.longitude = Some(lon);
            summary.resolved_rows += 1;
        } else {
            summary.unresolved_rows += 1;
        }
    }

    log::info!(
        "Geocoding: {} row(s) resolved, {} left without coordinates \
         (table {}, cache {}, network {}, unresolved {})",
        summary.resolved_rows,
        summary.unresolved_rows,
        summary.report.from_table,
        summary.report.from_cache,
        summary.report.geocoded,
        summary.report.unresolved,
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_map_geocoder::{GeocodeCache, ResolverConfig, static_table};

    fn record(city: &str, lat: Option<f64>, lon: Option<f64>) -> CaseRecord {
        CaseRecord {
            disease: "Dengue".to_string(),
            locality: None,
            city: city.to_string(),
            state: None,
            latitude: lat,
            longitude: lon,
            date: None,
            cases: 1,
        }
    }

    fn offline_resolver() -> Resolver {
        let config = ResolverConfig {
            use_network: false,
            ..ResolverConfig::default()
        };
        let cache = GeocodeCache::open(
            &std::env::temp_dir().join(format!("outbreak_map_ingest_{}", std::process::id())),
        )
        .unwrap();
        Resolver::new(config, static_table::builtin(), cache).unwrap()
    }

    #[tokio::test]
    async fn fills_missing_coordinates_from_table() {
        let mut records = vec![
            record("Pune", None, None),
            record("Pune", None, None),
            record("Mumbai", Some(19.0), Some(72.8)),
        ];
        let mut resolver = offline_resolver();
        let summary = geocode_missing(&mut records, &mut resolver, "India").await;

        assert_eq!(summary.resolved_rows, 2);
        assert_eq!(summary.unresolved_rows, 0);
        assert_eq!(summary.report.from_table, 1);
        assert!(records[0].has_valid_coordinates());
        assert!(records[1].has_valid_coordinates());
    }

    #[tokio::test]
    async fn unresolved_rows_are_counted_not_fatal() {
        let mut records = vec![record("Atlantis", None, None)];
        let mut resolver = offline_resolver();
        let summary = geocode_missing(&mut records, &mut resolver, "India").await;

        assert_eq!(summary.resolved_rows, 0);
        assert_eq!(summary.unresolved_rows, 1);
        assert!(!records[0].has_valid_coordinates());
    }

    #[tokio::test]
    async fn no_queries_when_all_rows_have_coordinates() {
        let mut records = vec![record("Pune", Some(18.5), Some(73.9))];
        let mut resolver = offline_resolver();
        let summary = geocode_missing(&mut records, &mut resolver, "India").await;
        assert_eq!(summary.resolved_rows, 0);
        assert_eq!(summary.unresolved_rows, 0);
    }
}
