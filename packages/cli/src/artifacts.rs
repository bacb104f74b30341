//! JSON artifacts handed to the map renderer.
//!
//! Each subcommand writes one self-describing JSON document carrying
//! both the data and the parameters it was computed with, so the
//! renderer never has to guess which config produced a file.

use std::path::Path;

use outbreak_map_case_models::{
    CitySummary, DiseaseSummary, HeatLayer, Marker, OutbreakZone, TimeSeriesPoint,
};
use serde::Serialize;
use thiserror::Error;

/// Errors from writing an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Output file could not be written.
    #[error("I/O error writing {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Heat layer plus severity markers for the map view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapArtifact {
    /// Weighted heat layer.
    pub layer: HeatLayer,
    /// Severity-colored city markers.
    pub markers: Vec<Marker>,
}

/// Per-disease time series with spike annotations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsArtifact {
    /// Bucketing granularity the series was computed at.
    pub granularity: String,
    /// Baseline window in periods.
    pub window: usize,
    /// Spike threshold over the baseline.
    pub threshold: f64,
    /// Number of flagged periods across all diseases.
    pub spike_count: usize,
    /// The annotated series, ordered by disease then period.
    pub series: Vec<TimeSeriesPoint>,
}

/// Detected outbreak zones with the clustering parameters used.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutbreaksArtifact {
    /// Neighborhood radius in kilometers.
    pub eps_km: f64,
    /// Minimum summed case weight for a core point.
    pub min_cases: u64,
    /// The zones, in discovery order.
    pub zones: Vec<OutbreakZone>,
}

/// Per-disease and per-city rollups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryArtifact {
    /// Per-disease totals, sorted by descending case count.
    pub diseases: Vec<DiseaseSummary>,
    /// Per-city totals, sorted by descending case count.
    pub cities: Vec<CitySummary>,
}

/// Writes an artifact as pretty-printed JSON, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`ArtifactError`] if serialization or the write fails.
pub fn write_json<T: Serialize>(path: &Path, artifact: &T) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, json).map_err(io_err)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_keys_are_camel_case() {
        let artifact = OutbreaksArtifact {
            eps_km: 150.0,
            min_cases: 30,
            zones: vec![OutbreakZone {
                cluster_id: 0,
                latitude: 18.52,
                longitude: 73.85,
                total_cases: 45,
                localities: vec!["Pune".to_string()],
            }],
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert!(json.get("epsKm").is_some());
        assert!(json["zones"][0].get("clusterId").is_some());
        assert!(json["zones"][0].get("totalCases").is_some());
    }

    #[test]
    fn write_json_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("outbreak_map_artifacts_{}", std::process::id()));
        let path = dir.join("nested").join("summary.json");

        let artifact = SummaryArtifact {
            diseases: vec![],
            cities: vec![],
        };
        write_json(&path, &artifact).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"diseases\""));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
