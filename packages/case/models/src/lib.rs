#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Core value types shared across the outbreak-map pipeline.
//!
//! Defines the canonical case record, the aggregation and time-series
//! result types consumed by the renderer boundary, and the ordered
//! severity scale used to color map markers. All entities are value
//! objects created and consumed within a single pipeline run; there is
//! no persistent store and no cross-run identity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub mod severity;

pub use severity::{ScaleError, SeverityBand, SeverityScale};

/// One observed disease case row.
///
/// The `cases` field is a pre-aggregated weight: a row describing a single
/// case carries `cases = 1`, and the aggregator always sums weights. Plain
/// row counting is therefore the degenerate case of the weighted sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    /// Disease name (title-cased by the cleaner, e.g. "Dengue").
    pub disease: String,
    /// Neighborhood or area within the city, if known.
    pub locality: Option<String>,
    /// City name (title-cased by the cleaner).
    pub city: String,
    /// State or province name, if known.
    pub state: Option<String>,
    /// Latitude (WGS84). Present only together with `longitude`.
    pub latitude: Option<f64>,
    /// Longitude (WGS84). Present only together with `latitude`.
    pub longitude: Option<f64>,
    /// Occurrence date, if known.
    pub date: Option<NaiveDate>,
    /// Case-count weight, always >= 1.
    pub cases: u64,
}

impl CaseRecord {
    /// Returns `(latitude, longitude)` when both coordinates are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Whether both coordinates are present and inside valid WGS84 ranges.
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.coordinates()
            .is_some_and(|(lat, lon)| (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon))
    }
}

/// Granularity for time-series bucketing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeGranularity {
    /// ISO weeks, labeled by the Monday of the week.
    Weekly,
    /// Calendar months, labeled `YYYY-MM`.
    Monthly,
}

/// A `(location, disease, time-bucket)` group with its summed case count.
///
/// Uniquely keyed by `(disease, city, locality, period)`. Coordinates are
/// the first seen for the key and are `None` when no member row carried
/// any (e.g. geocoding failed for the location).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    /// Disease name.
    pub disease: String,
    /// City name.
    pub city: String,
    /// Locality within the city, when it was part of the grouping key.
    pub locality: Option<String>,
    /// Period label (e.g. "2025-01" or "2025-01-13"), when bucketed.
    pub period: Option<String>,
    /// Summed case weight for this key.
    pub count: u64,
    /// Representative latitude for the location, if known.
    pub latitude: Option<f64>,
    /// Representative longitude for the location, if known.
    pub longitude: Option<f64>,
}

impl AggregatedPoint {
    /// Returns `(latitude, longitude)` when both coordinates are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// One period of a per-disease time series with spike annotations.
///
/// Derived entirely from [`AggregatedPoint`]s by the spike detector and
/// recomputed fully on each pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Disease name.
    pub disease: String,
    /// Period label (start of week or month).
    pub period: String,
    /// Case count in this period.
    pub cases: u64,
    /// Trailing mean of the previous periods; `None` for the first period.
    pub baseline: Option<f64>,
    /// Trailing moving average including the current period (chart overlay).
    pub moving_avg: f64,
    /// Whether this period exceeds `baseline * threshold`.
    pub is_spike: bool,
    /// Percent change vs the previous period; 0 when undefined.
    pub pct_change: f64,
}

/// A detected outbreak zone: a dense cluster of case-weighted locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutbreakZone {
    /// Cluster identifier, assigned in discovery order starting at 0.
    pub cluster_id: usize,
    /// Case-weighted centroid latitude.
    pub latitude: f64,
    /// Case-weighted centroid longitude.
    pub longitude: f64,
    /// Total case weight across member locations.
    pub total_cases: u64,
    /// Cities and localities covered by the zone, sorted.
    pub localities: Vec<String>,
}

/// One weighted heat-layer point: `[lat, lon, weight]`.
pub type HeatPoint = [f64; 3];

/// A color stop for the heat-layer gradient, offset in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientStop {
    /// Position along the gradient, 0.0 = lightest, 1.0 = hottest.
    pub offset: f64,
    /// CSS color name or hex value.
    pub color: String,
}

/// The weighted heat layer handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatLayer {
    /// Gradient stops for intensity coloring.
    pub gradient: Vec<GradientStop>,
    /// Largest point weight, for renderer-side normalization.
    pub max_weight: u64,
    /// Weighted points, one per geolocated aggregation key.
    pub points: Vec<HeatPoint>,
}

/// Per-disease share of a marker's case count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseCount {
    /// Disease name.
    pub disease: String,
    /// Case count for this disease at the marker location.
    pub count: u64,
}

/// A severity-colored location marker for the map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// City name.
    pub city: String,
    /// Marker latitude.
    pub latitude: f64,
    /// Marker longitude.
    pub longitude: f64,
    /// Total case count at this location.
    pub cases: u64,
    /// Severity color from the configured scale.
    pub color: String,
    /// Severity label from the configured scale.
    pub label: String,
    /// Per-disease breakdown, sorted by descending count.
    pub by_disease: Vec<DiseaseCount>,
}

/// Per-disease rollup across all locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseSummary {
    /// Disease name.
    pub disease: String,
    /// Total case weight across all locations.
    pub total_cases: u64,
    /// Number of distinct locations reporting this disease.
    pub locations: u64,
    /// Mean case weight per reporting location.
    pub avg_per_location: f64,
    /// Largest case weight at any single location.
    pub max_in_one_location: u64,
}

/// Per-city rollup across all diseases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySummary {
    /// City name.
    pub city: String,
    /// Total case weight across all diseases.
    pub total_cases: u64,
    /// Number of distinct diseases reported in the city.
    pub diseases: u64,
}
