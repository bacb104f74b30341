#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analytical core of the outbreak-map pipeline.
//!
//! Consumes cleaned [`outbreak_map_case_models::CaseRecord`]s and
//! produces the renderer-boundary artifacts: aggregated counts, the
//! weighted heat layer with severity-colored markers, per-disease time
//! series with spike flags, outbreak-zone clusters, and summary rollups.
//!
//! Everything here is pure, synchronous, and deterministic: grouping
//! uses ordered maps, so the same input always yields the same output
//! in the same order.

pub mod aggregate;
pub mod cluster;
pub mod detect;
pub mod heat;
pub mod summary;

use thiserror::Error;

pub use aggregate::{GroupOptions, aggregate, city_totals};
pub use cluster::{ClusterConfig, detect_outbreak_zones};
pub use detect::{DetectorConfig, detect_spikes};
pub use heat::{build_heat_layer, build_markers};
pub use summary::{city_summary, disease_summary};

/// Errors from the analytical stages.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// No input record carries both a disease and a location identifier.
    /// This is a configuration problem with the input, fatal for the
    /// whole batch, not a per-record skip.
    #[error("no record carries both a disease and a city; nothing to aggregate")]
    MissingGroupKeys,
}
