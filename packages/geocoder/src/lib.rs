#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! City-level geocoding for outbreak map data.
//!
//! Resolution is a three-step read-through chain, cheapest first:
//!
//! 1. **Static table** — a compile-time embedded city → coordinates map
//!    (extendable from a JSON file) covering the common cities in the
//!    data sets.
//! 2. **Persisted cache** — a JSON file of previous lookups, including
//!    failed ones, so the same city is never re-queried across runs.
//! 3. **Nominatim / OpenStreetMap** — free structured search, strict
//!    rate limit (1 request per second for the public instance).
//!
//! Network lookups run in a single sequential loop with an explicit
//! delay between calls; the service enforces a global rate limit, so
//! parallelizing would gain nothing. A failed or timed-out lookup is a
//! per-location miss, never fatal to the run.

pub mod cache;
pub mod nominatim;
pub mod resolver;
pub mod static_table;

use thiserror::Error;

pub use cache::GeocodeCache;
pub use resolver::{Resolver, ResolverConfig, ResolveReport};

/// A successfully geocoded place.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Display name returned by the geocoder, if any.
    pub display_name: Option<String>,
}

/// A place to resolve, with all available context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlaceQuery {
    /// City name.
    pub city: String,
    /// State or province, if known (improves match accuracy).
    pub state: Option<String>,
    /// Country name.
    pub country: String,
}

impl PlaceQuery {
    /// Normalized cache key: `"city, state, country"` lowercased, state
    /// omitted when unknown.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut key = self.city.trim().to_lowercase();
        if let Some(state) = &self.state {
            key.push_str(", ");
            key.push_str(&state.trim().to_lowercase());
        }
        key.push_str(", ");
        key.push_str(&self.country.trim().to_lowercase());
        key
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (includes per-request timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Cache or static table file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache or static table file was not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_normalizes_case_and_whitespace() {
        let query = PlaceQuery {
            city: " Pune ".to_string(),
            state: Some("Maharashtra".to_string()),
            country: "India".to_string(),
        };
        assert_eq!(query.cache_key(), "pune, maharashtra, india");
    }

    #[test]
    fn cache_key_omits_missing_state() {
        let query = PlaceQuery {
            city: "Mumbai".to_string(),
            state: None,
            country: "India".to_string(),
        };
        assert_eq!(query.cache_key(), "mumbai, india");
    }
}
