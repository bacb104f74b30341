//! Sequential place resolver: static table → cache → Nominatim.
//!
//! Network lookups run one at a time with an explicit delay before each
//! request. The public Nominatim instance enforces a global rate limit,
//! so there is nothing to gain from parallelism here.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::cache::{CacheLookup, GeocodeCache};
use crate::static_table::CityTable;
use crate::{GeocodeError, PlaceQuery, nominatim};

/// Configuration for the resolver's network behavior.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Nominatim search endpoint.
    pub base_url: String,
    /// Minimum delay between network requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Per-request timeout in milliseconds. On expiry the lookup counts
    /// as failed for that one place.
    pub timeout_ms: u64,
    /// When false, places not covered by the table or cache stay
    /// unresolved instead of hitting the network.
    pub use_network: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/search".to_string(),
            rate_limit_ms: 1_000,
            timeout_ms: 10_000,
            use_network: true,
        }
    }
}

/// Counts from one [`Resolver::resolve_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Resolved from the static city table.
    pub from_table: u64,
    /// Resolved from the persisted cache.
    pub from_cache: u64,
    /// Resolved via a network lookup this run.
    pub geocoded: u64,
    /// Left unresolved (not found, network error, or network disabled).
    pub unresolved: u64,
}

/// Read-through place resolver with a write-back cache.
pub struct Resolver {
    client: reqwest::Client,
    config: ResolverConfig,
    table: CityTable,
    cache: GeocodeCache,
}

impl Resolver {
    /// Builds a resolver over the given table and cache.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP client cannot be constructed.
    pub fn new(
        config: ResolverConfig,
        table: CityTable,
        cache: GeocodeCache,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent("outbreak-map/0.1")
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            config,
            table,
            cache,
        })
    }

    /// Resolves a batch of unique place queries.
    ///
    /// Returns coordinates keyed by [`PlaceQuery::cache_key`] plus a
    /// report of where each resolution came from. Unresolvable places are
    /// absent from the map; failures are logged, never fatal.
    pub async fn resolve_all(
        &mut self,
        queries: &[PlaceQuery],
    ) -> (BTreeMap<String, (f64, f64)>, ResolveReport) {
        let mut resolved = BTreeMap::new();
        let mut report = ResolveReport::default();

        for query in queries {
            let key = query.cache_key();
            if resolved.contains_key(&key) {
                continue;
            }

            if let Some(&(lat, lon)) = self.table.get(&query.city.trim().to_lowercase()) {
                resolved.insert(key, (lat, lon));
                report.from_table += 1;
                continue;
            }

            match self.cache.lookup(&key) {
                CacheLookup::Hit(lat, lon) => {
                    resolved.insert(key, (lat, lon));
                    report.from_cache += 1;
                    continue;
                }
                CacheLookup::KnownMiss => {
                    log::debug!("Cached miss for '{key}', skipping lookup");
                    report.unresolved += 1;
                    continue;
                }
                CacheLookup::Unknown => {}
            }

            if !self.config.use_network {
                log::debug!("Network disabled, leaving '{key}' unresolved");
                report.unresolved += 1;
                continue;
            }

            match self.geocode_one(query, &key).await {
                Some((lat, lon)) => {
                    resolved.insert(key, (lat, lon));
                    report.geocoded += 1;
                }
                None => report.unresolved += 1,
            }
        }

        (resolved, report)
    }

    /// One rate-limited network lookup. Not-found results are cached;
    /// transient errors are not, so they retry on the next run.
    async fn geocode_one(&mut self, query: &PlaceQuery, key: &str) -> Option<(f64, f64)> {
        tokio::time::sleep(Duration::from_millis(self.config.rate_limit_ms)).await;

        match nominatim::geocode_place(&self.client, &self.config.base_url, query).await {
            Ok(Some(place)) => {
                self.cache
                    .insert_hit(key.to_string(), place.latitude, place.longitude);
                Some((place.latitude, place.longitude))
            }
            Ok(None) => {
                log::warn!("Could not geocode '{key}'");
                self.cache.insert_miss(key.to_string());
                None
            }
            Err(GeocodeError::RateLimited) => {
                log::warn!("Rate limited by Nominatim while resolving '{key}', backing off 60s");
                tokio::time::sleep(Duration::from_secs(60)).await;
                None
            }
            Err(e) => {
                log::warn!("Geocoding error for '{key}': {e}");
                None
            }
        }
    }

    /// Writes the cache back to disk.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the cache file cannot be written.
    pub fn save_cache(&mut self) -> Result<(), GeocodeError> {
        self.cache.save()
    }

    /// Number of entries currently in the cache.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_table;

    fn offline_resolver() -> Resolver {
        let config = ResolverConfig {
            use_network: false,
            ..ResolverConfig::default()
        };
        let cache = GeocodeCache::open(
            &std::env::temp_dir().join(format!("outbreak_map_resolver_{}", std::process::id())),
        )
        .unwrap();
        Resolver::new(config, static_table::builtin(), cache).unwrap()
    }

    fn query(city: &str) -> PlaceQuery {
        PlaceQuery {
            city: city.to_string(),
            state: None,
            country: "India".to_string(),
        }
    }

    #[tokio::test]
    async fn resolves_from_static_table_without_network() {
        let mut resolver = offline_resolver();
        let (resolved, report) = resolver.resolve_all(&[query("Pune")]).await;
        assert_eq!(report.from_table, 1);
        assert_eq!(report.unresolved, 0);
        let (lat, _) = resolved["pune, india"];
        assert!((lat - 18.5204).abs() < 1e-3);
    }

    #[tokio::test]
    async fn unknown_city_stays_unresolved_offline() {
        let mut resolver = offline_resolver();
        let (resolved, report) = resolver.resolve_all(&[query("Atlantis")]).await;
        assert!(resolved.is_empty());
        assert_eq!(report.unresolved, 1);
    }

    #[tokio::test]
    async fn cached_miss_is_not_retried() {
        let mut resolver = offline_resolver();
        resolver.cache.insert_miss("atlantis, india".to_string());
        let (_, report) = resolver.resolve_all(&[query("Atlantis")]).await;
        assert_eq!(report.unresolved, 1);
        assert_eq!(report.geocoded, 0);
    }

    #[tokio::test]
    async fn duplicate_queries_resolve_once() {
        let mut resolver = offline_resolver();
        let (resolved, report) = resolver
            .resolve_all(&[query("Pune"), query("Pune")])
            .await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(report.from_table, 1);
    }
}
