//! Persisted geocoding cache.
//!
//! A JSON file mapping place keys to coordinates, shared across runs.
//! Caches both successful lookups (with coordinates) and failed ones
//! (`null`) so we never re-query the same place against the network.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::GeocodeError;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheLookup {
    /// The place has cached coordinates.
    Hit(f64, f64),
    /// The place was looked up before and not found.
    KnownMiss,
    /// The place has never been looked up.
    Unknown,
}

/// Read-through, write-back geocode cache backed by a JSON file.
#[derive(Debug)]
pub struct GeocodeCache {
    path: PathBuf,
    entries: BTreeMap<String, Option<(f64, f64)>>,
    dirty: bool,
}

impl GeocodeCache {
    /// Opens the cache at `path`, starting empty if the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if an existing file cannot be read or
    /// parsed.
    pub fn open(path: &Path) -> Result<Self, GeocodeError> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let parsed: BTreeMap<String, Option<[f64; 2]>> = serde_json::from_str(&raw)?;
            parsed
                .into_iter()
                .map(|(k, v)| (k, v.map(|[lat, lon]| (lat, lon))))
                .collect()
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        })
    }

    /// Looks up a place key.
    #[must_use]
    pub fn lookup(&self, key: &str) -> CacheLookup {
        match self.entries.get(key) {
            Some(Some((lat, lon))) => CacheLookup::Hit(*lat, *lon),
            Some(None) => CacheLookup::KnownMiss,
            None => CacheLookup::Unknown,
        }
    }

    /// Records a successful lookup.
    pub fn insert_hit(&mut self, key: String, lat: f64, lon: f64) {
        self.entries.insert(key, Some((lat, lon)));
        self.dirty = true;
    }

    /// Records a not-found result so the place is not re-queried.
    pub fn insert_miss(&mut self, key: String) {
        self.entries.insert(key, None);
        self.dirty = true;
    }

    /// Number of cached entries (hits and misses).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the cache back to its file if anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the directory cannot be created or the
    /// file cannot be written.
    pub fn save(&mut self) -> Result<(), GeocodeError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let serializable: BTreeMap<&String, Option<[f64; 2]>> = self
            .entries
            .iter()
            .map(|(k, v)| (k, v.map(|(lat, lon)| [lat, lon])))
            .collect();
        let raw = serde_json::to_string_pretty(&serializable)?;
        std::fs::write(&self.path, raw)?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("outbreak_map_cache_{name}_{}", std::process::id()))
    }

    #[test]
    fn missing_file_starts_empty() {
        let cache = GeocodeCache::open(&temp_path("missing")).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup("pune, india"), CacheLookup::Unknown);
    }

    #[test]
    fn roundtrips_hits_and_misses() {
        let path = temp_path("roundtrip");
        let mut cache = GeocodeCache::open(&path).unwrap();
        cache.insert_hit("pune, india".to_string(), 18.52, 73.85);
        cache.insert_miss("atlantis, india".to_string());
        cache.save().unwrap();

        let reloaded = GeocodeCache::open(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.lookup("pune, india"),
            CacheLookup::Hit(18.52, 73.85)
        );
        assert_eq!(
            reloaded.lookup("atlantis, india"),
            CacheLookup::KnownMiss
        );

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_is_noop_when_clean() {
        let path = temp_path("noop");
        let mut cache = GeocodeCache::open(&path).unwrap();
        cache.save().unwrap();
        assert!(!path.exists());
    }
}
