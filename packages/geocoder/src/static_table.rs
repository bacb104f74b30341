//! Compile-time embedded city coordinate table.
//!
//! Covers the cities that appear in the bundled data sets so that typical
//! runs never need the network at all. Additional cities can be merged in
//! from a JSON file of the same shape: `{"city name": [lat, lon], ...}`,
//! keys lowercased.

use std::collections::BTreeMap;
use std::path::Path;

use crate::GeocodeError;

const BUILTIN_CITIES: &str = include_str!("../data/cities.json");

/// City name (lowercase) → `(lat, lon)`.
pub type CityTable = BTreeMap<String, (f64, f64)>;

/// Returns the embedded city table.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed (a compile-time guarantee,
/// exercised by tests).
#[must_use]
pub fn builtin() -> CityTable {
    parse(BUILTIN_CITIES).unwrap_or_else(|e| panic!("embedded city table is invalid: {e}"))
}

/// Loads a city table from a JSON file and merges it over the embedded
/// entries (file entries win).
///
/// # Errors
///
/// Returns [`GeocodeError`] if the file cannot be read or parsed.
pub fn load_merged(path: &Path) -> Result<CityTable, GeocodeError> {
    let raw = std::fs::read_to_string(path)?;
    let mut table = builtin();
    table.extend(parse(&raw)?);
    Ok(table)
}

fn parse(raw: &str) -> Result<CityTable, GeocodeError> {
    let entries: BTreeMap<String, [f64; 2]> = serde_json::from_str(raw)?;
    Ok(entries
        .into_iter()
        .map(|(city, [lat, lon])| (city.to_lowercase(), (lat, lon)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses() {
        let table = builtin();
        assert!(table.len() >= 20);
    }

    #[test]
    fn builtin_coordinates_are_in_range() {
        for (city, (lat, lon)) in &builtin() {
            assert!((-90.0..=90.0).contains(lat), "{city} latitude {lat}");
            assert!((-180.0..=180.0).contains(lon), "{city} longitude {lon}");
        }
    }

    #[test]
    fn builtin_keys_are_lowercase() {
        for city in builtin().keys() {
            assert_eq!(city, &city.to_lowercase());
        }
    }

    #[test]
    fn knows_pune() {
        let table = builtin();
        let (lat, lon) = table["pune"];
        assert!((lat - 18.5204).abs() < 1e-3);
        assert!((lon - 73.8567).abs() < 1e-3);
    }
}
