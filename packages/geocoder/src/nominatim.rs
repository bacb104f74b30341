//! Nominatim / OpenStreetMap geocoder client.
//!
//! Used as the last fallback when neither the static table nor the cache
//! resolves a city. Nominatim has strict rate limits: **1 request per
//! second** maximum for the public instance.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::{GeocodeError, GeocodedPlace, PlaceQuery};

/// Geocodes a single place using the Nominatim structured search endpoint.
///
/// The caller is responsible for rate limiting (see `rate_limit_ms` in
/// [`crate::ResolverConfig`]).
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_place(
    client: &reqwest::Client,
    base_url: &str,
    query: &PlaceQuery,
) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let mut params = vec![
        ("city", query.city.clone()),
        ("country", query.country.clone()),
        ("format", "jsonv2".to_string()),
        ("limit", "1".to_string()),
    ];
    if let Some(state) = &query.state {
        params.push(("state", state.clone()));
    }

    let resp = client.get(base_url).query(&params).send().await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Parses a Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    let display_name = first["display_name"].as_str().map(String::from);

    Ok(Some(GeocodedPlace {
        latitude: lat,
        longitude: lon,
        display_name,
    }))
}
