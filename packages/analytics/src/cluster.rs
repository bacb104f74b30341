//! Outbreak-zone detection via case-weighted density clustering.
//!
//! A DBSCAN variant over aggregated locations where the case count acts
//! as the point weight: a location is a core point when the summed case
//! weight within `eps_km` (itself included) reaches `min_cases`.
//! Clusters grow outward from core points; locations reachable from a
//! core join its cluster; everything else is noise and is dropped.
//!
//! Working on aggregated locations keeps the neighbor scan at O(n²) in
//! the number of *locations*, never in the number of cases.

use std::collections::BTreeSet;

use outbreak_map_case_models::{AggregatedPoint, OutbreakZone};
use serde::Deserialize;

/// Outbreak clustering parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClusterConfig {
    /// Neighborhood radius in kilometers.
    #[serde(default = "default_eps_km")]
    pub eps_km: f64,
    /// Minimum summed case weight in a neighborhood for a core point.
    #[serde(default = "default_min_cases")]
    pub min_cases: u64,
}

const fn default_eps_km() -> f64 {
    150.0
}

const fn default_min_cases() -> u64 {
    30
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            eps_km: default_eps_km(),
            min_cases: default_min_cases(),
        }
    }
}

struct Site {
    lat: f64,
    lon: f64,
    weight: u64,
    labels: BTreeSet<String>,
}

/// Detects outbreak zones among geolocated aggregated points.
///
/// Points sharing coordinates are merged (weights summed) before
/// clustering; points without coordinates are ignored.
#[must_use]
pub fn detect_outbreak_zones(
    points: &[AggregatedPoint],
    config: ClusterConfig,
) -> Vec<OutbreakZone> {
    let sites = merge_sites(points);
    if sites.is_empty() {
        return Vec::new();
    }

    let neighbors: Vec<Vec<usize>> = (0..sites.len())
        .map(|i| {
            (0..sites.len())
                .filter(|&j| {
                    haversine_km(sites[i].lat, sites[i].lon, sites[j].lat, sites[j].lon)
                        <= config.eps_km
                })
                .collect()
        })
        .collect();

    let is_core: Vec<bool> = neighbors
        .iter()
        .map(|ns| ns.iter().map(|&j| sites[j].weight).sum::<u64>() >= config.min_cases)
        .collect();

    let mut assignment: Vec<Option<usize>> = vec![None; sites.len()];
    let mut zones = Vec::new();

    for start in 0..sites.len() {
        if assignment[start].is_some() || !is_core[start] {
            continue;
        }

        let cluster_id = zones.len();
        let mut members = Vec::new();
        let mut queue = vec![start];
        assignment[start] = Some(cluster_id);

        while let Some(i) = queue.pop() {
            members.push(i);
            if !is_core[i] {
                continue; // border point: joins but does not expand
            }
            for &j in &neighbors[i] {
                if assignment[j].is_none() {
                    assignment[j] = Some(cluster_id);
                    queue.push(j);
                }
            }
        }

        zones.push(build_zone(cluster_id, &members, &sites));
    }

    log::info!("Detected {} outbreak zone(s)", zones.len());
    zones
}

fn merge_sites(points: &[AggregatedPoint]) -> Vec<Site> {
    let mut sites: Vec<Site> = Vec::new();

    for point in points {
        let Some((lat, lon)) = point.coordinates() else {
            continue;
        };
        let label = point
            .locality
            .clone()
            .unwrap_or_else(|| point.city.clone());

        if let Some(site) = sites
            .iter_mut()
            .find(|s| s.lat.to_bits() == lat.to_bits() && s.lon.to_bits() == lon.to_bits())
        {
            site.weight += point.count;
            site.labels.insert(label);
        } else {
            sites.push(Site {
                lat,
                lon,
                weight: point.count,
                labels: BTreeSet::from([label]),
            });
        }
    }

    sites
}

#[allow(clippy::cast_precision_loss)]
fn build_zone(cluster_id: usize, members: &[usize], sites: &[Site]) -> OutbreakZone {
    let total: u64 = members.iter().map(|&i| sites[i].weight).sum();
    let total_f = total as f64;

    let (lat_sum, lon_sum) = members.iter().fold((0.0, 0.0), |(lat, lon), &i| {
        let w = sites[i].weight as f64;
        (lat + sites[i].lat * w, lon + sites[i].lon * w)
    });

    let localities: Vec<String> = members
        .iter()
        .flat_map(|&i| sites[i].labels.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    OutbreakZone {
        cluster_id,
        latitude: lat_sum / total_f,
        longitude: lon_sum / total_f,
        total_cases: total,
        localities,
    }
}

/// Great-circle distance between two points in kilometers.
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}
