//! Heat-layer and marker construction for the map renderer.
//!
//! The heat layer carries one `[lat, lon, weight]` triple per geolocated
//! aggregation key, with the case count as the intensity weight — points
//! are never duplicated to fake intensity. Markers collapse locations
//! across diseases and are colored by the configured severity scale.

use std::collections::BTreeMap;

use outbreak_map_case_models::{
    AggregatedPoint, DiseaseCount, GradientStop, HeatLayer, Marker, SeverityScale,
};

/// Builds the weighted heat layer from aggregated points.
///
/// Points without coordinates are skipped; they still exist in non-geo
/// artifacts (time series, summaries).
#[must_use]
pub fn build_heat_layer(points: &[AggregatedPoint], gradient: &[GradientStop]) -> HeatLayer {
    let mut heat_points = Vec::new();
    let mut max_weight: u64 = 0;

    for point in points {
        let Some((lat, lon)) = point.coordinates() else {
            continue;
        };
        #[allow(clippy::cast_precision_loss)]
        heat_points.push([lat, lon, point.count as f64]);
        max_weight = max_weight.max(point.count);
    }

    HeatLayer {
        gradient: gradient.to_vec(),
        max_weight,
        points: heat_points,
    }
}

/// Builds severity-colored markers, one per geolocated city.
///
/// The marker's case count is the city total across diseases; the
/// breakdown lists diseases by descending count, name as tiebreaker.
#[must_use]
pub fn build_markers(points: &[AggregatedPoint], scale: &SeverityScale) -> Vec<Marker> {
    let mut cities: BTreeMap<&str, ((f64, f64), u64, BTreeMap<&str, u64>)> = BTreeMap::new();

    for point in points {
        let Some(coords) = point.coordinates() else {
            continue;
        };
        let entry = cities
            .entry(&point.city)
            .or_insert((coords, 0, BTreeMap::new()));
        entry.1 += point.count;
        if !point.disease.is_empty() {
            *entry.2.entry(&point.disease).or_insert(0) += point.count;
        }
    }

    cities
        .into_iter()
        .map(|(city, ((lat, lon), cases, diseases))| {
            let (color, label) = scale.classify(cases);

            let mut by_disease: Vec<DiseaseCount> = diseases
                .into_iter()
                .map(|(disease, count)| DiseaseCount {
                    disease: disease.to_string(),
                    count,
                })
                .collect();
            by_disease.sort_by(|a, b| b.count.cmp(&a.count).then(a.disease.cmp(&b.disease)));

            Marker {
                city: city.to_string(),
                latitude: lat,
                longitude: lon,
                cases,
                color: color.to_string(),
                label: label.to_string(),
                by_disease,
            }
        })
        .collect()
}
