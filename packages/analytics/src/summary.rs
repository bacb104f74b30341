//! Per-disease and per-city rollups for the summary view.

use std::collections::{BTreeMap, BTreeSet};

use outbreak_map_case_models::{AggregatedPoint, CitySummary, DiseaseSummary};

/// Rolls aggregated points up per disease: total cases, number of
/// reporting locations, mean and max per location. Sorted by descending
/// total, disease name as tiebreaker.
#[must_use]
pub fn disease_summary(points: &[AggregatedPoint]) -> Vec<DiseaseSummary> {
    let mut per_disease: BTreeMap<&str, (u64, u64, u64)> = BTreeMap::new();

    for point in points {
        let entry = per_disease.entry(&point.disease).or_insert((0, 0, 0));
        entry.0 += point.count;
        entry.1 += 1;
        entry.2 = entry.2.max(point.count);
    }

    let mut summaries: Vec<DiseaseSummary> = per_disease
        .into_iter()
        .map(|(disease, (total, locations, max))| DiseaseSummary {
            disease: disease.to_string(),
            total_cases: total,
            locations,
            #[allow(clippy::cast_precision_loss)]
            avg_per_location: total as f64 / locations as f64,
            max_in_one_location: max,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_cases
            .cmp(&a.total_cases)
            .then_with(|| a.disease.cmp(&b.disease))
    });
    summaries
}

/// Rolls aggregated points up per city: total cases and number of
/// distinct diseases. Sorted by descending total, city as tiebreaker.
#[must_use]
pub fn city_summary(points: &[AggregatedPoint]) -> Vec<CitySummary> {
    let mut per_city: BTreeMap<&str, (u64, BTreeSet<&str>)> = BTreeMap::new();

    for point in points {
        let entry = per_city
            .entry(&point.city)
            .or_insert((0, BTreeSet::new()));
        entry.0 += point.count;
        entry.1.insert(&point.disease);
    }

    let mut summaries: Vec<CitySummary> = per_city
        .into_iter()
        .map(|(city, (total, diseases))| CitySummary {
            city: city.to_string(),
            total_cases: total,
            diseases: diseases.len() as u64,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_cases
            .cmp(&a.total_cases)
            .then_with(|| a.city.cmp(&b.city))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(disease: &str, city: &str, count: u64) -> AggregatedPoint {
        AggregatedPoint {
            disease: disease.to_string(),
            city: city.to_string(),
            locality: None,
            period: None,
            count,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn disease_rollup_counts_locations_and_max() {
        let points = vec![
            point("Dengue", "Pune", 10),
            point("Dengue", "Mumbai", 20),
            point("Malaria", "Pune", 5),
        ];
        let summaries = disease_summary(&points);
        assert_eq!(summaries.len(), 2);

        let dengue = &summaries[0];
        assert_eq!(dengue.disease, "Dengue");
        assert_eq!(dengue.total_cases, 30);
        assert_eq!(dengue.locations, 2);
        assert!((dengue.avg_per_location - 15.0).abs() < f64::EPSILON);
        assert_eq!(dengue.max_in_one_location, 20);
    }

    #[test]
    fn city_rollup_counts_distinct_diseases() {
        let points = vec![
            point("Dengue", "Pune", 10),
            point("Malaria", "Pune", 5),
            point("Dengue", "Mumbai", 2),
        ];
        let summaries = city_summary(&points);
        assert_eq!(summaries[0].city, "Pune");
        assert_eq!(summaries[0].total_cases, 15);
        assert_eq!(summaries[0].diseases, 2);
        assert_eq!(summaries[1].city, "Mumbai");
    }

    #[test]
    fn sorted_by_descending_total() {
        let points = vec![
            point("Dengue", "Pune", 1),
            point("Cholera", "Pune", 50),
        ];
        let summaries = disease_summary(&points);
        assert_eq!(summaries[0].disease, "Cholera");
    }
}
