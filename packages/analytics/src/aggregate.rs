//! Grouping of case records into `(location, disease, period)` counts.
//!
//! Grouping keys are ordered tuples in a `BTreeMap`, so output order is
//! stable (sorted by key) for a given input regardless of input order.
//! Missing optional key parts — locality, date — simply drop out of the
//! key for that record instead of failing the record.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use outbreak_map_case_models::{AggregatedPoint, CaseRecord, TimeGranularity};

use crate::AnalyticsError;

/// Which optional parts participate in the grouping key.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupOptions {
    /// Bucket by calendar period when set; records without a date fall
    /// into the `None` bucket.
    pub granularity: Option<TimeGranularity>,
    /// Include the locality (neighborhood) in the key.
    pub by_locality: bool,
}

/// Returns the period label for a date at the given granularity:
/// the Monday of the week, or `YYYY-MM` for months.
#[must_use]
pub fn period_label(date: NaiveDate, granularity: TimeGranularity) -> String {
    match granularity {
        TimeGranularity::Weekly => {
            let monday =
                date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()));
            monday.format("%Y-%m-%d").to_string()
        }
        TimeGranularity::Monthly => date.format("%Y-%m").to_string(),
    }
}

/// Aggregates case records into one [`AggregatedPoint`] per distinct
/// `(disease, city, locality, period)` key, summing case weights.
///
/// Coordinates on the output are the first seen for the key, so all
/// rows for one location share the marker position.
///
/// # Errors
///
/// Returns [`AnalyticsError::MissingGroupKeys`] when the input is
/// non-empty but no record carries both a disease and a city.
pub fn aggregate(
    records: &[CaseRecord],
    options: GroupOptions,
) -> Result<Vec<AggregatedPoint>, AnalyticsError> {
    let groupable = records
        .iter()
        .filter(|r| !r.disease.is_empty() && !r.city.is_empty());

    let mut groups: BTreeMap<
        (String, String, Option<String>, Option<String>),
        (u64, Option<(f64, f64)>),
    > = BTreeMap::new();
    let mut any = false;

    for record in groupable {
        any = true;
        let locality = if options.by_locality {
            record.locality.clone()
        } else {
            None
        };
        let period = options
            .granularity
            .and_then(|g| record.date.map(|d| period_label(d, g)));

        let key = (record.disease.clone(), record.city.clone(), locality, period);
        let entry = groups.entry(key).or_insert((0, None));
        entry.0 += record.cases;
        if entry.1.is_none() {
            entry.1 = record.coordinates();
        }
    }

    if !records.is_empty() && !any {
        return Err(AnalyticsError::MissingGroupKeys);
    }

    let points = groups
        .into_iter()
        .map(
            |((disease, city, locality, period), (count, coords))| AggregatedPoint {
                disease,
                city,
                locality,
                period,
                count,
                latitude: coords.map(|(lat, _)| lat),
                longitude: coords.map(|(_, lon)| lon),
            },
        )
        .collect();

    Ok(points)
}

/// Collapses aggregated points into per-city totals across diseases and
/// periods, keeping the first-seen coordinates per city.
#[must_use]
pub fn city_totals(points: &[AggregatedPoint]) -> Vec<AggregatedPoint> {
    let mut totals: BTreeMap<String, (u64, Option<(f64, f64)>)> = BTreeMap::new();

    for point in points {
        let entry = totals.entry(point.city.clone()).or_insert((0, None));
        entry.0 += point.count;
        if entry.1.is_none() {
            entry.1 = point.coordinates();
        }
    }

    totals
        .into_iter()
        .map(|(city, (count, coords))| AggregatedPoint {
            disease: String::new(),
            city,
            locality: None,
            period: None,
            count,
            latitude: coords.map(|(lat, _)| lat),
            longitude: coords.map(|(_, lon)| lon),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(disease: &str, city: &str, cases: u64, date: Option<&str>) -> CaseRecord {
        CaseRecord {
            disease: disease.to_string(),
            locality: None,
            city: city.to_string(),
            state: None,
            latitude: Some(18.52),
            longitude: Some(73.85),
            date: date.map(|d| d.parse().unwrap()),
            cases,
        }
    }

    #[test]
    fn sums_case_weights_per_key() {
        // Five Pune rows with weight 2 each: one point, count 10.
        let records = vec![record("Dengue", "Pune", 2, None); 5];
        let points = aggregate(&records, GroupOptions::default()).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 10);
        assert_eq!(points[0].city, "Pune");
    }

    #[test]
    fn unweighted_rows_count_as_one_each() {
        let records = vec![record("Dengue", "Pune", 1, None); 5];
        let points = aggregate(&records, GroupOptions::default()).unwrap();
        assert_eq!(points[0].count, 5);
    }

    #[test]
    fn output_is_sorted_by_key() {
        let records = vec![
            record("Malaria", "Pune", 1, None),
            record("Dengue", "Mumbai", 1, None),
            record("Dengue", "Pune", 1, None),
        ];
        let points = aggregate(&records, GroupOptions::default()).unwrap();
        let keys: Vec<(&str, &str)> = points
            .iter()
            .map(|p| (p.disease.as_str(), p.city.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Dengue", "Mumbai"),
                ("Dengue", "Pune"),
                ("Malaria", "Pune")
            ]
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = vec![
            record("Dengue", "Pune", 3, None),
            record("Dengue", "Pune", 4, None),
            record("Malaria", "Mumbai", 2, None),
        ];
        let once = aggregate(&records, GroupOptions::default()).unwrap();

        // Re-aggregate the unique-keyed output as if it were raw rows.
        let as_records: Vec<CaseRecord> = once
            .iter()
            .map(|p| CaseRecord {
                disease: p.disease.clone(),
                locality: p.locality.clone(),
                city: p.city.clone(),
                state: None,
                latitude: p.latitude,
                longitude: p.longitude,
                date: None,
                cases: p.count,
            })
            .collect();
        let twice = aggregate(&as_records, GroupOptions::default()).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn weekly_label_is_monday_of_week() {
        // 2025-01-15 is a Wednesday; the ISO week starts 2025-01-13.
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(period_label(date, TimeGranularity::Weekly), "2025-01-13");
    }

    #[test]
    fn monthly_label_is_year_month() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(period_label(date, TimeGranularity::Monthly), "2025-01");
    }

    #[test]
    fn records_without_dates_fall_into_unbucketed_group() {
        let records = vec![
            record("Dengue", "Pune", 1, Some("2025-01-15")),
            record("Dengue", "Pune", 1, None),
        ];
        let options = GroupOptions {
            granularity: Some(TimeGranularity::Weekly),
            by_locality: false,
        };
        let points = aggregate(&records, options).unwrap();
        assert_eq!(points.len(), 2);
        let periods: Vec<Option<&str>> = points.iter().map(|p| p.period.as_deref()).collect();
        assert!(periods.contains(&None));
        assert!(periods.contains(&Some("2025-01-13")));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let points = aggregate(&[], GroupOptions::default()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn city_totals_collapse_diseases() {
        let records = vec![
            record("Dengue", "Pune", 3, None),
            record("Malaria", "Pune", 4, None),
            record("Dengue", "Mumbai", 2, None),
        ];
        let points = aggregate(&records, GroupOptions::default()).unwrap();
        let totals = city_totals(&points);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].city, "Mumbai");
        assert_eq!(totals[0].count, 2);
        assert_eq!(totals[1].city, "Pune");
        assert_eq!(totals[1].count, 7);
    }
}
