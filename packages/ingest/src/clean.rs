//! Row-level cleaning, coercion, and duplicate removal.
//!
//! Turns permissive [`RawRecord`]s into validated [`CaseRecord`]s:
//! required fields checked, names standardized to title case, dates
//! parsed, coordinates range-checked (both-or-neither), weights
//! defaulted to 1. Every dropped row is counted by reason in the
//! [`CleanReport`]; only an input where *no* row carries the required
//! fields aborts the batch.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use outbreak_map_case_models::CaseRecord;

use crate::loader::RawRecord;
use crate::IngestError;

/// Per-reason drop counts from one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Rows the loader could not deserialize at all.
    pub malformed: u64,
    /// Rows missing a required field (disease or city).
    pub missing_required: u64,
    /// Rows with half-present or out-of-range coordinates.
    pub bad_coordinates: u64,
    /// Rows with an explicit zero case weight.
    pub zero_cases: u64,
    /// Rows with a date that could not be parsed (kept, date cleared).
    pub bad_dates: u64,
    /// Exact duplicate rows removed after cleaning.
    pub duplicates: u64,
    /// Rows that survived cleaning.
    pub kept: u64,
}

impl CleanReport {
    /// Total rows dropped for any reason.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.malformed + self.missing_required + self.bad_coordinates + self.zero_cases
            + self.duplicates
    }
}

/// Cleans raw rows into case records.
///
/// `malformed_rows` carries the loader's count of rows that never
/// deserialized, so the report covers the whole input.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumns`] when the input had rows but
/// none of them carried both a disease and a city — a schema problem,
/// not a row problem.
pub fn clean_records(
    raw: Vec<RawRecord>,
    malformed_rows: u64,
) -> Result<(Vec<CaseRecord>, CleanReport), IngestError> {
    let mut report = CleanReport {
        malformed: malformed_rows,
        ..CleanReport::default()
    };
    let input_rows = raw.len() as u64;

    let mut records = Vec::new();
    let mut seen = BTreeSet::new();

    for row in raw {
        let disease = non_empty(row.disease.as_deref());
        let city = non_empty(row.city.as_deref());
        let (Some(disease), Some(city)) = (disease, city) else {
            report.missing_required += 1;
            continue;
        };

        let coordinates = match (row.latitude, row.longitude) {
            (None, None) => None,
            (Some(lat), Some(lon))
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
            {
                Some((lat, lon))
            }
            _ => {
                report.bad_coordinates += 1;
                continue;
            }
        };

        let cases = row.cases.unwrap_or(1);
        if cases == 0 {
            report.zero_cases += 1;
            continue;
        }

        let date = match row.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw_date) => match parse_date(raw_date) {
                Some(date) => Some(date),
                None => {
                    log::debug!("Unparseable date '{raw_date}', clearing");
                    report.bad_dates += 1;
                    None
                }
            },
        };

        let record = CaseRecord {
            disease: title_case(&disease),
            locality: non_empty(row.locality.as_deref()).map(|s| title_case(&s)),
            city: title_case(&city),
            state: non_empty(row.state.as_deref()).map(|s| title_case(&s)),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lon)| lon),
            date,
            cases,
        };

        let dedup_key = (
            record.disease.clone(),
            record.locality.clone(),
            record.city.clone(),
            record.state.clone(),
            record.latitude.map(f64::to_bits),
            record.longitude.map(f64::to_bits),
            record.date,
            record.cases,
        );
        if !seen.insert(dedup_key) {
            report.duplicates += 1;
            continue;
        }

        records.push(record);
    }

    report.kept = records.len() as u64;

    if input_rows > 0 && report.missing_required == input_rows {
        return Err(IngestError::MissingColumns {
            missing: vec!["disease".to_string(), "city".to_string()],
        });
    }

    log::info!(
        "Cleaning complete: {} kept, {} dropped ({} missing required, \
         {} bad coordinates, {} zero-case, {} duplicates, {} malformed)",
        report.kept,
        report.dropped(),
        report.missing_required,
        report.bad_coordinates,
        report.zero_cases,
        report.duplicates,
        report.malformed,
    );

    Ok((records, report))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Capitalizes the first letter of each whitespace-separated word.
fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the date formats seen across the source data sets.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];

    // Datetime strings: take the date part.
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);

    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(disease: Option<&str>, city: Option<&str>) -> RawRecord {
        RawRecord {
            disease: disease.map(String::from),
            city: city.map(String::from),
            ..RawRecord::default()
        }
    }

    #[test]
    fn standardizes_names_and_defaults_weight() {
        let row = RawRecord {
            disease: Some("  dengue ".to_string()),
            city: Some("pune".to_string()),
            state: Some("MAHARASHTRA".to_string()),
            ..RawRecord::default()
        };
        let (records, report) = clean_records(vec![row], 0).unwrap();
        assert_eq!(report.kept, 1);
        assert_eq!(records[0].disease, "Dengue");
        assert_eq!(records[0].city, "Pune");
        assert_eq!(records[0].state.as_deref(), Some("Maharashtra"));
        assert_eq!(records[0].cases, 1);
    }

    #[test]
    fn drops_rows_missing_required_fields() {
        let rows = vec![
            raw(Some("Dengue"), Some("Pune")),
            raw(None, Some("Pune")),
            raw(Some("Dengue"), None),
            raw(Some(""), Some("  ")),
        ];
        let (records, report) = clean_records(rows, 0).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.missing_required, 3);
    }

    #[test]
    fn drops_half_present_coordinates() {
        let mut row = raw(Some("Dengue"), Some("Pune"));
        row.latitude = Some(18.52);
        let (records, report) = clean_records(vec![row], 0).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.bad_coordinates, 1);
    }

    #[test]
    fn drops_out_of_range_coordinates() {
        let mut row = raw(Some("Dengue"), Some("Pune"));
        row.latitude = Some(91.0);
        row.longitude = Some(73.85);
        let (_, report) = clean_records(vec![row], 0).unwrap();
        assert_eq!(report.bad_coordinates, 1);
    }

    #[test]
    fn drops_zero_case_rows() {
        let mut row = raw(Some("Dengue"), Some("Pune"));
        row.cases = Some(0);
        let (_, report) = clean_records(vec![row], 0).unwrap();
        assert_eq!(report.zero_cases, 1);
    }

    #[test]
    fn removes_exact_duplicates() {
        let rows = vec![
            raw(Some("Dengue"), Some("Pune")),
            raw(Some("Dengue"), Some("Pune")),
            raw(Some("Malaria"), Some("Pune")),
        ];
        let (records, report) = clean_records(rows, 0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn parses_common_date_formats() {
        for raw_date in ["2025-01-15", "2025/01/15", "15-01-2025", "15/01/2025"] {
            let mut row = raw(Some("Dengue"), Some("Pune"));
            row.date = Some(raw_date.to_string());
            let (records, _) = clean_records(vec![row], 0).unwrap();
            assert_eq!(
                records[0].date,
                NaiveDate::from_ymd_opt(2025, 1, 15),
                "format {raw_date}"
            );
        }
    }

    #[test]
    fn unparseable_date_clears_but_keeps_row() {
        let mut row = raw(Some("Dengue"), Some("Pune"));
        row.date = Some("someday".to_string());
        let (records, report) = clean_records(vec![row], 0).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, None);
        assert_eq!(report.bad_dates, 1);
    }

    #[test]
    fn all_rows_missing_required_is_schema_error() {
        let rows = vec![raw(None, None), raw(None, Some("Pune"))];
        let err = clean_records(rows, 0).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumns { .. }));
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let (records, report) = clean_records(vec![], 0).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.kept, 0);
    }
}
