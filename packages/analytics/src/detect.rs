//! Rolling-baseline spike detection over per-disease time series.
//!
//! For each disease, periods are ordered ascending and each period is
//! compared against the trailing mean of the previous `window` periods.
//! A period whose count exceeds `baseline * threshold` is flagged as a
//! spike. This is deliberately a trailing-mean ratio detector, not a
//! statistical anomaly model: it flags relative surges, not
//! statistically rare ones. Each series is processed independently and
//! every run recomputes from the full input window.

use std::collections::BTreeMap;

use outbreak_map_case_models::{AggregatedPoint, TimeSeriesPoint};
use serde::Deserialize;

/// Spike detector parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DetectorConfig {
    /// Number of trailing periods in the baseline window.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Multiplicative threshold over the baseline (1.5 = 50% above the
    /// trailing average).
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

const fn default_window() -> usize {
    4
}

const fn default_threshold() -> f64 {
    1.5
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            threshold: default_threshold(),
        }
    }
}

/// Builds annotated time series from period-bucketed aggregated points.
///
/// Points without a period label are ignored; counts are summed across
/// locations so each disease gets one series. Per period:
///
/// - `baseline` is the mean of up to `window` strictly-previous counts,
///   undefined for the first period of a series;
/// - `is_spike` iff the baseline is defined and
///   `cases > baseline * threshold`;
/// - `pct_change` vs the previous period, 0 when there is no previous
///   period or its count is zero;
/// - `moving_avg` is the trailing mean including the current period,
///   for chart overlays.
///
/// An empty series produces no rows; a single-point series produces one
/// row with an undefined baseline and no spike.
#[must_use]
pub fn detect_spikes(points: &[AggregatedPoint], config: DetectorConfig) -> Vec<TimeSeriesPoint> {
    let window = config.window.max(1);

    // disease -> period -> summed count; BTreeMap keeps ISO period
    // labels in chronological order.
    let mut series: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    for point in points {
        let Some(period) = point.period.as_deref() else {
            continue;
        };
        *series
            .entry(&point.disease)
            .or_default()
            .entry(period)
            .or_insert(0) += point.count;
    }

    let mut out = Vec::new();

    for (disease, periods) in series {
        let counts: Vec<(&str, u64)> = periods.into_iter().collect();

        for (t, &(period, cases)) in counts.iter().enumerate() {
            let baseline = if t == 0 {
                None
            } else {
                let start = t.saturating_sub(window);
                Some(mean(&counts[start..t]))
            };

            #[allow(clippy::cast_precision_loss)]
            let is_spike =
                baseline.is_some_and(|b| cases as f64 > b * config.threshold);

            let pct_change = if t == 0 {
                0.0
            } else {
                let previous = counts[t - 1].1;
                if previous == 0 {
                    0.0
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let change = (cases as f64 - previous as f64) / previous as f64 * 100.0;
                    change
                }
            };

            let ma_start = (t + 1).saturating_sub(window);
            let moving_avg = mean(&counts[ma_start..=t]);

            out.push(TimeSeriesPoint {
                disease: disease.to_string(),
                period: period.to_string(),
                cases,
                baseline,
                moving_avg,
                is_spike,
                pct_change,
            });
        }
    }

    out
}

#[allow(clippy::cast_precision_loss)]
fn mean(slice: &[(&str, u64)]) -> f64 {
    let sum: u64 = slice.iter().map(|(_, c)| c).sum();
    sum as f64 / slice.len() as f64
}
