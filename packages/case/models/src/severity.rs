//! Ordered severity scale mapping case counts to risk colors and labels.
//!
//! Bands are `[min, max)` integer ranges evaluated in ascending order with
//! first match winning, so a count sitting exactly on a boundary always
//! resolves to the more severe band. A valid scale partitions `[0, +inf)`
//! with no gaps and no overlaps; the final band is open-ended.

use serde::{Deserialize, Serialize};

/// One `[min, max)` case-count range with its color and label.
///
/// `max = None` marks the open-ended final band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityBand {
    /// Inclusive lower bound.
    pub min: u64,
    /// Exclusive upper bound; `None` for the final band.
    pub max: Option<u64>,
    /// CSS color name or hex value.
    pub color: String,
    /// Human-readable risk label.
    pub label: String,
}

impl SeverityBand {
    /// Whether `count` falls inside this band.
    #[must_use]
    pub fn contains(&self, count: u64) -> bool {
        count >= self.min && self.max.is_none_or(|max| count < max)
    }
}

/// An ordered, validated list of severity bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityScale {
    /// Bands in ascending order of `min`.
    pub bands: Vec<SeverityBand>,
}

/// Error returned when a severity scale does not partition `[0, +inf)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleError {
    /// The scale has no bands at all.
    Empty,
    /// The first band does not start at zero.
    FirstBandNotZero {
        /// The offending lower bound.
        min: u64,
    },
    /// A band's lower bound does not meet the previous band's upper bound.
    GapOrOverlap {
        /// Exclusive upper bound of the earlier band.
        previous_max: u64,
        /// Inclusive lower bound of the later band.
        next_min: u64,
    },
    /// A band is empty (`max <= min`).
    EmptyBand {
        /// Lower bound of the empty band.
        min: u64,
    },
    /// A non-final band is open-ended, or the final band is bounded.
    UnboundedInterior,
}

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "severity scale has no bands"),
            Self::FirstBandNotZero { min } => {
                write!(f, "first severity band starts at {min}, expected 0")
            }
            Self::GapOrOverlap {
                previous_max,
                next_min,
            } => write!(
                f,
                "severity bands do not tile: previous ends at {previous_max}, next starts at {next_min}"
            ),
            Self::EmptyBand { min } => write!(f, "severity band starting at {min} is empty"),
            Self::UnboundedInterior => {
                write!(f, "only the final severity band may be open-ended")
            }
        }
    }
}

impl std::error::Error for ScaleError {}

impl SeverityScale {
    /// Checks that the bands fully partition `[0, +inf)` in ascending
    /// order: first band starts at 0, each band begins where the previous
    /// one ends, and exactly the final band is open-ended.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError`] describing the first violation found.
    pub fn validate(&self) -> Result<(), ScaleError> {
        let Some(first) = self.bands.first() else {
            return Err(ScaleError::Empty);
        };
        if first.min != 0 {
            return Err(ScaleError::FirstBandNotZero { min: first.min });
        }

        for (i, band) in self.bands.iter().enumerate() {
            let is_last = i + 1 == self.bands.len();
            match band.max {
                None if !is_last => return Err(ScaleError::UnboundedInterior),
                None => {}
                Some(max) if max <= band.min => {
                    return Err(ScaleError::EmptyBand { min: band.min });
                }
                Some(max) => {
                    if is_last {
                        return Err(ScaleError::UnboundedInterior);
                    }
                    let next_min = self.bands[i + 1].min;
                    if next_min != max {
                        return Err(ScaleError::GapOrOverlap {
                            previous_max: max,
                            next_min,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Classifies a case count into `(color, label)`.
    ///
    /// Pure and stable: scans bands in order and returns the first match.
    /// A count outside every band (impossible for a validated scale)
    /// returns the `("gray", "Unknown")` fallback rather than failing.
    #[must_use]
    pub fn classify(&self, count: u64) -> (&str, &str) {
        for band in &self.bands {
            if band.contains(count) {
                return (&band.color, &band.label);
            }
        }
        ("gray", "Unknown")
    }
}

impl Default for SeverityScale {
    /// The marker thresholds used by the original heat maps:
    /// green below 5 cases, yellow below 10, orange below 20, red above.
    fn default() -> Self {
        let band = |min, max, color: &str, label: &str| SeverityBand {
            min,
            max,
            color: color.to_string(),
            label: label.to_string(),
        };
        Self {
            bands: vec![
                band(0, Some(5), "green", "Low Risk"),
                band(5, Some(10), "yellow", "Medium Risk"),
                band(10, Some(20), "orange", "High Risk"),
                band(20, None, "red", "Critical"),
            ],
        }
    }
}
