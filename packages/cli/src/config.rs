//! TOML configuration for the pipeline.
//!
//! Every section is optional: a missing section (or a missing field
//! inside one) falls back to the embedded defaults, so a config file
//! only needs to state what it changes. The whole config is validated
//! up front so a broken severity scale or gradient fails the run before
//! any data is loaded.

use std::path::{Path, PathBuf};

use outbreak_map_analytics::{ClusterConfig, DetectorConfig};
use outbreak_map_case_models::{GradientStop, ScaleError, SeverityScale};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Errors from loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file was not valid TOML.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Severity bands do not partition the count range.
    #[error("Invalid severity scale: {0}")]
    Scale(#[from] ScaleError),

    /// A value is out of range.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of the violation.
        message: String,
    },
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Country appended to every geocoding query.
    pub country: String,
    /// Marker severity scale.
    pub severity: SeverityScale,
    /// Heat-layer rendering options.
    pub heatmap: HeatmapConfig,
    /// Spike detector parameters.
    pub detector: DetectorConfig,
    /// Outbreak clustering parameters.
    pub clustering: ClusterConfig,
    /// Geocoder endpoints and persistence.
    pub geocoder: GeocoderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            country: "India".to_string(),
            severity: SeverityScale::default(),
            heatmap: HeatmapConfig::default(),
            detector: DetectorConfig::default(),
            clustering: ClusterConfig::default(),
            geocoder: GeocoderConfig::default(),
        }
    }
}

/// Heat-layer options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Intensity gradient stops, ascending by offset in `[0, 1]`.
    pub gradient: Vec<GradientStop>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        let stop = |offset, color: &str| GradientStop {
            offset,
            color: color.to_string(),
        };
        Self {
            gradient: vec![
                stop(0.0, "green"),
                stop(0.25, "lime"),
                stop(0.4, "yellow"),
                stop(0.6, "orange"),
                stop(0.8, "darkorange"),
                stop(1.0, "red"),
            ],
        }
    }
}

/// Geocoder endpoints and persistence paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Nominatim search endpoint.
    pub base_url: String,
    /// Minimum delay between network requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Where the lookup cache is persisted.
    pub cache_path: PathBuf,
    /// Extra city table merged over the embedded one, if any.
    pub city_table_path: Option<PathBuf>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/search".to_string(),
            rate_limit_ms: 1_000,
            timeout_ms: 10_000,
            cache_path: PathBuf::from("data/geocode_cache.json"),
            city_table_path: None,
        }
    }
}

impl AppConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.severity.validate()?;

        if self.heatmap.gradient.is_empty() {
            return Err(invalid("heatmap gradient has no stops"));
        }
        for stop in &self.heatmap.gradient {
            if !(0.0..=1.0).contains(&stop.offset) {
                return Err(invalid(format!(
                    "gradient offset {} is outside [0, 1]",
                    stop.offset
                )));
            }
        }
        for pair in self.heatmap.gradient.windows(2) {
            if pair[1].offset <= pair[0].offset {
                return Err(invalid("gradient offsets must be strictly ascending"));
            }
        }

        if self.detector.window == 0 {
            return Err(invalid("detector window must be at least 1"));
        }
        if !self.detector.threshold.is_finite() || self.detector.threshold <= 0.0 {
            return Err(invalid("detector threshold must be a positive number"));
        }

        if !self.clustering.eps_km.is_finite() || self.clustering.eps_km <= 0.0 {
            return Err(invalid("clustering eps_km must be a positive number"));
        }
        if self.clustering.min_cases == 0 {
            return Err(invalid("clustering min_cases must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

/// Loads the configuration from a file, or the embedded defaults when no
/// path is given, and validates it.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed, or if
/// any value fails validation.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&raw)?
        }
        None => toml::from_str(DEFAULT_CONFIG)?,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse_and_validate() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.country, "India");
        assert_eq!(config.severity.bands.len(), 4);
        assert_eq!(config.heatmap.gradient.len(), 6);
    }

    #[test]
    fn empty_file_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.detector.window, 4);
        assert!((config.clustering.eps_km - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config: AppConfig = toml::from_str(
            "country = \"Brazil\"\n\n[detector]\nthreshold = 2.0\n",
        )
        .unwrap();
        assert_eq!(config.country, "Brazil");
        assert!((config.detector.threshold - 2.0).abs() < f64::EPSILON);
        // Unnamed fields keep their defaults.
        assert_eq!(config.detector.window, 4);
        assert_eq!(config.geocoder.rate_limit_ms, 1_000);
    }

    #[test]
    fn rejects_empty_gradient() {
        let config: AppConfig = toml::from_str("[heatmap]\ngradient = []\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_unsorted_gradient() {
        let config: AppConfig = toml::from_str(
            "[heatmap]\ngradient = [\n  { offset = 0.5, color = \"green\" },\n  { offset = 0.2, color = \"red\" },\n]\n",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_broken_severity_scale() {
        let config: AppConfig = toml::from_str(
            "[severity]\nbands = [{ min = 1, color = \"red\", label = \"High\" }]\n",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Scale(_))));
    }

    #[test]
    fn rejects_zero_window() {
        let config: AppConfig = toml::from_str("[detector]\nwindow = 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load(Some(Path::new("/nonexistent/outbreak_map.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
