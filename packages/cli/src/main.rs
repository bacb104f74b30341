#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the outbreak map pipeline.
//!
//! Each subcommand runs the same front half — load, clean, geocode —
//! and then one analytical stage, writing a JSON artifact for the map
//! renderer.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use outbreak_map_analytics::{
    GroupOptions, aggregate, build_heat_layer, build_markers, city_summary,
    detect_outbreak_zones, detect_spikes, disease_summary,
};
use outbreak_map_case_models::{CaseRecord, TimeGranularity};
use outbreak_map_geocoder::{GeocodeCache, Resolver, ResolverConfig, static_table};
use outbreak_map_ingest::{clean_records, geocode_missing, load_records};

use crate::artifacts::{
    HeatmapArtifact, OutbreaksArtifact, SummaryArtifact, TrendsArtifact, write_json,
};
use crate::config::AppConfig;

mod artifacts;
mod config;

#[derive(Parser)]
#[command(name = "outbreak_map", about = "Disease case mapping pipeline")]
struct Cli {
    /// Path to a TOML config file. Embedded defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the weighted heat layer and severity markers
    Heatmap {
        /// Input case data (.csv or .json)
        input: PathBuf,
        /// Output artifact path
        #[arg(long, default_value = "heatmap.json")]
        output: PathBuf,
        /// Only include this disease (case-insensitive)
        #[arg(long)]
        disease: Option<String>,
        /// Only include this city (case-insensitive)
        #[arg(long)]
        city: Option<String>,
        /// Resolve coordinates from the table and cache only
        #[arg(long)]
        no_network: bool,
    },
    /// Build per-disease time series with spike annotations
    Trends {
        /// Input case data (.csv or .json)
        input: PathBuf,
        /// Output artifact path
        #[arg(long, default_value = "trends.json")]
        output: PathBuf,
        /// Bucketing granularity: "weekly" or "monthly"
        #[arg(long, default_value = "weekly")]
        granularity: TimeGranularity,
        /// Only include this disease (case-insensitive)
        #[arg(long)]
        disease: Option<String>,
    },
    /// Detect geographic outbreak zones
    Outbreaks {
        /// Input case data (.csv or .json)
        input: PathBuf,
        /// Output artifact path
        #[arg(long, default_value = "outbreaks.json")]
        output: PathBuf,
        /// Resolve coordinates from the table and cache only
        #[arg(long)]
        no_network: bool,
    },
    /// Print per-disease and per-city rollups as JSON
    Summary {
        /// Input case data (.csv or .json)
        input: PathBuf,
    },
    /// Resolve missing coordinates and persist the lookup cache
    Geocode {
        /// Input case data (.csv or .json)
        input: PathBuf,
        /// Resolve coordinates from the table and cache only
        #[arg(long)]
        no_network: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    let start = Instant::now();

    match cli.command {
        Commands::Heatmap {
            input,
            output,
            disease,
            city,
            no_network,
        } => {
            let mut records = load_cases(&input, &config, !no_network).await?;
            filter_records(&mut records, disease.as_deref(), city.as_deref());

            let points = aggregate(
                &records,
                GroupOptions {
                    granularity: None,
                    by_locality: true,
                },
            )?;
            let artifact = HeatmapArtifact {
                layer: build_heat_layer(&points, &config.heatmap.gradient),
                markers: build_markers(&points, &config.severity),
            };
            log::info!(
                "Heat layer has {} point(s), {} marker(s)",
                artifact.layer.points.len(),
                artifact.markers.len(),
            );
            write_json(&output, &artifact)?;
        }
        Commands::Trends {
            input,
            output,
            granularity,
            disease,
        } => {
            // Trends need no coordinates, so the network stays out of it.
            let mut records = load_cases(&input, &config, false).await?;
            filter_records(&mut records, disease.as_deref(), None);

            let points = aggregate(
                &records,
                GroupOptions {
                    granularity: Some(granularity),
                    by_locality: false,
                },
            )?;
            let series = detect_spikes(&points, config.detector);
            let spike_count = series.iter().filter(|p| p.is_spike).count();
            log::info!(
                "Computed {} series point(s), {} spike(s) flagged",
                series.len(),
                spike_count,
            );
            write_json(
                &output,
                &TrendsArtifact {
                    granularity: granularity.to_string(),
                    window: config.detector.window,
                    threshold: config.detector.threshold,
                    spike_count,
                    series,
                },
            )?;
        }
        Commands::Outbreaks {
            input,
            output,
            no_network,
        } => {
            let records = load_cases(&input, &config, !no_network).await?;
            let points = aggregate(
                &records,
                GroupOptions {
                    granularity: None,
                    by_locality: true,
                },
            )?;
            let zones = detect_outbreak_zones(&points, config.clustering);
            write_json(
                &output,
                &OutbreaksArtifact {
                    eps_km: config.clustering.eps_km,
                    min_cases: config.clustering.min_cases,
                    zones,
                },
            )?;
        }
        Commands::Summary { input } => {
            // Rollups need no coordinates either; skip geocoding entirely.
            let (raw, malformed) = load_records(&input)?;
            let (records, report) = clean_records(raw, malformed)?;
            log::info!(
                "Kept {} row(s), dropped {}",
                report.kept,
                report.dropped()
            );

            let points = aggregate(&records, GroupOptions::default())?;
            let artifact = SummaryArtifact {
                diseases: disease_summary(&points),
                cities: city_summary(&points),
            };
            println!("{}", serde_json::to_string_pretty(&artifact)?);
        }
        Commands::Geocode { input, no_network } => {
            let records = load_cases(&input, &config, !no_network).await?;
            let with_coords = records
                .iter()
                .filter(|r| r.has_valid_coordinates())
                .count();
            println!(
                "{} of {} record(s) have coordinates",
                with_coords,
                records.len()
            );
        }
    }

    log::info!("Done in {:.2?}", start.elapsed());
    Ok(())
}

/// Loads, cleans, and geocodes the input. The cache is written back even
/// when nothing new was resolved (the save is a no-op then).
async fn load_cases(
    input: &Path,
    config: &AppConfig,
    use_network: bool,
) -> Result<Vec<CaseRecord>, Box<dyn std::error::Error>> {
    let (raw, malformed) = load_records(input)?;
    let (mut records, report) = clean_records(raw, malformed)?;
    log::info!(
        "Kept {} row(s), dropped {} (malformed {}, missing fields {}, bad coordinates {}, zero cases {}, duplicates {})",
        report.kept,
        report.dropped(),
        report.malformed,
        report.missing_required,
        report.bad_coordinates,
        report.zero_cases,
        report.duplicates,
    );

    let mut resolver = build_resolver(config, use_network)?;
    geocode_missing(&mut records, &mut resolver, &config.country).await;
    resolver.save_cache()?;

    Ok(records)
}

fn build_resolver(
    config: &AppConfig,
    use_network: bool,
) -> Result<Resolver, Box<dyn std::error::Error>> {
    let table = match &config.geocoder.city_table_path {
        Some(path) => static_table::load_merged(path)?,
        None => static_table::builtin(),
    };
    let cache = GeocodeCache::open(&config.geocoder.cache_path)?;
    let resolver = Resolver::new(
        ResolverConfig {
            base_url: config.geocoder.base_url.clone(),
            rate_limit_ms: config.geocoder.rate_limit_ms,
            timeout_ms: config.geocoder.timeout_ms,
            use_network,
        },
        table,
        cache,
    )?;
    Ok(resolver)
}

fn filter_records(records: &mut Vec<CaseRecord>, disease: Option<&str>, city: Option<&str>) {
    if let Some(disease) = disease {
        records.retain(|r| r.disease.eq_ignore_ascii_case(disease));
    }
    if let Some(city) = city {
        records.retain(|r| r.city.eq_ignore_ascii_case(city));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(disease: &str, city: &str) -> CaseRecord {
        CaseRecord {
            disease: disease.to_string(),
            locality: None,
            city: city.to_string(),
            state: None,
            latitude: None,
            longitude: None,
            date: None,
            cases: 1,
        }
    }

    #[test]
    fn filters_are_case_insensitive() {
        let mut records = vec![
            record("Dengue", "Pune"),
            record("Malaria", "Pune"),
            record("Dengue", "Mumbai"),
        ];
        filter_records(&mut records, Some("dengue"), Some("PUNE"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].city, "Pune");
    }

    #[test]
    fn no_filters_keep_everything() {
        let mut records = vec![record("Dengue", "Pune"), record("Malaria", "Mumbai")];
        filter_records(&mut records, None, None);
        assert_eq!(records.len(), 2);
    }
}
