//! Score every location in a CSV file and write one summary row per location
//!
//! Weather is fetched location by location; grid enrichment for the
//! whole batch then runs in parallel.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use rayon::prelude::*;
use serde::Serialize;

use georisk::config::{EngineConfig, ServiceConfig};
use georisk::location::loader::DEFAULT_LOCATIONS_PATH;
use georisk::location::load_locations;
use georisk::rng::seeded_rng;
use georisk::{LocationAnalysis, LocationAnalyzer, NamedLocation, OpenMeteoClient};

#[derive(Parser)]
#[command(name = "run_batch")]
#[command(about = "Batch hazard scoring for a list of locations", long_about = None)]
struct Args {
    /// CSV with Name,Latitude,Longitude columns
    #[arg(long, default_value = DEFAULT_LOCATIONS_PATH)]
    locations: PathBuf,

    #[arg(long, default_value = "batch_risk_summary.csv")]
    output: PathBuf,

    /// Seed for reproducible grids (each location gets its own stream)
    #[arg(long)]
    seed: Option<u64>,
}

/// One output row per scored location
#[derive(Debug, Serialize)]
struct SummaryRow {
    name: String,
    latitude: f64,
    longitude: f64,
    overall: u8,
    level: &'static str,
    flood: u8,
    wildfire: u8,
    storm: u8,
    drought: u8,
    grid_avg_risk: u8,
    high_risk_zones: usize,
    medium_risk_zones: usize,
    low_risk_zones: usize,
    expected_payout: u64,
    payout_p90: u64,
    worst_case: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    let locations = load_locations(&args.locations)
        .with_context(|| format!("failed to load locations from {}", args.locations.display()))?;
    println!("Loaded {} locations from {}", locations.len(), args.locations.display());

    let mut config = EngineConfig::from_csv().unwrap_or_else(|e| {
        warn!("Falling back to built-in model parameters: {}", e);
        EngineConfig::default_model()
    });
    config.services = ServiceConfig::from_env();
    let weather = OpenMeteoClient::new(reqwest::Client::new(), &config.services);
    let analyzer = LocationAnalyzer::with_config(weather, config);

    println!("Fetching weather...");
    let mut scored: Vec<(NamedLocation, LocationAnalysis)> = Vec::with_capacity(locations.len());
    for location in locations {
        match analyzer.analyze(location.coordinate).await {
            Ok(analysis) => scored.push((location, analysis)),
            Err(e) => warn!("Skipping {}: {}", location.name, e),
        }
    }
    println!("Scored {} locations in {:?}", scored.len(), start.elapsed());

    println!("Building enrichment grids...");
    let grid_start = Instant::now();
    let rows: Vec<SummaryRow> = scored
        .par_iter()
        .enumerate()
        .filter_map(|(index, (location, analysis))| {
            let mut rng = seeded_rng(args.seed, index as u64);
            let enrichment = match analyzer.enrich(location.coordinate, analysis.overall_score, &mut rng) {
                Ok(e) => e,
                Err(e) => {
                    warn!("Grid failed for {}: {}", location.name, e);
                    return None;
                }
            };
            let center = enrichment.center_point()?;
            let scores = analysis.scores();
            let summary = &enrichment.summary;
            Some(SummaryRow {
                name: location.name.clone(),
                latitude: analysis.latitude,
                longitude: analysis.longitude,
                overall: scores.overall,
                level: scores.level().as_str(),
                flood: scores.flood,
                wildfire: scores.wildfire,
                storm: scores.storm,
                drought: scores.drought,
                grid_avg_risk: summary.avg_risk,
                high_risk_zones: summary.high_risk_zones,
                medium_risk_zones: summary.medium_risk_zones,
                low_risk_zones: summary.low_risk_zones,
                expected_payout: center.payout_estimate.expected,
                payout_p90: center.payout_estimate.percentile90,
                worst_case: center.payout_estimate.worst_case,
            })
        })
        .collect();
    println!("Grids complete in {:?}", grid_start.elapsed());

    let file = File::create(&args.output).with_context(|| format!("cannot create {}", args.output.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("\n=== Batch Summary ===");
    let high = rows.iter().filter(|r| r.overall >= 75).count();
    println!("Locations written: {}", rows.len());
    println!("High-risk locations: {}", high);
    if let Some(worst) = rows.iter().max_by_key(|r| r.overall) {
        println!("Highest overall: {} ({})", worst.name, worst.overall);
    }
    println!("Output written to {} in {:?}", args.output.display(), start.elapsed());
    Ok(())
}
