//! GeoRisk CLI
//!
//! Score a location from live weather data, or run a satellite ingestion.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};

use georisk::config::{EngineConfig, ServiceConfig};
use georisk::report::write_csv;
use georisk::satellite::{AnalysisKind, CopernicusCatalog, IngestionRequest, IngestionRunner, RasterAcquirer, SatelliteCatalog};
use georisk::storage::FileSink;
use georisk::{Coordinate, LocationAnalyzer, OpenMeteoClient};

#[derive(Parser)]
#[command(name = "georisk")]
#[command(about = "Climate hazard scoring and satellite change detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory with model_parameters.csv and grid_rings.csv (defaults to built-in model)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a location and build its enrichment grid
    Analyze {
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,

        /// Seed for reproducible grid variation
        #[arg(long)]
        seed: Option<u64>,

        /// Write the CSV report to this path (a directory gets the default file name)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the full JSON assessment instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Run SAR change and burn severity analyses
    Ingest {
        #[arg(long, allow_negative_numbers = true, requires = "longitude")]
        latitude: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "latitude")]
        longitude: Option<f64>,

        /// all, sar_change_detection or burn_severity
        #[arg(long, default_value = "all")]
        analysis_type: AnalysisKind,

        /// Where artifacts and records are written
        #[arg(long, default_value = "georisk-output")]
        output_dir: PathBuf,

        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(model_dir: Option<&PathBuf>) -> Result<EngineConfig> {
    match model_dir {
        Some(dir) => EngineConfig::from_csv_path(dir)
            .with_context(|| format!("failed to load model parameters from {}", dir.display())),
        None => Ok(EngineConfig::from_csv().unwrap_or_else(|e| {
            warn!("Falling back to built-in model parameters: {}", e);
            let mut config = EngineConfig::default_model();
            config.services = ServiceConfig::from_env();
            config
        })),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.model_dir.as_ref())?;
    let http = reqwest::Client::new();

    match cli.command {
        Commands::Analyze {
            latitude,
            longitude,
            seed,
            report,
            json,
        } => {
            let coordinate = Coordinate::new(latitude, longitude)?;
            let weather = OpenMeteoClient::new(http, &config.services);
            let analyzer = LocationAnalyzer::with_config(weather, config);
            let assessment = analyzer
                .assess(coordinate, seed)
                .await
                .context("location analysis failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                let a = &assessment.analysis;
                let scores = a.scores();
                let (top, top_score) = scores.highest();
                println!("Location: {}, {}", a.latitude, a.longitude);
                println!("  Overall risk: {} ({})", a.overall_score, scores.level().as_str());
                println!(
                    "  Flood {:>3}  Wildfire {:>3}  Storm {:>3}  Drought {:>3}",
                    scores.flood, scores.wildfire, scores.storm, scores.drought
                );
                println!("  Dominant hazard: {} ({})", top.label(), top_score);
                println!(
                    "  Elevation {:.0} m, {:.1} °C, humidity {:.0}%",
                    a.metadata.elevation, a.metadata.current_temp, a.metadata.current_humidity
                );
                let s = &assessment.enrichment.summary;
                println!(
                    "  Grid: {} points, avg risk {}, high {} / medium {} / low {}",
                    s.total_points, s.avg_risk, s.high_risk_zones, s.medium_risk_zones, s.low_risk_zones
                );
                let p = &assessment.report.payout;
                println!(
                    "  Payout: expected ${} / P75 ${} / P90 ${} / worst ${}",
                    p.expected, p.percentile75, p.percentile90, p.worst_case
                );
            }

            if let Some(path) = report {
                let path = if path.is_dir() {
                    path.join(assessment.report.file_name())
                } else {
                    path
                };
                let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
                write_csv(&assessment.report, file)?;
                info!("Report written to {}", path.display());
            }
        }

        Commands::Ingest {
            latitude,
            longitude,
            analysis_type,
            output_dir,
            seed,
        } => {
            let catalog = CopernicusCatalog::from_config(http, &config.services)
                .map(|c| Arc::new(c) as Arc<dyn SatelliteCatalog>);
            let acquirer = RasterAcquirer::new(catalog, config.raster.bbox_half_width_deg);
            let sink = Arc::new(FileSink::new(&output_dir)?);
            let runner = IngestionRunner::new(config.raster.clone(), acquirer, sink).with_seed(seed);

            let request = IngestionRequest {
                trigger: "manual".to_string(),
                source: "cli".to_string(),
                latitude,
                longitude,
                analysis_type,
                ..IngestionRequest::default()
            };
            let summary = runner.run(&request, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!("Output written to {}", output_dir.display());
        }
    }

    Ok(())
}
