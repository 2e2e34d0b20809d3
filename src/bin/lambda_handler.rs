//! AWS Lambda handler for location analysis, grid enrichment and ingestion
//!
//! Routes (all POST, JSON bodies):
//! - `/analyze-location`      `{latitude, longitude}`
//! - `/enrich-demographics`   `{latitude, longitude, riskFactors: {overallScore}}`
//! - `/ingest-satellite-data` ingestion request (locations, analysisType, ...)
//! - `/report`                `{latitude, longitude}`, answered as `text/csv`
//!
//! Supports Lambda Function URLs for direct HTTP access.

use std::sync::Arc;

use chrono::Utc;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use log::{error, info};
use serde::{Deserialize, Serialize};

use georisk::config::{EngineConfig, ServiceConfig};
use georisk::report::to_csv_string;
use georisk::rng::seeded_rng;
use georisk::satellite::{CopernicusCatalog, IngestionRequest, IngestionRunner, RasterAcquirer, SatelliteCatalog};
use georisk::storage::{AnalysisSink, FileSink, MemorySink};
use georisk::{Coordinate, LocationAnalyzer, OpenMeteoClient, RiskError};

/// Output directory for artifacts; in-memory storage when unset
const OUTPUT_DIR_ENV: &str = "GEORISK_OUTPUT_DIR";

#[derive(Debug, Deserialize)]
struct LocationRequest {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RiskFactorsInput {
    overall_score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrichRequest {
    latitude: f64,
    longitude: f64,
    risk_factors: RiskFactorsInput,
    #[serde(default)]
    seed: Option<u64>,
}

/// Shared across invocations of a warm container
struct App {
    analyzer: LocationAnalyzer<OpenMeteoClient>,
    runner: IngestionRunner,
}

impl App {
    fn from_env() -> Result<Self, Error> {
        let mut config = EngineConfig::from_csv().unwrap_or_else(|e| {
            info!("Using built-in model parameters ({})", e);
            EngineConfig::default_model()
        });
        config.services = ServiceConfig::from_env();

        let http = reqwest::Client::new();
        let catalog = CopernicusCatalog::from_config(http.clone(), &config.services)
            .map(|c| Arc::new(c) as Arc<dyn SatelliteCatalog>);
        let acquirer = RasterAcquirer::new(catalog, config.raster.bbox_half_width_deg);
        let sink: Arc<dyn AnalysisSink> = match std::env::var(OUTPUT_DIR_ENV) {
            Ok(dir) => Arc::new(FileSink::new(dir)?),
            Err(_) => Arc::new(MemorySink::new()),
        };
        let runner = IngestionRunner::new(config.raster.clone(), acquirer, sink);
        let analyzer = LocationAnalyzer::with_config(OpenMeteoClient::new(http, &config.services), config);
        Ok(Self { analyzer, runner })
    }
}

fn with_cors(builder: lambda_http::http::response::Builder) -> lambda_http::http::response::Builder {
    builder
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "authorization, x-client-info, apikey, content-type")
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message }).to_string();
    Ok(with_cors(Response::builder())
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::Text(body))?)
}

fn json_response<T: Serialize>(body: &T) -> Result<Response<Body>, Error> {
    Ok(with_cors(Response::builder())
        .status(200)
        .header("Content-Type", "application/json")
        .body(Body::Text(serde_json::to_string(body)?))?)
}

fn status_for(err: &RiskError) -> u16 {
    match err {
        RiskError::InvalidCoordinate { .. } | RiskError::InvalidScore(_) => 400,
        RiskError::UpstreamFetch { .. } => 502,
        _ => 500,
    }
}

fn risk_error_response(route: &str, err: &RiskError) -> Result<Response<Body>, Error> {
    let status = status_for(err);
    if status >= 500 {
        error!("{} failed: {}", route, err);
    }
    error_response(status, &err.to_string())
}

fn body_text(event: &Request) -> String {
    match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    }
}

/// Route name: last non-empty path segment
fn route(event: &Request) -> String {
    event
        .uri()
        .path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

async fn analyze_location(app: &App, body: &str) -> Result<Response<Body>, Error> {
    let request: LocationRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };
    let analysis = match Coordinate::new(request.latitude, request.longitude) {
        Ok(coordinate) => app.analyzer.analyze(coordinate).await,
        Err(e) => Err(e),
    };
    match analysis {
        Ok(a) => json_response(&a),
        Err(e) => risk_error_response("analyze-location", &e),
    }
}

fn enrich_demographics(app: &App, body: &str) -> Result<Response<Body>, Error> {
    let request: EnrichRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };
    let overall = request.risk_factors.overall_score;
    let enrichment = Coordinate::new(request.latitude, request.longitude).and_then(|coordinate| {
        if !(0.0..=100.0).contains(&overall) {
            return Err(RiskError::InvalidScore(overall));
        }
        let mut rng = seeded_rng(request.seed, 0);
        app.analyzer.enrich(coordinate, overall.round() as u8, &mut rng)
    });
    match enrichment {
        Ok(e) => json_response(&e),
        Err(e) => risk_error_response("enrich-demographics", &e),
    }
}

async fn ingest_satellite_data(app: &App, body: &str) -> Result<Response<Body>, Error> {
    let request: IngestionRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };
    match app.runner.run(&request, Utc::now()).await {
        Ok(summary) => json_response(&summary),
        Err(e) => risk_error_response("ingest-satellite-data", &e),
    }
}

async fn report(app: &App, body: &str) -> Result<Response<Body>, Error> {
    let request: LocationRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };
    let assessment = match Coordinate::new(request.latitude, request.longitude) {
        Ok(coordinate) => app.analyzer.assess(coordinate, request.seed).await,
        Err(e) => Err(e),
    };
    let report = match assessment {
        Ok(a) => a.report,
        Err(e) => return risk_error_response("report", &e),
    };
    let csv = match to_csv_string(&report) {
        Ok(text) => text,
        Err(e) => return risk_error_response("report", &e),
    };
    Ok(with_cors(Response::builder())
        .status(200)
        .header("Content-Type", "text/csv")
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", report.file_name()),
        )
        .body(Body::Text(csv))?)
}

/// Lambda handler function
async fn handler(app: &App, event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();

    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(with_cors(Response::builder()).status(200).body(Body::Empty)?);
    }
    if event.method().as_str() != "POST" {
        return error_response(405, "Method not allowed");
    }

    let body = body_text(&event);
    let route = route(&event);
    let response = match route.as_str() {
        "analyze-location" => analyze_location(app, &body).await,
        "enrich-demographics" => enrich_demographics(app, &body),
        "ingest-satellite-data" => ingest_satellite_data(app, &body).await,
        "report" => report(app, &body).await,
        other => error_response(404, &format!("Unknown route: {}", other)),
    };
    info!("{} handled in {:?}", route, start.elapsed());
    response
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let app = App::from_env()?;
    let app = &app;
    run(service_fn(move |event: Request| async move { handler(app, event).await })).await
}
