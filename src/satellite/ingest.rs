//! Satellite ingestion run: acquire scenes, detect change, persist results
//!
//! Scene acquisition is async (catalog I/O). Once every plan is known the
//! CPU-bound analyses run in parallel with rayon on tokio's blocking pool,
//! each with its own random stream so seeded runs stay reproducible. A failing analysis is logged
//! and skipped; the run still reports everything that did complete.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::acquisition::{AcquisitionPlan, RasterAcquirer};
use super::catalog::{Mission, TimeWindow};
use super::indicators::generate_indicator_grid;
use crate::config::RasterConfig;
use crate::error::{Result, RiskError};
use crate::location::{default_locations, Coordinate, NamedLocation};
use crate::raster::artifacts::{GEOJSON_CONTENT_TYPE, GEOTIFF_CONTENT_TYPE};
use crate::raster::{detect_burn_severity, detect_sar_change, vector_artifact, GeoTiffArtifact, SeverityClasses};
use crate::rng::seeded_rng;
use crate::storage::{AnalysisSink, GeospatialAnalysisRecord};

/// Days searched before "now" for SAR flood change
pub const SAR_WINDOW_DAYS: i64 = 30;
/// Days searched before "now" for burn severity
pub const BURN_WINDOW_DAYS: i64 = 14;

/// Random stream offset for indicator lattices, kept clear of analysis streams
const INDICATOR_STREAM_BASE: u64 = 1 << 32;

/// Which raster analyses to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    #[default]
    All,
    SarChangeDetection,
    BurnSeverity,
}

impl AnalysisKind {
    pub fn includes_sar(&self) -> bool {
        matches!(self, AnalysisKind::All | AnalysisKind::SarChangeDetection)
    }

    pub fn includes_burn(&self) -> bool {
        matches!(self, AnalysisKind::All | AnalysisKind::BurnSeverity)
    }
}

impl std::str::FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(AnalysisKind::All),
            "sar_change_detection" | "sar" => Ok(AnalysisKind::SarChangeDetection),
            "burn_severity" | "burn" => Ok(AnalysisKind::BurnSeverity),
            other => Err(format!("unknown analysis type: {other}")),
        }
    }
}

/// Location entry in an ingestion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_trigger() -> String {
    "manual".to_string()
}

fn default_source() -> String {
    "api".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    #[serde(default = "default_trigger")]
    pub trigger: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub locations: Option<Vec<LocationInput>>,
    #[serde(default)]
    pub analysis_type: AnalysisKind,
}

impl Default for IngestionRequest {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            source: default_source(),
            latitude: None,
            longitude: None,
            locations: None,
            analysis_type: AnalysisKind::All,
        }
    }
}

impl IngestionRequest {
    /// Explicit locations, else the single custom coordinate, else the defaults
    pub fn resolve_locations(&self) -> Result<Vec<NamedLocation>> {
        if let Some(inputs) = &self.locations {
            return inputs
                .iter()
                .map(|input| {
                    let coordinate = Coordinate::new(input.lat, input.lng)?;
                    Ok(match &input.name {
                        Some(name) => NamedLocation::new(name.clone(), coordinate),
                        None => NamedLocation::new(format!("{}, {}", input.lat, input.lng), coordinate),
                    })
                })
                .collect();
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Ok(vec![NamedLocation::custom(Coordinate::new(lat, lng)?)]),
            _ => Ok(default_locations()),
        }
    }
}

/// Per-analysis entry of the run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AnalysisOutcome {
    SarChangeDetection {
        location: String,
        flood_extent: f64,
        geotiff_url: String,
        shapefile_url: String,
    },
    BurnSeverity {
        location: String,
        burned_area: f64,
        severity_classes: SeverityClasses,
        geotiff_url: String,
        shapefile_url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSummary {
    pub success: bool,
    pub message: String,
    pub trigger: String,
    pub source: String,
    pub locations_processed: usize,
    pub analyses_completed: usize,
    pub results: Vec<AnalysisOutcome>,
    pub timestamp: DateTime<Utc>,
}

/// One analysis to compute: a location paired with its acquisition plan
#[derive(Debug, Clone)]
struct Job {
    location: NamedLocation,
    plan: AcquisitionPlan,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Drives a full ingestion run against a sink
pub struct IngestionRunner {
    acquirer: RasterAcquirer,
    worker: AnalysisWorker,
}

impl IngestionRunner {
    pub fn new(raster: RasterConfig, acquirer: RasterAcquirer, sink: Arc<dyn AnalysisSink>) -> Self {
        Self {
            acquirer,
            worker: AnalysisWorker { raster, sink, seed: None },
        }
    }

    /// Make simulated scenes and indicator lattices reproducible
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.worker.seed = seed;
        self
    }

    pub async fn run(&self, request: &IngestionRequest, now: DateTime<Utc>) -> Result<IngestionSummary> {
        let locations = request.resolve_locations()?;
        info!(
            "Satellite ingestion triggered by {} (source: {}), analysis type {:?}, {} locations",
            request.trigger,
            request.source,
            request.analysis_type,
            locations.len()
        );

        let mut jobs = Vec::new();
        for location in &locations {
            if request.analysis_type.includes_sar() {
                let window = TimeWindow::ending_at(now, SAR_WINDOW_DAYS);
                let plan = self.acquirer.plan(Mission::Sentinel1, location.coordinate, window).await;
                jobs.push(Job { location: location.clone(), plan });
            }
            if request.analysis_type.includes_burn() {
                let window = TimeWindow::ending_at(now, BURN_WINDOW_DAYS);
                let plan = self.acquirer.plan(Mission::Sentinel2, location.coordinate, window).await;
                jobs.push(Job { location: location.clone(), plan });
            }
        }

        let locations_processed = locations.len();
        let worker = self.worker.clone();
        let results = tokio::task::spawn_blocking(move || worker.execute(&jobs, &locations, now))
            .await
            .map_err(|e| RiskError::Task(e.to_string()))?;

        let summary = IngestionSummary {
            success: true,
            message: "Geospatial analysis complete".to_string(),
            trigger: request.trigger.clone(),
            source: request.source.clone(),
            locations_processed,
            analyses_completed: results.len(),
            results,
            timestamp: now,
        };
        info!(
            "Ingestion summary: {} locations processed, {} analyses completed",
            summary.locations_processed, summary.analyses_completed
        );
        Ok(summary)
    }
}

/// CPU-bound half of a run: scene analysis, artifacts and indicator lattices
#[derive(Clone)]
struct AnalysisWorker {
    raster: RasterConfig,
    sink: Arc<dyn AnalysisSink>,
    seed: Option<u64>,
}

impl AnalysisWorker {
    /// Blocking; runs every job and lattice on the rayon pool
    fn execute(&self, jobs: &[Job], locations: &[NamedLocation], now: DateTime<Utc>) -> Vec<AnalysisOutcome> {
        let results: Vec<AnalysisOutcome> = jobs
            .par_iter()
            .enumerate()
            .filter_map(|(index, job)| match self.process(job, index as u64, now) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    error!(
                        "{} analysis failed for {}: {}",
                        job.plan.mission.collection(),
                        job.location.name,
                        e
                    );
                    None
                }
            })
            .collect();

        locations.par_iter().enumerate().for_each(|(index, location)| {
            let mut rng = seeded_rng(self.seed, INDICATOR_STREAM_BASE + index as u64);
            let points = generate_indicator_grid(location.coordinate, now, &mut rng);
            match self.sink.insert_indicators(&points) {
                Ok(()) => info!("Inserted {} satellite data points for {}", points.len(), location.name),
                Err(e) => error!("Failed to insert satellite data for {}: {}", location.name, e),
            }
        });

        results
    }

    fn process(&self, job: &Job, stream: u64, now: DateTime<Utc>) -> Result<AnalysisOutcome> {
        let mut rng = seeded_rng(self.seed, stream);
        let center = job.location.coordinate;
        let size = self.raster.grid_size;
        let stamp = now.timestamp_millis();
        let metadata = job.plan.metadata();

        let (analysis_type, raster_name, vector_name, grid, threshold, area_km2, classes, analysis_results) = match job.plan.mission {
            Mission::Sentinel1 => {
                let (pre, post) = job.plan.sar_scenes(size, &mut rng)?;
                let result = detect_sar_change(&pre, &post, &self.raster)?;
                info!(
                    "SAR change detection for {}: {:.2}% changed, {:.2} km² flood extent",
                    job.location.name, result.change_percentage, result.flood_extent_km2
                );
                let grid = result.change_grid;
                let results = serde_json::json!({
                    "changePercentage": round2(result.change_percentage),
                    "meanBackscatterChange": round2(result.mean_backscatter_change),
                    "floodExtent": round2(result.flood_extent_km2),
                    "floodExtentUnit": "km²",
                    "metadata": metadata,
                });
                (
                    "sar_change_detection",
                    "sar_change_detection",
                    "flood_extent",
                    grid,
                    self.raster.sar_vector_threshold,
                    round2(result.flood_extent_km2),
                    None,
                    results,
                )
            }
            Mission::Sentinel2 => {
                let (pre, post) = job.plan.multispectral_scenes(size, &mut rng)?;
                let result = detect_burn_severity(&pre, &post, &self.raster)?;
                info!(
                    "Burn severity for {}: {:.2} km² burned (low {}, moderate {}, high {})",
                    job.location.name,
                    result.total_burned_area_km2,
                    result.severity_classes.low,
                    result.severity_classes.moderate,
                    result.severity_classes.high
                );
                let grid = result.dnbr;
                let results = serde_json::json!({
                    "totalBurnedArea": round2(result.total_burned_area_km2),
                    "burnedAreaUnit": "km²",
                    "severityClasses": result.severity_classes,
                    "metadata": metadata,
                });
                (
                    "burn_severity",
                    "burn_severity_dnbr",
                    "burned_area_extent",
                    grid,
                    self.raster.burn_vector_threshold,
                    round2(result.total_burned_area_km2),
                    Some(result.severity_classes),
                    results,
                )
            }
        };

        let file_stem = |kind: &str| format!("{kind}_{}_{}_{stamp}", center.latitude, center.longitude);

        let geotiff = GeoTiffArtifact::from_grid(&grid, center, raster_name, &self.raster);
        let geotiff_url = self.sink.store_artifact(
            &format!("{}.json", file_stem(raster_name)),
            GEOTIFF_CONTENT_TYPE,
            &geotiff.to_bytes()?,
        )?;

        let vectors = vector_artifact(&grid, center, threshold, vector_name, &self.raster);
        let shapefile_url = self.sink.store_artifact(
            &format!("{}.geojson", file_stem(vector_name)),
            GEOJSON_CONTENT_TYPE,
            &serde_json::to_vec(&vectors)?,
        )?;

        let bbox = center.bounding_box(self.raster.bbox_half_width_deg);
        let record = GeospatialAnalysisRecord {
            analysis_type: analysis_type.to_string(),
            location_name: job.location.name.clone(),
            center_latitude: center.latitude,
            center_longitude: center.longitude,
            bbox_north: bbox.north,
            bbox_south: bbox.south,
            bbox_east: bbox.east,
            bbox_west: bbox.west,
            acquisition_date_pre: metadata.pre_date.clone().unwrap_or_else(|| job.plan.window.start.to_rfc3339()),
            acquisition_date_post: metadata.post_date.clone().unwrap_or_else(|| job.plan.window.end.to_rfc3339()),
            satellite_source: metadata.source.clone(),
            analysis_results,
            geotiff_url: geotiff_url.clone(),
            shapefile_url: shapefile_url.clone(),
            processing_status: "completed".to_string(),
        };
        self.sink.insert_analysis(&record)?;

        let location = job.location.name.clone();
        Ok(match classes {
            None => AnalysisOutcome::SarChangeDetection {
                location,
                flood_extent: area_km2,
                geotiff_url,
                shapefile_url,
            },
            Some(severity_classes) => AnalysisOutcome::BurnSeverity {
                location,
                burned_area: area_km2,
                severity_classes,
                geotiff_url,
                shapefile_url,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskError;
    use crate::satellite::acquisition::tests::{product, FakeCatalog};
    use crate::storage::MemorySink;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap()
    }

    fn offline_runner(sink: Arc<MemorySink>) -> IngestionRunner {
        IngestionRunner::new(RasterConfig::default(), RasterAcquirer::offline(), sink).with_seed(Some(42))
    }

    #[test]
    fn test_request_defaults_and_locations() {
        let request: IngestionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.analysis_type, AnalysisKind::All);
        assert_eq!(request.resolve_locations().unwrap().len(), 2);

        let custom: IngestionRequest =
            serde_json::from_str(r#"{"latitude": 25.76, "longitude": -80.19, "analysisType": "burn_severity"}"#)
                .unwrap();
        let locations = custom.resolve_locations().unwrap();
        assert_eq!(locations[0].name, "Custom Location");
        assert!(!custom.analysis_type.includes_sar());

        let bad: IngestionRequest = serde_json::from_str(r#"{"locations": [{"lat": 95.0, "lng": 0.0}]}"#).unwrap();
        assert!(matches!(bad.resolve_locations(), Err(RiskError::InvalidCoordinate { .. })));
    }

    #[tokio::test]
    async fn test_offline_run_persists_everything() {
        let sink = Arc::new(MemorySink::new());
        let summary = offline_runner(sink.clone())
            .run(&IngestionRequest::default(), now())
            .await
            .unwrap();

        assert!(summary.success);
        assert_eq!(summary.locations_processed, 2);
        assert_eq!(summary.analyses_completed, 4);
        assert_eq!(sink.analyses().len(), 4);
        assert_eq!(sink.artifact_count(), 8);
        assert_eq!(sink.indicators().len(), 98);

        for record in sink.analyses() {
            assert_eq!(record.satellite_source, "simulated");
            assert_eq!(record.processing_status, "completed");
            assert_eq!(record.acquisition_date_post, now().to_rfc3339());
            assert!((record.bbox_north - record.bbox_south - 0.1).abs() < 1e-9);
        }

        let sar = sink
            .analyses()
            .into_iter()
            .find(|r| r.analysis_type == "sar_change_detection")
            .unwrap();
        let pct = sar.analysis_results["changePercentage"].as_f64().unwrap();
        assert!((15.0..25.0).contains(&pct));
    }

    #[tokio::test]
    async fn test_seeded_runs_match() {
        let request = IngestionRequest {
            analysis_type: AnalysisKind::BurnSeverity,
            ..IngestionRequest::default()
        };
        let a = offline_runner(Arc::new(MemorySink::new())).run(&request, now()).await.unwrap();
        let b = offline_runner(Arc::new(MemorySink::new())).run(&request, now()).await.unwrap();
        assert_eq!(a.results, b.results);
        assert_eq!(a.analyses_completed, 2);
    }

    #[tokio::test]
    async fn test_catalog_backed_run_tags_source() {
        let catalog = FakeCatalog {
            pre: vec![product("S2A_pre", Some(5.0))],
            post: vec![product("S2A_post", Some(20.0))],
            fail: false,
        };
        let acquirer = RasterAcquirer::new(Some(Arc::new(catalog)), 0.05);
        let sink = Arc::new(MemorySink::new());
        let runner = IngestionRunner::new(RasterConfig::default(), acquirer, sink.clone()).with_seed(Some(1));
        let request = IngestionRequest {
            analysis_type: AnalysisKind::BurnSeverity,
            latitude: Some(34.0522),
            longitude: Some(-118.2437),
            ..IngestionRequest::default()
        };
        runner.run(&request, now()).await.unwrap();

        let record = &sink.analyses()[0];
        assert_eq!(record.satellite_source, "copernicus-sentinel-2");
        assert_eq!(record.analysis_results["metadata"]["preProduct"], "S2A_pre");
        assert_eq!(record.acquisition_date_pre, "2026-10-01T16:00:00+00:00");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_analysis_runs_off_the_async_thread() {
        let sink = Arc::new(MemorySink::new());
        let runner = offline_runner(sink.clone());
        let request = IngestionRequest {
            analysis_type: AnalysisKind::SarChangeDetection,
            ..IngestionRequest::default()
        };
        let summary = runner.run(&request, now()).await.unwrap();
        assert_eq!(summary.analyses_completed, 2);

        // The blocking half is usable on its own, outside any runtime
        let locations = request.resolve_locations().unwrap();
        let jobs: Vec<Job> = locations
            .iter()
            .map(|location| Job {
                location: location.clone(),
                plan: AcquisitionPlan::simulated(Mission::Sentinel1, TimeWindow::ending_at(now(), SAR_WINDOW_DAYS)),
            })
            .collect();
        let direct = std::thread::spawn(move || runner.worker.execute(&jobs, &locations, now()))
            .join()
            .unwrap();
        assert_eq!(direct, summary.results);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = AnalysisOutcome::SarChangeDetection {
            location: "Houston, TX".into(),
            flood_extent: 0.05,
            geotiff_url: "a".into(),
            shapefile_url: "b".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["type"], "sar_change_detection");
        assert_eq!(json["floodExtent"], 0.05);
        assert_eq!(json["geotiffUrl"], "a");
    }
}
