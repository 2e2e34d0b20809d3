//! GeoRisk - climate hazard scoring and geospatial exposure engine
//!
//! This library provides:
//! - Hazard scoring (flood, wildfire, storm, drought) from weather and elevation
//! - Concentric-ring enrichment grids with synthetic demographics and payouts
//! - SAR backscatter change and burn severity (dNBR) detection
//! - Satellite ingestion runs with catalog lookup and simulated fallback
//! - CSV report export

pub mod analysis;
pub mod config;
pub mod error;
pub mod exposure;
pub mod grid;
pub mod hazard;
pub mod location;
pub mod raster;
pub mod report;
pub mod rng;
pub mod satellite;
pub mod storage;
pub mod weather;

// Re-export commonly used types
pub use analysis::{Assessment, LocationAnalysis, LocationAnalyzer};
pub use config::EngineConfig;
pub use error::{Result, RiskError};
pub use exposure::{ExposureModel, PayoutEstimate};
pub use grid::{GridEnrichment, GridPoint, SpatialGridGenerator, UrbanizationClass};
pub use hazard::{HazardKind, HazardScorer, HazardScores, RiskLevel};
pub use location::{Coordinate, NamedLocation};
pub use raster::{detect_burn_severity, detect_sar_change, RasterGrid};
pub use report::LocationReport;
pub use satellite::{IngestionRequest, IngestionRunner, IngestionSummary};
pub use weather::{OpenMeteoClient, WeatherSample, WeatherSource};
