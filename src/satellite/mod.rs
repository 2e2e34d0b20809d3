//! Satellite product search, scene acquisition and the ingestion run

pub mod acquisition;
pub mod catalog;
pub mod copernicus;
pub mod indicators;
pub mod ingest;

pub use acquisition::{AcquisitionMetadata, AcquisitionPlan, RasterAcquirer};
pub use catalog::{Mission, ProductDescriptor, SatelliteCatalog, TimeWindow};
pub use copernicus::CopernicusCatalog;
pub use indicators::{generate_indicator_grid, IndicatorPoint, RiskIndicators};
pub use ingest::{AnalysisKind, AnalysisOutcome, IngestionRequest, IngestionRunner, IngestionSummary, LocationInput};
