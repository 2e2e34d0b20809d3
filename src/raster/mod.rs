//! Raster change detection: SAR backscatter change and burn severity
//!
//! Both detectors are single-pass aggregations over pre/post grids of
//! identical shape. Mismatched shapes fail with `DimensionMismatch`.

pub mod artifacts;
mod burn;
mod grid;
mod sar;
pub mod simulate;

pub use artifacts::{vector_artifact, GeoTiffArtifact};
pub use burn::{detect_burn_severity, BurnSeverity, BurnSeverityResult, MultispectralScene, SeverityClasses};
pub use grid::RasterGrid;
pub use sar::{detect_sar_change, SarChangeResult};
pub use simulate::SceneProfile;
