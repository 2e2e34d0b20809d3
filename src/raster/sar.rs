//! SAR backscatter change detection
//!
//! A cell is flagged as inundated when its backscatter drops by more than
//! the configured threshold between the pre and post acquisitions.

use serde::{Deserialize, Serialize};

use super::RasterGrid;
use crate::config::RasterConfig;
use crate::error::Result;

/// Aggregate flood-change metrics for one pre/post pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarChangeResult {
    /// Per-cell `post - pre` in dB
    #[serde(skip)]
    pub change_grid: RasterGrid,
    pub changed_pixels: usize,
    pub total_pixels: usize,
    pub change_percentage: f64,
    /// Mean delta over changed cells only, 0 when none changed
    pub mean_backscatter_change: f64,
    pub flood_extent_km2: f64,
}

/// Compare two backscatter grids cell by cell
pub fn detect_sar_change(pre: &RasterGrid, post: &RasterGrid, config: &RasterConfig) -> Result<SarChangeResult> {
    let change = post.zip_map(pre, |after, before| after - before)?;

    let (changed_pixels, changed_sum) = change
        .values()
        .iter()
        .filter(|&&delta| delta < config.sar_change_threshold_db)
        .fold((0usize, 0.0f64), |(n, sum), &delta| (n + 1, sum + delta));

    let total_pixels = change.len();
    let change_percentage = if total_pixels == 0 {
        0.0
    } else {
        100.0 * changed_pixels as f64 / total_pixels as f64
    };
    let mean_backscatter_change = if changed_pixels == 0 {
        0.0
    } else {
        changed_sum / changed_pixels as f64
    };

    Ok(SarChangeResult {
        change_grid: change,
        changed_pixels,
        total_pixels,
        change_percentage,
        mean_backscatter_change,
        flood_extent_km2: changed_pixels as f64 * config.pixel_area_km2,
    })
}
