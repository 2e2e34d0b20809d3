//! Burn severity from pre/post multispectral scenes (NBR and dNBR)
//!
//! ```text
//! nbr  = (nir - swir) / (nir + swir + ε)
//! dnbr = nbr_pre - nbr_post
//! ```
//!
//! Severity classes follow the USGS dNBR scale.

use serde::{Deserialize, Serialize};

use super::RasterGrid;
use crate::config::RasterConfig;
use crate::error::Result;

/// Near- and shortwave-infrared reflectance bands of one acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultispectralScene {
    pub nir: RasterGrid,
    pub swir: RasterGrid,
}

impl MultispectralScene {
    /// Pair two bands, which must share a shape
    pub fn new(nir: RasterGrid, swir: RasterGrid) -> Result<Self> {
        nir.ensure_same_shape(&swir)?;
        Ok(Self { nir, swir })
    }

    /// Normalized Burn Ratio per cell
    pub fn nbr(&self, epsilon: f64) -> Result<RasterGrid> {
        self.nir.zip_map(&self.swir, |nir, swir| (nir - swir) / (nir + swir + epsilon))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnSeverity {
    Unburned,
    Low,
    Moderate,
    High,
}

impl BurnSeverity {
    /// unburned < 0.10 <= low < 0.27 <= moderate < 0.66 <= high
    pub fn classify(dnbr: f64) -> Self {
        if dnbr < 0.10 {
            BurnSeverity::Unburned
        } else if dnbr < 0.27 {
            BurnSeverity::Low
        } else if dnbr < 0.66 {
            BurnSeverity::Moderate
        } else {
            BurnSeverity::High
        }
    }
}

/// Cell counts per severity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeverityClasses {
    pub unburned: usize,
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
}

impl SeverityClasses {
    fn record(&mut self, severity: BurnSeverity) {
        match severity {
            BurnSeverity::Unburned => self.unburned += 1,
            BurnSeverity::Low => self.low += 1,
            BurnSeverity::Moderate => self.moderate += 1,
            BurnSeverity::High => self.high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unburned + self.low + self.moderate + self.high
    }

    pub fn burned(&self) -> usize {
        self.low + self.moderate + self.high
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnSeverityResult {
    #[serde(skip)]
    pub nbr_pre: RasterGrid,
    #[serde(skip)]
    pub nbr_post: RasterGrid,
    #[serde(skip)]
    pub dnbr: RasterGrid,
    pub severity_classes: SeverityClasses,
    pub total_burned_area_km2: f64,
    /// Mean dNBR over all cells
    pub mean_dnbr: f64,
}

impl BurnSeverityResult {
    pub fn burned_percentage(&self) -> f64 {
        let total = self.severity_classes.total();
        if total == 0 {
            0.0
        } else {
            100.0 * self.severity_classes.burned() as f64 / total as f64
        }
    }
}

/// Compute NBR for both scenes, their difference and the class tallies
pub fn detect_burn_severity(
    pre: &MultispectralScene,
    post: &MultispectralScene,
    config: &RasterConfig,
) -> Result<BurnSeverityResult> {
    pre.nir.ensure_same_shape(&post.nir)?;
    let nbr_pre = pre.nbr(config.nbr_epsilon)?;
    let nbr_post = post.nbr(config.nbr_epsilon)?;
    let dnbr = nbr_pre.zip_map(&nbr_post, |before, after| before - after)?;

    let mut classes = SeverityClasses::default();
    let mut sum = 0.0;
    for &value in dnbr.values() {
        classes.record(BurnSeverity::classify(value));
        sum += value;
    }
    let mean_dnbr = if dnbr.is_empty() { 0.0 } else { sum / dnbr.len() as f64 };

    Ok(BurnSeverityResult {
        total_burned_area_km2: classes.burned() as f64 * config.pixel_area_km2,
        severity_classes: classes,
        mean_dnbr,
        nbr_pre,
        nbr_post,
        dnbr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskError;
    use approx::assert_relative_eq;

    fn uniform_scene(size: usize, nir: f64, swir: f64) -> MultispectralScene {
        MultispectralScene::new(
            RasterGrid::from_fn(size, size, |_, _| nir).unwrap(),
            RasterGrid::from_fn(size, size, |_, _| swir).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_classification_edges() {
        assert_eq!(BurnSeverity::classify(-0.4), BurnSeverity::Unburned);
        assert_eq!(BurnSeverity::classify(0.0999), BurnSeverity::Unburned);
        assert_eq!(BurnSeverity::classify(0.10), BurnSeverity::Low);
        assert_eq!(BurnSeverity::classify(0.27), BurnSeverity::Moderate);
        assert_eq!(BurnSeverity::classify(0.6599), BurnSeverity::Moderate);
        assert_eq!(BurnSeverity::classify(0.66), BurnSeverity::High);
    }

    #[test]
    fn test_unchanged_scene_is_unburned() {
        let scene = uniform_scene(10, 0.5, 0.2);
        let result = detect_burn_severity(&scene, &scene.clone(), &RasterConfig::default()).unwrap();
        assert_eq!(result.severity_classes.unburned, 100);
        assert_eq!(result.total_burned_area_km2, 0.0);
        assert_eq!(result.mean_dnbr, 0.0);
    }

    #[test]
    fn test_healthy_to_burned_is_high_severity() {
        // NBR 0.6 before, about -0.5 after
        let pre = uniform_scene(4, 0.6, 0.15);
        let post = uniform_scene(4, 0.1, 0.3);
        let result = detect_burn_severity(&pre, &post, &RasterConfig::default()).unwrap();
        assert_eq!(result.severity_classes.high, 16);
        assert_relative_eq!(result.total_burned_area_km2, 16.0 * 0.0001, epsilon = 1e-12);
        assert_relative_eq!(result.burned_percentage(), 100.0);
        let expected = 0.45 / (0.75 + 1e-4) - (-0.2) / (0.4 + 1e-4);
        assert_relative_eq!(result.mean_dnbr, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_grids_are_returned() {
        let pre = uniform_scene(3, 0.6, 0.15);
        let post = uniform_scene(3, 0.1, 0.3);
        let result = detect_burn_severity(&pre, &post, &RasterConfig::default()).unwrap();
        assert_eq!(result.nbr_pre, pre.nbr(1e-4).unwrap());
        assert_eq!(result.nbr_post, post.nbr(1e-4).unwrap());
        assert_eq!((result.dnbr.rows(), result.dnbr.cols()), (3, 3));
        for (&d, (&a, &b)) in result
            .dnbr
            .values()
            .iter()
            .zip(result.nbr_pre.values().iter().zip(result.nbr_post.values()))
        {
            assert_eq!(d, a - b);
        }
    }

    #[test]
    fn test_partition_is_exhaustive() {
        let pre = MultispectralScene::new(
            RasterGrid::from_fn(20, 20, |r, c| 0.2 + ((r * 20 + c) % 17) as f64 * 0.03).unwrap(),
            RasterGrid::from_fn(20, 20, |r, _| 0.1 + (r % 5) as f64 * 0.02).unwrap(),
        )
        .unwrap();
        let post = MultispectralScene::new(
            RasterGrid::from_fn(20, 20, |r, c| 0.1 + ((r + c) % 9) as f64 * 0.05).unwrap(),
            RasterGrid::from_fn(20, 20, |_, c| 0.1 + (c % 7) as f64 * 0.05).unwrap(),
        )
        .unwrap();
        let result = detect_burn_severity(&pre, &post, &RasterConfig::default()).unwrap();
        assert_eq!(result.severity_classes.total(), 400);
    }

    #[test]
    fn test_zero_reflectance_does_not_divide_by_zero() {
        let dark = uniform_scene(3, 0.0, 0.0);
        let result = detect_burn_severity(&dark, &dark.clone(), &RasterConfig::default()).unwrap();
        assert!(result.mean_dnbr.is_finite());
    }

    #[test]
    fn test_mismatched_scenes() {
        let small = uniform_scene(3, 0.5, 0.2);
        let large = uniform_scene(4, 0.5, 0.2);
        assert!(matches!(
            detect_burn_severity(&small, &large, &RasterConfig::default()),
            Err(RiskError::DimensionMismatch { .. })
        ));
        let bands = MultispectralScene::new(
            RasterGrid::from_fn(3, 3, |_, _| 0.1).unwrap(),
            RasterGrid::from_fn(3, 2, |_, _| 0.1).unwrap(),
        );
        assert!(bands.is_err());
    }
}
