//! Concentric-ring grid of risk, demographic and payout estimates
//!
//! Ring 0 is the analysed location itself and carries the composite score
//! unchanged. Every other point gets the composite score shifted by a
//! regional sin/cos term and a uniform local term:
//!
//! ```text
//! risk = clamp(0, 100, overall + A·sin(10·lat) + A·cos(10·lng) + U·(u − 0.5))
//! ```
//!
//! The shift does not decay with distance from the center. The reported
//! `riskScore` is rounded; level and payout use the unrounded value.

use std::f64::consts::PI;

use log::debug;
use rand::Rng;

use super::demographics;
use super::GridPoint;
use crate::config::GridConfig;
use crate::error::{Result, RiskError};
use crate::exposure::ExposureModel;
use crate::hazard::RiskLevel;
use crate::location::Coordinate;

/// Builds [`GridPoint`]s around a center coordinate
#[derive(Debug, Clone)]
pub struct SpatialGridGenerator {
    config: GridConfig,
    exposure: ExposureModel,
}

impl SpatialGridGenerator {
    pub fn new(config: GridConfig, exposure: ExposureModel) -> Self {
        Self { config, exposure }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Generate the full grid, center first, then ring by ring.
    ///
    /// Per point the random source is consumed in a fixed order (risk noise,
    /// density, median age, income), so a seeded source always yields the
    /// same grid.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        center: Coordinate,
        overall_score: u8,
        rng: &mut R,
    ) -> Result<Vec<GridPoint>> {
        if overall_score > 100 {
            return Err(RiskError::InvalidScore(overall_score as f64));
        }

        let mut points = Vec::with_capacity(self.config.total_points());
        points.push(self.point(center, 0, 0.0, overall_score as f64, rng)?);

        for (index, &count) in self.config.ring_point_counts.iter().enumerate() {
            let ring = index + 1;
            let radius = self.config.ring_radius_km(ring);
            for i in 0..count {
                let theta = 2.0 * PI * i as f64 / count as f64;
                let position = center.offset_km(radius * theta.cos(), radius * theta.sin());
                let risk = self.regional_risk(&position, overall_score, rng);
                points.push(self.point(position, ring, radius, risk, rng)?);
            }
        }

        debug!(
            "generated {} grid points around ({:.4}, {:.4})",
            points.len(),
            center.latitude,
            center.longitude
        );
        Ok(points)
    }

    /// Composite score shifted by regional and local variation, clamped but
    /// not rounded. Draws one value.
    fn regional_risk<R: Rng + ?Sized>(&self, position: &Coordinate, overall_score: u8, rng: &mut R) -> f64 {
        let a = self.config.regional_amplitude;
        let regional = a * (position.latitude * 10.0).sin() + a * (position.longitude * 10.0).cos();
        let local = self.config.random_amplitude * (rng.gen::<f64>() - 0.5);
        (overall_score as f64 + regional + local).clamp(0.0, 100.0)
    }

    fn point<R: Rng + ?Sized>(
        &self,
        position: Coordinate,
        ring: usize,
        distance_km: f64,
        risk: f64,
        rng: &mut R,
    ) -> Result<GridPoint> {
        let demographics = demographics::estimate(&position, rng);
        let payout_estimate = self.exposure.estimate(
            risk,
            demographics.population_density,
            demographics.urbanization_class,
        )?;
        Ok(GridPoint {
            latitude: position.latitude,
            longitude: position.longitude,
            distance_from_center_km: distance_km,
            ring,
            risk_score: risk.round() as u8,
            risk_level: RiskLevel::from_score(risk),
            demographics,
            payout_estimate,
        })
    }
}

impl Default for SpatialGridGenerator {
    fn default() -> Self {
        Self::new(GridConfig::default(), ExposureModel::default())
    }
}
