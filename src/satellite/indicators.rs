//! Coarse satellite indicator lattice stored alongside each ingestion
//!
//! A 7×7 lattice spanning ±0.045° (about 5 km) around the location, each
//! point carrying simulated cloud, vegetation (NDVI), water (NDWI) and
//! surface temperature readings plus four derived risk indicators.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::location::Coordinate;

pub const INDICATOR_GRID_SIZE: usize = 7;
pub const INDICATOR_HALF_SPAN_DEG: f64 = 0.045;
pub const INDICATOR_SOURCE: &str = "copernicus-simulated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskIndicators {
    pub flood_risk: u8,
    pub drought_risk: u8,
    pub wildfire_risk: u8,
    pub storm_risk: u8,
}

/// One lattice point, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub acquisition_time: DateTime<Utc>,
    /// Percent
    pub cloud_coverage: f64,
    pub vegetation_index: f64,
    pub water_index: f64,
    /// °C
    pub temperature: f64,
    pub risk_indicators: RiskIndicators,
    pub source: String,
}

fn indicator(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0).round() as u8
}

fn two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Generate the lattice row by row, south-west corner first.
///
/// Per point the random source is consumed in the order cloud, NDVI, NDWI,
/// temperature, storm noise.
pub fn generate_indicator_grid<R: Rng + ?Sized>(
    center: Coordinate,
    acquired_at: DateTime<Utc>,
    rng: &mut R,
) -> Vec<IndicatorPoint> {
    let step = 2.0 * INDICATOR_HALF_SPAN_DEG / (INDICATOR_GRID_SIZE - 1) as f64;
    let mut points = Vec::with_capacity(INDICATOR_GRID_SIZE * INDICATOR_GRID_SIZE);

    for i in 0..INDICATOR_GRID_SIZE {
        for j in 0..INDICATOR_GRID_SIZE {
            let latitude = (center.latitude - INDICATOR_HALF_SPAN_DEG + i as f64 * step).clamp(-90.0, 90.0);
            let longitude = center.longitude - INDICATOR_HALF_SPAN_DEG + j as f64 * step;

            let cloud = rng.gen::<f64>() * 30.0;
            let ndvi = 0.2 + rng.gen::<f64>() * 0.6;
            let ndwi = -0.3 + rng.gen::<f64>() * 0.5;
            let temperature = 15.0 + rng.gen::<f64>() * 15.0;

            let risk_indicators = RiskIndicators {
                flood_risk: indicator((ndwi + 0.3) * 100.0 + (100.0 - cloud) * 0.3),
                drought_risk: indicator((1.0 - ndvi) * 100.0),
                wildfire_risk: indicator(temperature * 2.0 + (1.0 - ndvi) * 50.0),
                storm_risk: indicator(cloud * 2.0 + rng.gen::<f64>() * 30.0),
            };

            points.push(IndicatorPoint {
                latitude,
                longitude,
                acquisition_time: acquired_at,
                cloud_coverage: two_decimals(cloud),
                vegetation_index: two_decimals(ndvi),
                water_index: two_decimals(ndwi),
                temperature: two_decimals(temperature),
                risk_indicators,
                source: INDICATOR_SOURCE.to_string(),
            });
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;
    use approx::assert_abs_diff_eq;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_lattice_layout() {
        let center = Coordinate::new(34.0522, -118.2437).unwrap();
        let points = generate_indicator_grid(center, Utc::now(), &mut seeded_rng(Some(6), 0));
        assert_eq!(points.len(), 49);
        assert_abs_diff_eq!(points[0].latitude, 34.0072, epsilon = 1e-9);
        assert_abs_diff_eq!(points[0].longitude, -118.2887, epsilon = 1e-9);
        assert_abs_diff_eq!(points[48].latitude, 34.0972, epsilon = 1e-9);
        // Middle of the lattice is the center itself
        assert_abs_diff_eq!(points[24].longitude, center.longitude, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_draws() {
        // cloud 0, ndvi 0.2, ndwi -0.3, temp 15, storm noise 0
        let center = Coordinate::new(0.0, 0.0).unwrap();
        let points = generate_indicator_grid(center, Utc::now(), &mut StepRng::new(0, 0));
        let risk = points[0].risk_indicators;
        assert_eq!(risk.flood_risk, 30);
        assert_eq!(risk.drought_risk, 80);
        assert_eq!(risk.wildfire_risk, 70);
        assert_eq!(risk.storm_risk, 0);
        assert_eq!(points[0].source, INDICATOR_SOURCE);
    }

    #[test]
    fn test_readings_in_range() {
        let center = Coordinate::new(29.7604, -95.3698).unwrap();
        for point in generate_indicator_grid(center, Utc::now(), &mut seeded_rng(Some(9), 1)) {
            assert!((0.0..=30.0).contains(&point.cloud_coverage));
            assert!((0.2..=0.8).contains(&point.vegetation_index));
            assert!((-0.3..=0.2).contains(&point.water_index));
            assert!((15.0..=30.0).contains(&point.temperature));
            assert!(point.risk_indicators.storm_risk <= 90);
        }
    }
}
