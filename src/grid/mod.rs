//! Grid enrichment: ring layout, synthetic demographics and per-point payouts

pub mod demographics;
mod generator;

pub use demographics::{Demographics, UrbanizationClass};
pub use generator::SpatialGridGenerator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exposure::PayoutEstimate;
use crate::hazard::RiskLevel;
use crate::location::Coordinate;

/// Label attached to every grid enrichment response
pub const GRID_DATA_SOURCE: &str = "Modeled based on location analysis and risk factors";

/// One point of an enrichment grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub distance_from_center_km: f64,
    /// 0 for the center point
    pub ring: usize,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub demographics: Demographics,
    pub payout_estimate: PayoutEstimate,
}

impl GridPoint {
    pub fn is_center(&self) -> bool {
        self.ring == 0
    }
}

/// Zone counts over a grid. Bands: high >= 75, medium 50..75, low < 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSummary {
    pub total_points: usize,
    /// Rounded mean risk score
    pub avg_risk: u8,
    pub high_risk_zones: usize,
    pub medium_risk_zones: usize,
    pub low_risk_zones: usize,
}

impl GridSummary {
    pub fn from_points(points: &[GridPoint]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let total: f64 = points.iter().map(|p| p.risk_score as f64).sum();
        let count_where = |pred: fn(u8) -> bool| points.iter().filter(|p| pred(p.risk_score)).count();
        Self {
            total_points: points.len(),
            avg_risk: (total / points.len() as f64).round() as u8,
            high_risk_zones: count_where(|r| r >= 75),
            medium_risk_zones: count_where(|r| (50..75).contains(&r)),
            low_risk_zones: count_where(|r| r < 50),
        }
    }
}

/// Center of an enrichment response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinate> for CenterPoint {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

/// Grid enrichment response payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridEnrichment {
    pub center: CenterPoint,
    pub radius_km: f64,
    pub grid_data: Vec<GridPoint>,
    pub summary: GridSummary,
    pub data_source: String,
    pub timestamp: DateTime<Utc>,
}

impl GridEnrichment {
    pub fn new(center: Coordinate, radius_km: f64, grid_data: Vec<GridPoint>, timestamp: DateTime<Utc>) -> Self {
        let summary = GridSummary::from_points(&grid_data);
        Self {
            center: center.into(),
            radius_km,
            grid_data,
            summary,
            data_source: GRID_DATA_SOURCE.to_string(),
            timestamp,
        }
    }

    /// The ring-0 point, which carries the analysed location's composite score
    pub fn center_point(&self) -> Option<&GridPoint> {
        self.grid_data.iter().find(|p| p.is_center())
    }
}
