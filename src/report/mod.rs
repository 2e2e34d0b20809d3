//! Per-location report: coordinates, hazard scores and payout percentiles

pub mod csv_export;

pub use csv_export::{read_csv, to_csv_string, write_csv};

use serde::{Deserialize, Serialize};

use crate::exposure::PayoutEstimate;
use crate::hazard::HazardScores;
use crate::location::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub latitude: f64,
    pub longitude: f64,
    pub scores: HazardScores,
    /// Exposure estimate of the location's own grid point
    pub payout: PayoutEstimate,
}

impl LocationReport {
    pub fn new(coordinate: Coordinate, scores: HazardScores, payout: PayoutEstimate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            scores,
            payout,
        }
    }

    /// Download name, e.g. `georisk_report_29.7604_-95.3698.csv`
    pub fn file_name(&self) -> String {
        format!("georisk_report_{}_{}.csv", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let report = LocationReport::new(
            Coordinate::new(29.7604, -95.3698).unwrap(),
            HazardScores::from_factors(0, 0, 0, 0),
            PayoutEstimate::default(),
        );
        assert_eq!(report.file_name(), "georisk_report_29.7604_-95.3698.csv");
    }
}
