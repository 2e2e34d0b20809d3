//! Satellite product search contract

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::location::BoundingBox;

/// Sentinel missions the ingestion run searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mission {
    /// C-band SAR, used for flood change detection
    Sentinel1,
    /// Multispectral imager, used for burn severity
    Sentinel2,
}

impl Mission {
    /// STAC collection id
    pub fn collection(&self) -> &'static str {
        match self {
            Mission::Sentinel1 => "SENTINEL-1",
            Mission::Sentinel2 => "SENTINEL-2",
        }
    }

    /// Source tag recorded for scenes backed by catalog hits
    pub fn source_tag(&self) -> &'static str {
        match self {
            Mission::Sentinel1 => "copernicus-sentinel-1",
            Mission::Sentinel2 => "copernicus-sentinel-2",
        }
    }
}

/// Catalog entry for one acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    pub id: String,
    pub acquired_at: Option<DateTime<Utc>>,
    /// Percent, multispectral products only
    pub cloud_cover: Option<f64>,
    /// "ascending" or "descending", SAR products only
    pub orbit_state: Option<String>,
}

/// Closed time interval searched in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The `days` days leading up to `end`
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }

    /// Pre-event and post-event halves
    pub fn split(&self) -> (TimeWindow, TimeWindow) {
        let mid = self.midpoint();
        (
            TimeWindow { start: self.start, end: mid },
            TimeWindow { start: mid, end: self.end },
        )
    }

    /// STAC `datetime` interval, `start/end` in RFC 3339
    pub fn to_stac_interval(&self) -> String {
        format!("{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Searchable archive of satellite products
#[async_trait]
pub trait SatelliteCatalog: Send + Sync {
    fn name(&self) -> &str;

    /// Products of `mission` intersecting `bbox` within `window`, best first
    async fn search(&self, mission: Mission, bbox: &BoundingBox, window: &TimeWindow) -> Result<Vec<ProductDescriptor>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_split_at_midpoint() {
        let end = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap();
        let window = TimeWindow::ending_at(end, 30);
        let (pre, post) = window.split();
        assert_eq!(pre.start, Utc.with_ymd_and_hms(2026, 9, 17, 0, 0, 0).unwrap());
        assert_eq!(pre.end, Utc.with_ymd_and_hms(2026, 10, 2, 0, 0, 0).unwrap());
        assert_eq!(pre.end, post.start);
        assert_eq!(post.end, end);
    }

    #[test]
    fn test_stac_interval() {
        let end = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let window = TimeWindow::ending_at(end, 14);
        assert_eq!(
            window.to_stac_interval(),
            "2026-10-03T12:00:00+00:00/2026-10-17T12:00:00+00:00"
        );
    }
}
