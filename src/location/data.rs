//! Geographic input types validated at the boundary

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Approximate kilometres per degree of latitude
pub const KM_PER_DEGREE: f64 = 111.0;

/// A validated WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Unchecked wire form; deserialization goes through [`Coordinate::new`]
#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = RiskError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting NaN and out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lng_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lng_ok {
            return Err(RiskError::InvalidCoordinate { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    /// Move by a ground offset in kilometres (north, east).
    ///
    /// Latitude saturates at the poles and longitude wraps across the
    /// antimeridian, so the result is always a valid coordinate.
    pub fn offset_km(&self, north_km: f64, east_km: f64) -> Self {
        let latitude = (self.latitude + north_km / KM_PER_DEGREE).clamp(-90.0, 90.0);
        // Keep longitudinal scaling finite near the poles
        let cos_lat = self.latitude.to_radians().cos().max(0.01);
        let mut longitude = self.longitude + east_km / (KM_PER_DEGREE * cos_lat);
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }
        Self { latitude, longitude: longitude.clamp(-180.0, 180.0) }
    }

    /// Square box of `half_width_deg` degrees around this point
    pub fn bounding_box(&self, half_width_deg: f64) -> BoundingBox {
        BoundingBox {
            north: self.latitude + half_width_deg,
            south: self.latitude - half_width_deg,
            east: self.longitude + half_width_deg,
            west: self.longitude - half_width_deg,
        }
    }
}

/// Axis-aligned box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// STAC ordering: [west, south, east, north]
    pub fn to_stac(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

/// A coordinate with a display name, used for batch and ingestion runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLocation {
    pub name: String,
    pub coordinate: Coordinate,
}

impl NamedLocation {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self { name: name.into(), coordinate }
    }

    /// Name shown for ad-hoc coordinates
    pub fn custom(coordinate: Coordinate) -> Self {
        Self::new("Custom Location", coordinate)
    }
}

/// Locations analysed when a run names none: one flood-prone, one wildfire-prone
pub fn default_locations() -> Vec<NamedLocation> {
    vec![
        NamedLocation::new(
            "Houston, TX",
            Coordinate { latitude: 29.7604, longitude: -95.3698 },
        ),
        NamedLocation::new(
            "Los Angeles, CA",
            Coordinate { latitude: 34.0522, longitude: -118.2437 },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Coordinate = serde_json::from_str(r#"{"latitude": 29.7604, "longitude": -95.3698}"#).unwrap();
        assert_eq!(ok, Coordinate::new(29.7604, -95.3698).unwrap());

        let err = serde_json::from_str::<Coordinate>(r#"{"latitude": 95.0, "longitude": 0.0}"#).unwrap_err();
        assert!(err.to_string().contains("invalid coordinate"));
        assert!(serde_json::from_str::<Coordinate>(r#"{"latitude": 0.0, "longitude": 200.0}"#).is_err());
    }

    #[test]
    fn test_offset_north_one_degree() {
        let c = Coordinate::new(10.0, 20.0).unwrap();
        let moved = c.offset_km(KM_PER_DEGREE, 0.0);
        assert_abs_diff_eq!(moved.latitude, 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(moved.longitude, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_offset_stays_valid_near_edges() {
        let c = Coordinate::new(89.99, 179.99).unwrap();
        let moved = c.offset_km(5.0, 5.0);
        assert!(Coordinate::new(moved.latitude, moved.longitude).is_ok());
        assert!(moved.longitude < 0.0, "should wrap across the antimeridian");
    }

    #[test]
    fn test_bounding_box() {
        let c = Coordinate::new(29.7604, -95.3698).unwrap();
        let bbox = c.bounding_box(0.05);
        assert_abs_diff_eq!(bbox.north - bbox.south, 0.1, epsilon = 1e-12);
        assert_eq!(bbox.to_stac()[0], bbox.west);
    }
}
