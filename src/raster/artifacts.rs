//! Exportable raster ("GeoTIFF") and vector ("Shapefile") artifacts
//!
//! Both are lightweight JSON stand-ins for the real formats: the raster
//! artifact is a JSON document carrying georeferencing and the cell values,
//! the vector artifact is a GeoJSON FeatureCollection of pixel squares.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};

use super::RasterGrid;
use crate::config::RasterConfig;
use crate::location::{BoundingBox, Coordinate};

pub const GEOTIFF_CONTENT_TYPE: &str = "application/json";
pub const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

/// Simplified GeoTIFF document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoTiffArtifact {
    #[serde(rename = "type")]
    pub kind: String,
    pub analysis_type: String,
    pub bounds: BoundingBox,
    /// Pixel edge in degrees
    pub resolution: f64,
    pub dimensions: Dimensions,
    pub crs: String,
    /// Row-major values rounded to 3 decimals
    pub data: Vec<Vec<f64>>,
}

impl GeoTiffArtifact {
    /// Georeference `grid` so that it is centered on `center`
    pub fn from_grid(grid: &RasterGrid, center: Coordinate, analysis_type: &str, config: &RasterConfig) -> Self {
        let pixel = config.pixel_size_deg;
        let half_height = grid.rows() as f64 * pixel / 2.0;
        let half_width = grid.cols() as f64 * pixel / 2.0;
        Self {
            kind: "GeoTIFF".to_string(),
            analysis_type: analysis_type.to_string(),
            bounds: BoundingBox {
                north: center.latitude + half_height,
                south: center.latitude - half_height,
                east: center.longitude + half_width,
                west: center.longitude - half_width,
            },
            resolution: pixel,
            dimensions: Dimensions {
                width: grid.cols(),
                height: grid.rows(),
            },
            crs: "EPSG:4326".to_string(),
            data: grid
                .to_rows()
                .into_iter()
                .map(|row| row.into_iter().map(|v| round_to(v, 3)).collect())
                .collect(),
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// One square polygon per cell whose |value| exceeds `threshold`.
///
/// Row `i` maps to latitude `south + i·pixel`, column `j` to longitude
/// `west + j·pixel`.
pub fn vector_artifact(
    grid: &RasterGrid,
    center: Coordinate,
    threshold: f64,
    analysis_type: &str,
    config: &RasterConfig,
) -> FeatureCollection {
    let pixel = config.pixel_size_deg;
    let south = center.latitude - grid.rows() as f64 * pixel / 2.0;
    let west = center.longitude - grid.cols() as f64 * pixel / 2.0;

    let mut features = Vec::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let Some(value) = grid.get(row, col) else { continue };
            if value.abs() <= threshold {
                continue;
            }
            let lat = south + row as f64 * pixel;
            let lng = west + col as f64 * pixel;
            let ring = vec![
                vec![lng, lat],
                vec![lng + pixel, lat],
                vec![lng + pixel, lat + pixel],
                vec![lng, lat + pixel],
                vec![lng, lat],
            ];

            let mut properties = JsonObject::new();
            properties.insert("value".to_string(), serde_json::json!(round_to(value, 2)));
            properties.insert("analysisType".to_string(), serde_json::json!(analysis_type));

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn center() -> Coordinate {
        Coordinate::new(29.7604, -95.3698).unwrap()
    }

    #[test]
    fn test_geotiff_bounds_and_rounding() {
        let grid = RasterGrid::from_fn(50, 50, |r, c| -8.12345 + (r + c) as f64 * 1e-6).unwrap();
        let artifact = GeoTiffArtifact::from_grid(&grid, center(), "sar_change_detection", &RasterConfig::default());
        assert_abs_diff_eq!(artifact.bounds.north, 29.7629, epsilon = 1e-9);
        assert_abs_diff_eq!(artifact.bounds.west, -95.3723, epsilon = 1e-9);
        assert_eq!(artifact.dimensions, Dimensions { width: 50, height: 50 });
        assert_eq!(artifact.data[0][0], -8.123);

        let json: serde_json::Value = serde_json::from_slice(&artifact.to_bytes().unwrap()).unwrap();
        assert_eq!(json["type"], "GeoTIFF");
        assert_eq!(json["analysisType"], "sar_change_detection");
        assert_eq!(json["crs"], "EPSG:4326");
    }

    #[test]
    fn test_vector_artifact_keeps_significant_cells() {
        let grid = RasterGrid::from_rows(vec![vec![-8.004, 0.3], vec![5.0, 6.5]]).unwrap();
        let collection = vector_artifact(&grid, center(), 5.0, "flood_extent", &RasterConfig::default());
        // 5.0 is not strictly above the threshold
        assert_eq!(collection.features.len(), 2);

        let first = &collection.features[0];
        let props = first.properties.as_ref().unwrap();
        assert_eq!(props["value"], serde_json::json!(-8.0));
        assert_eq!(props["analysisType"], "flood_extent");
        match &first.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0][0], rings[0][4]);
                assert_abs_diff_eq!(rings[0][1][0] - rings[0][0][0], 0.0001, epsilon = 1e-12);
            }
            other => panic!("expected polygon, got {other:?}"),
        }

        let text = serde_json::to_string(&collection).unwrap();
        assert!(text.contains("\"FeatureCollection\""));
    }
}
