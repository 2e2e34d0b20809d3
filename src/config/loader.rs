//! CSV-based parameter loader
//!
//! Loads model parameters from CSV files in data/model/:
//! - `model_parameters.csv` (`parameter,value`), any omitted parameter keeps its default
//! - `grid_rings.csv` (`ring,points`), ring numbers start at 1

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use super::{ExposureConfig, GridConfig, RasterConfig};
use crate::error::{Result, RiskError};

/// Default path to the model parameter directory
pub const DEFAULT_MODEL_PATH: &str = "data/model";

const KNOWN_PARAMETERS: &[&str] = &[
    "grid.radius_km",
    "grid.regional_amplitude",
    "grid.random_amplitude",
    "exposure.base_exposure",
    "exposure.density_cap",
    "exposure.urban_multiplier",
    "exposure.suburban_multiplier",
    "exposure.rural_multiplier",
    "exposure.severity_exponent",
    "exposure.expected_multiplier",
    "exposure.p75_multiplier",
    "exposure.p90_multiplier",
    "exposure.worst_case_multiplier",
    "raster.grid_size",
    "raster.pixel_area_km2",
    "raster.sar_change_threshold_db",
    "raster.nbr_epsilon",
    "raster.sar_vector_threshold",
    "raster.burn_vector_threshold",
    "raster.pixel_size_deg",
    "raster.bbox_half_width_deg",
];

/// Load scalar parameters from CSV
/// Returns HashMap<parameter, value>
pub fn load_model_parameters(path: &Path) -> Result<HashMap<String, f64>> {
    let file = File::open(path.join("model_parameters.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut parameters = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let name = record[0].trim().to_string();
        if !KNOWN_PARAMETERS.contains(&name.as_str()) {
            return Err(RiskError::Config(format!("unknown model parameter: {name}")));
        }
        let value: f64 = record[1]
            .trim()
            .parse()
            .map_err(|_| RiskError::Config(format!("{name}: not a number: {}", &record[1])))?;
        parameters.insert(name, value);
    }

    Ok(parameters)
}

/// Load ring point counts from CSV
/// Returns Vec<points> indexed by ring (ring 1 at index 0)
pub fn load_grid_rings(path: &Path) -> Result<Vec<usize>> {
    let file = File::open(path.join("grid_rings.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut rings: Vec<(usize, usize)> = Vec::new();

    for result in reader.records() {
        let record = result?;
        let ring: usize = record[0]
            .trim()
            .parse()
            .map_err(|_| RiskError::Config(format!("bad ring number: {}", &record[0])))?;
        let points: usize = record[1]
            .trim()
            .parse()
            .map_err(|_| RiskError::Config(format!("bad point count: {}", &record[1])))?;
        rings.push((ring, points));
    }

    rings.sort_by_key(|(ring, _)| *ring);
    for (expected, (ring, _)) in (1..).zip(&rings) {
        if *ring != expected {
            return Err(RiskError::Config(format!(
                "grid rings must be numbered 1..n without gaps, found ring {ring}"
            )));
        }
    }

    Ok(rings.into_iter().map(|(_, points)| points).collect())
}

/// Parameters loaded from a model directory
#[derive(Debug, Clone)]
pub struct LoadedParameters {
    pub parameters: HashMap<String, f64>,
    pub ring_point_counts: Vec<usize>,
}

impl LoadedParameters {
    /// Load all parameters from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_MODEL_PATH))
    }

    /// Load all parameters from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self {
            parameters: load_model_parameters(path)?,
            ring_point_counts: load_grid_rings(path)?,
        })
    }

    fn get_or(&self, name: &str, default: f64) -> f64 {
        self.parameters.get(name).copied().unwrap_or(default)
    }

    pub fn grid_config(&self) -> Result<GridConfig> {
        let defaults = GridConfig::default();
        let ring_point_counts = if self.ring_point_counts.is_empty() {
            defaults.ring_point_counts.clone()
        } else {
            self.ring_point_counts.clone()
        };
        Ok(GridConfig {
            radius_km: self.get_or("grid.radius_km", defaults.radius_km),
            ring_point_counts,
            regional_amplitude: self.get_or("grid.regional_amplitude", defaults.regional_amplitude),
            random_amplitude: self.get_or("grid.random_amplitude", defaults.random_amplitude),
        })
    }

    pub fn exposure_config(&self) -> Result<ExposureConfig> {
        let d = ExposureConfig::default();
        Ok(ExposureConfig {
            base_exposure: self.get_or("exposure.base_exposure", d.base_exposure),
            density_cap: self.get_or("exposure.density_cap", d.density_cap),
            urban_multiplier: self.get_or("exposure.urban_multiplier", d.urban_multiplier),
            suburban_multiplier: self.get_or("exposure.suburban_multiplier", d.suburban_multiplier),
            rural_multiplier: self.get_or("exposure.rural_multiplier", d.rural_multiplier),
            severity_exponent: self.get_or("exposure.severity_exponent", d.severity_exponent),
            percentile_multipliers: [
                self.get_or("exposure.expected_multiplier", d.percentile_multipliers[0]),
                self.get_or("exposure.p75_multiplier", d.percentile_multipliers[1]),
                self.get_or("exposure.p90_multiplier", d.percentile_multipliers[2]),
                self.get_or("exposure.worst_case_multiplier", d.percentile_multipliers[3]),
            ],
        })
    }

    pub fn raster_config(&self) -> Result<RasterConfig> {
        let d = RasterConfig::default();
        let grid_size = self.get_or("raster.grid_size", d.grid_size as f64);
        if grid_size < 1.0 || grid_size.fract() != 0.0 {
            return Err(RiskError::Config(format!("raster.grid_size must be a positive integer, got {grid_size}")));
        }
        Ok(RasterConfig {
            grid_size: grid_size as usize,
            pixel_area_km2: self.get_or("raster.pixel_area_km2", d.pixel_area_km2),
            sar_change_threshold_db: self.get_or("raster.sar_change_threshold_db", d.sar_change_threshold_db),
            nbr_epsilon: self.get_or("raster.nbr_epsilon", d.nbr_epsilon),
            sar_vector_threshold: self.get_or("raster.sar_vector_threshold", d.sar_vector_threshold),
            burn_vector_threshold: self.get_or("raster.burn_vector_threshold", d.burn_vector_threshold),
            pixel_size_deg: self.get_or("raster.pixel_size_deg", d.pixel_size_deg),
            bbox_half_width_deg: self.get_or("raster.bbox_half_width_deg", d.bbox_half_width_deg),
        })
    }
}
