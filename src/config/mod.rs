//! Model parameters for the grid, exposure and raster engines plus upstream endpoints

pub mod loader;

pub use loader::LoadedParameters;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, RiskError};

/// Concentric-ring layout and variation amplitudes for grid enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Radius of the outermost ring in km
    pub radius_km: f64,
    /// Points on each ring, innermost first (ring 0, the center, is implicit)
    pub ring_point_counts: Vec<usize>,
    /// Amplitude of the sin/cos regional variation terms
    pub regional_amplitude: f64,
    /// Width of the uniform local-noise term
    pub random_amplitude: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            ring_point_counts: vec![6, 12, 18],
            regional_amplitude: 15.0,
            random_amplitude: 20.0,
        }
    }
}

impl GridConfig {
    /// Radius of ring `ring` (1-based); ring 0 is the center at 0 km
    pub fn ring_radius_km(&self, ring: usize) -> f64 {
        if ring == 0 || self.ring_point_counts.is_empty() {
            return 0.0;
        }
        self.radius_km * ring as f64 / self.ring_point_counts.len() as f64
    }

    /// Total number of grid points including the center
    pub fn total_points(&self) -> usize {
        1 + self.ring_point_counts.iter().sum::<usize>()
    }
}

/// Multipliers for converting a risk score into payout percentiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureConfig {
    pub base_exposure: f64,
    /// Upper bound on `density / 1000`
    pub density_cap: f64,
    pub urban_multiplier: f64,
    pub suburban_multiplier: f64,
    pub rural_multiplier: f64,
    /// Exponent applied to `risk / 100`
    pub severity_exponent: f64,
    /// Expected, P75, P90 and worst-case multipliers, in that order
    pub percentile_multipliers: [f64; 4],
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            base_exposure: 1_000_000.0,
            density_cap: 2.5,
            urban_multiplier: 1.5,
            suburban_multiplier: 1.2,
            rural_multiplier: 0.8,
            severity_exponent: 1.2,
            percentile_multipliers: [0.6, 0.85, 1.15, 1.65],
        }
    }
}

/// Raster sizes and change-detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Side length of simulated square rasters
    pub grid_size: usize,
    /// Ground area of one pixel (10 m x 10 m)
    pub pixel_area_km2: f64,
    /// Backscatter drop (dB) below which a cell counts as inundated
    pub sar_change_threshold_db: f64,
    /// Guard added to the NBR denominator
    pub nbr_epsilon: f64,
    /// |delta| above which a SAR cell becomes a vector feature
    pub sar_vector_threshold: f64,
    /// |dNBR| above which a cell becomes a vector feature
    pub burn_vector_threshold: f64,
    /// Pixel edge in degrees for artifact georeferencing
    pub pixel_size_deg: f64,
    /// Half width of the analysis bounding box in degrees
    pub bbox_half_width_deg: f64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            pixel_area_km2: 0.0001,
            sar_change_threshold_db: -5.0,
            nbr_epsilon: 1e-4,
            sar_vector_threshold: 5.0,
            burn_vector_threshold: 0.1,
            pixel_size_deg: 0.0001,
            bbox_half_width_deg: 0.05,
        }
    }
}

/// Upstream endpoints and credentials, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub forecast_url: String,
    pub elevation_url: String,
    pub copernicus_token_url: String,
    pub copernicus_stac_url: String,
    pub copernicus_client_id: Option<String>,
    pub copernicus_client_secret: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            elevation_url: "https://api.open-meteo.com/v1/elevation".to_string(),
            copernicus_token_url: "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token".to_string(),
            copernicus_stac_url: "https://catalogue.dataspace.copernicus.eu/stac/search".to_string(),
            copernicus_client_id: None,
            copernicus_client_secret: None,
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by any of the supported environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] with an explicit variable lookup
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            forecast_url: non_empty("OPEN_METEO_FORECAST_URL").unwrap_or(defaults.forecast_url),
            elevation_url: non_empty("OPEN_METEO_ELEVATION_URL").unwrap_or(defaults.elevation_url),
            copernicus_token_url: non_empty("COPERNICUS_TOKEN_URL").unwrap_or(defaults.copernicus_token_url),
            copernicus_stac_url: non_empty("COPERNICUS_STAC_URL").unwrap_or(defaults.copernicus_stac_url),
            copernicus_client_id: non_empty("COPERNICUS_CLIENT_ID"),
            copernicus_client_secret: non_empty("COPERNICUS_CLIENT_SECRET"),
        }
    }

    /// Client id and secret, when both are configured
    pub fn copernicus_credentials(&self) -> Option<(&str, &str)> {
        match (&self.copernicus_client_id, &self.copernicus_client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

/// Container for all engine parameters
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub exposure: ExposureConfig,
    pub raster: RasterConfig,
    pub services: ServiceConfig,
}

impl EngineConfig {
    /// In-memory defaults matching the reference model
    pub fn default_model() -> Self {
        Self {
            grid: GridConfig::default(),
            exposure: ExposureConfig::default(),
            raster: RasterConfig::default(),
            services: ServiceConfig::default(),
        }
    }

    /// Load model parameters from CSV files in the default location (data/model/)
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(loader::DEFAULT_MODEL_PATH))
    }

    /// Load model parameters from CSV files in a specific directory.
    /// Services always come from the environment.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let loaded = LoadedParameters::load_from(path)?;
        let config = Self {
            grid: loaded.grid_config()?,
            exposure: loaded.exposure_config()?,
            raster: loaded.raster_config()?,
            services: ServiceConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter sets that would break the engine's invariants
    pub fn validate(&self) -> Result<()> {
        if self.grid.ring_point_counts.iter().any(|&n| n == 0) {
            return Err(RiskError::Config("every ring needs at least one point".into()));
        }
        if !(self.grid.radius_km > 0.0) {
            return Err(RiskError::Config("grid radius must be positive".into()));
        }
        let m = self.exposure.percentile_multipliers;
        if m[0] < 0.0 || m.windows(2).any(|w| w[0] > w[1]) {
            return Err(RiskError::Config(
                "percentile multipliers must be non-negative and non-decreasing".into(),
            ));
        }
        let e = &self.exposure;
        if !(e.severity_exponent > 0.0) {
            return Err(RiskError::Config("severity exponent must be positive".into()));
        }
        if !(e.base_exposure >= 0.0) || !(e.density_cap >= 0.0) {
            return Err(RiskError::Config("base exposure and density cap must be non-negative".into()));
        }
        if self.raster.grid_size == 0 || !(self.raster.pixel_area_km2 > 0.0) {
            return Err(RiskError::Config("raster size and pixel area must be positive".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::default_model()
    }
}
