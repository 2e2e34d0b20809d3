//! Location analyzer: weather fetch, hazard scoring and grid enrichment
//!
//! Pre-loads the engine configuration once, then serves any number of
//! analyses without re-reading parameter files.

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Result, RiskError};
use crate::exposure::ExposureModel;
use crate::grid::{GridEnrichment, SpatialGridGenerator};
use crate::hazard::{HazardScorer, HazardScores};
use crate::location::Coordinate;
use crate::report::LocationReport;
use crate::rng::seeded_rng;
use crate::weather::WeatherSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub flood: u8,
    pub wildfire: u8,
    pub storm: u8,
    pub drought: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub elevation: f64,
    pub current_temp: f64,
    pub current_humidity: f64,
    pub current_precipitation: f64,
    pub current_wind_speed: f64,
    /// Mean daily precipitation over the forecast
    pub avg_precipitation: f64,
    pub max_wind_speed: f64,
    pub data_source: String,
    /// RFC 3339
    pub timestamp: String,
}

/// Location analysis response payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAnalysis {
    pub latitude: f64,
    pub longitude: f64,
    pub overall_score: u8,
    pub factors: RiskFactors,
    pub metadata: AnalysisMetadata,
}

impl LocationAnalysis {
    pub fn scores(&self) -> HazardScores {
        HazardScores {
            flood: self.factors.flood,
            wildfire: self.factors.wildfire,
            storm: self.factors.storm,
            drought: self.factors.drought,
            overall: self.overall_score,
        }
    }

    pub fn coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Analysis, its enrichment grid and the exportable report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub analysis: LocationAnalysis,
    pub enrichment: GridEnrichment,
    pub report: LocationReport,
}

/// Pre-configured analyzer over one weather source
pub struct LocationAnalyzer<W: WeatherSource> {
    config: EngineConfig,
    weather: W,
    scorer: HazardScorer,
    grid: SpatialGridGenerator,
}

impl<W: WeatherSource> LocationAnalyzer<W> {
    /// Analyzer with the default in-memory model
    pub fn new(weather: W) -> Self {
        Self::with_config(weather, EngineConfig::default_model())
    }

    /// Analyzer with pre-built configuration
    pub fn with_config(weather: W, config: EngineConfig) -> Self {
        let grid = SpatialGridGenerator::new(config.grid.clone(), ExposureModel::new(config.exposure.clone()));
        Self {
            config,
            weather,
            scorer: HazardScorer::new(),
            grid,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch weather for `coordinate` and score it
    pub async fn analyze(&self, coordinate: Coordinate) -> Result<LocationAnalysis> {
        self.analyze_at(coordinate, Utc::now()).await
    }

    pub async fn analyze_at(&self, coordinate: Coordinate, now: DateTime<Utc>) -> Result<LocationAnalysis> {
        let sample = self.weather.fetch(coordinate).await?;
        let summary = sample.summarize()?;
        let scores = self.scorer.score(&sample)?;
        info!(
            "Scored ({}, {}): overall {} (flood {}, wildfire {}, storm {}, drought {})",
            coordinate.latitude,
            coordinate.longitude,
            scores.overall,
            scores.flood,
            scores.wildfire,
            scores.storm,
            scores.drought
        );

        Ok(LocationAnalysis {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            overall_score: scores.overall,
            factors: RiskFactors {
                flood: scores.flood,
                wildfire: scores.wildfire,
                storm: scores.storm,
                drought: scores.drought,
            },
            metadata: AnalysisMetadata {
                elevation: sample.elevation_meters,
                current_temp: sample.current_temperature,
                current_humidity: sample.current_humidity,
                current_precipitation: sample.current_precipitation,
                current_wind_speed: sample.current_wind_speed,
                avg_precipitation: summary.avg_daily_precipitation,
                max_wind_speed: summary.max_wind_speed,
                data_source: self.weather.name().to_string(),
                timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        })
    }

    /// Grid enrichment around `coordinate` seeded with its composite score
    pub fn enrich<R: Rng + ?Sized>(&self, coordinate: Coordinate, overall_score: u8, rng: &mut R) -> Result<GridEnrichment> {
        let points = self.grid.generate(coordinate, overall_score, rng)?;
        Ok(GridEnrichment::new(coordinate, self.config.grid.radius_km, points, Utc::now()))
    }

    /// Analysis, enrichment and report in one call
    pub async fn assess(&self, coordinate: Coordinate, seed: Option<u64>) -> Result<Assessment> {
        let analysis = self.analyze(coordinate).await?;
        let mut rng = seeded_rng(seed, 0);
        let enrichment = self.enrich(coordinate, analysis.overall_score, &mut rng)?;
        let payout = enrichment
            .center_point()
            .map(|p| p.payout_estimate)
            .ok_or_else(|| RiskError::incomplete("gridData[center]"))?;
        let report = LocationReport::new(coordinate, analysis.scores(), payout);
        Ok(Assessment {
            analysis,
            enrichment,
            report,
        })
    }
}
