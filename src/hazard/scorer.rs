//! Hazard scoring from a single weather/elevation sample
//!
//! Every formula is a sum of bounded bonuses, rounded to the nearest integer
//! and saturated into [0, 100]. No randomness: identical samples give
//! identical scores.

use serde::{Deserialize, Serialize};

use super::RiskLevel;
use crate::error::Result;
use crate::weather::{WeatherSample, WeatherSummary};

/// The four hazards scored per location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Flood,
    Wildfire,
    Storm,
    Drought,
}

impl HazardKind {
    pub const ALL: [HazardKind; 4] = [
        HazardKind::Flood,
        HazardKind::Wildfire,
        HazardKind::Storm,
        HazardKind::Drought,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HazardKind::Flood => "Flood",
            HazardKind::Wildfire => "Wildfire",
            HazardKind::Storm => "Storm",
            HazardKind::Drought => "Drought",
        }
    }
}

/// Bounded hazard scores for one analysed location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardScores {
    pub flood: u8,
    pub wildfire: u8,
    pub storm: u8,
    pub drought: u8,
    /// Rounded mean of the four factors
    pub overall: u8,
}

impl HazardScores {
    /// Build from the four factor scores, deriving `overall`
    pub fn from_factors(flood: u8, wildfire: u8, storm: u8, drought: u8) -> Self {
        let sum = flood as f64 + wildfire as f64 + storm as f64 + drought as f64;
        Self {
            flood,
            wildfire,
            storm,
            drought,
            overall: (sum / 4.0).round() as u8,
        }
    }

    pub fn get(&self, kind: HazardKind) -> u8 {
        match kind {
            HazardKind::Flood => self.flood,
            HazardKind::Wildfire => self.wildfire,
            HazardKind::Storm => self.storm,
            HazardKind::Drought => self.drought,
        }
    }

    /// Classification of the composite score
    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.overall as f64)
    }

    /// Dominant hazard; ties go to the earlier kind in [`HazardKind::ALL`]
    pub fn highest(&self) -> (HazardKind, u8) {
        HazardKind::ALL
            .iter()
            .map(|&k| (k, self.get(k)))
            .fold((HazardKind::Flood, self.flood), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    /// Weakest hazard; ties go to the earlier kind in [`HazardKind::ALL`]
    pub fn lowest(&self) -> (HazardKind, u8) {
        HazardKind::ALL
            .iter()
            .map(|&k| (k, self.get(k)))
            .fold((HazardKind::Flood, self.flood), |best, cur| if cur.1 < best.1 { cur } else { best })
    }
}

/// Round and saturate a raw formula value into a 0..=100 score
fn bounded(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// Converts weather samples into [`HazardScores`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardScorer;

impl HazardScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a sample. Fails with `DataIncomplete` if any field is missing or NaN.
    pub fn score(&self, sample: &WeatherSample) -> Result<HazardScores> {
        let summary = sample.summarize()?;
        Ok(self.score_summary(&summary, sample.current_humidity, sample.elevation_meters))
    }

    /// Score pre-aggregated forecast values
    pub fn score_summary(&self, w: &WeatherSummary, humidity: f64, elevation: f64) -> HazardScores {
        HazardScores::from_factors(
            flood_score(w, humidity, elevation),
            wildfire_score(w, humidity),
            storm_score(w),
            drought_score(w, humidity),
        )
    }
}

fn flood_score(w: &WeatherSummary, humidity: f64, elevation: f64) -> u8 {
    let elevation_bonus = if elevation < 50.0 {
        30.0
    } else if elevation < 200.0 {
        15.0
    } else {
        0.0
    };
    let humidity_bonus = if humidity > 80.0 { 15.0 } else { 0.0 };
    bounded(
        2.0 * w.avg_daily_precipitation
            + 0.3 * w.max_precipitation_probability
            + elevation_bonus
            + humidity_bonus,
    )
}

fn wildfire_score(w: &WeatherSummary, humidity: f64) -> u8 {
    let heat = (w.avg_max_temperature - 30.0).max(0.0) * 3.0;
    let dry_air = if humidity < 30.0 { 30.0 } else { 0.0 };
    let wind = w.max_wind_speed.min(20.0);
    let dry_ground = if w.avg_daily_precipitation < 2.0 { 20.0 } else { 0.0 };
    bounded(heat + dry_air + wind + dry_ground)
}

fn storm_score(w: &WeatherSummary) -> u8 {
    bounded(
        2.0 * w.max_wind_speed
            + 0.4 * w.max_precipitation_probability
            + w.temperature_range.min(20.0),
    )
}

fn drought_score(w: &WeatherSummary, humidity: f64) -> u8 {
    let precip_deficit = if w.avg_daily_precipitation < 5.0 {
        40.0
    } else if w.avg_daily_precipitation < 10.0 {
        20.0
    } else {
        0.0
    };
    let heat = (w.avg_max_temperature - 25.0).max(0.0) * 2.0;
    let humidity_deficit = if humidity < 40.0 {
        30.0
    } else if humidity < 60.0 {
        15.0
    } else {
        0.0
    };
    bounded(precip_deficit + heat + humidity_deficit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskError;
    use crate::weather::tests::sample;

    fn calm_dry_summary() -> WeatherSummary {
        WeatherSummary {
            avg_daily_precipitation: 0.0,
            max_precipitation_probability: 0.0,
            avg_max_temperature: 20.0,
            max_wind_speed: 0.0,
            temperature_range: 0.0,
        }
    }

    #[test]
    fn test_calm_dry_highland() {
        // Dry air and dry ground both count toward wildfire even when cool and calm
        let scores = HazardScorer::new().score_summary(&calm_dry_summary(), 10.0, 1000.0);
        assert_eq!(scores.flood, 0);
        assert_eq!(scores.wildfire, 50);
        assert_eq!(scores.storm, 0);
        assert_eq!(scores.drought, 70);
        assert_eq!(scores.overall, 30);
    }

    #[test]
    fn test_sample_scores() {
        // avg precip 3, max prob 80, avg max temp 29.67, max wind 22, range 13
        let scores = HazardScorer::new().score(&sample()).unwrap();
        // 6 + 24 + 15 (elevation 120) + 0
        assert_eq!(scores.flood, 45);
        // 0 + 0 + 20 + 0
        assert_eq!(scores.wildfire, 20);
        // 44 + 32 + 13 = 89
        assert_eq!(scores.storm, 89);
        // 40 + 9.33 + 0
        assert_eq!(scores.drought, 49);
        assert_eq!(scores.overall, 51);
    }

    #[test]
    fn test_saturates_at_100() {
        let extreme = WeatherSummary {
            avg_daily_precipitation: 200.0,
            max_precipitation_probability: 100.0,
            avg_max_temperature: 60.0,
            max_wind_speed: 150.0,
            temperature_range: 40.0,
        };
        let scores = HazardScorer::new().score_summary(&extreme, 95.0, -10.0);
        assert_eq!(scores.flood, 100);
        assert_eq!(scores.wildfire, 100);
        assert_eq!(scores.storm, 100);
        assert_eq!(scores.drought, 70);
    }

    #[test]
    fn test_negative_inputs_floor_at_zero() {
        let odd = WeatherSummary {
            avg_daily_precipitation: 50.0,
            max_precipitation_probability: 0.0,
            avg_max_temperature: -10.0,
            max_wind_speed: -30.0,
            temperature_range: -5.0,
        };
        let scores = HazardScorer::new().score_summary(&odd, 70.0, 500.0);
        assert_eq!(scores.storm, 0);
        assert_eq!(scores.wildfire, 0);
    }

    #[test]
    fn test_bounds_and_overall_over_many_samples() {
        let scorer = HazardScorer::new();
        for precip in [0.0, 1.5, 4.0, 9.0, 30.0] {
            for humidity in [5.0, 35.0, 55.0, 85.0] {
                for temp in [-5.0, 24.0, 33.0, 48.0] {
                    for wind in [0.0, 12.0, 45.0] {
                        let w = WeatherSummary {
                            avg_daily_precipitation: precip,
                            max_precipitation_probability: 70.0,
                            avg_max_temperature: temp,
                            max_wind_speed: wind,
                            temperature_range: 14.0,
                        };
                        let s = scorer.score_summary(&w, humidity, 40.0);
                        for kind in HazardKind::ALL {
                            assert!(s.get(kind) <= 100);
                        }
                        let mean = (s.flood as f64 + s.wildfire as f64 + s.storm as f64 + s.drought as f64) / 4.0;
                        assert_eq!(s.overall, mean.round() as u8);
                    }
                }
            }
        }
    }

    #[test]
    fn test_nan_is_data_incomplete() {
        let mut s = sample();
        s.current_humidity = f64::NAN;
        assert!(matches!(HazardScorer::new().score(&s), Err(RiskError::DataIncomplete { .. })));
    }

    #[test]
    fn test_highest_and_lowest() {
        let scores = HazardScores::from_factors(45, 20, 89, 49);
        assert_eq!(scores.highest(), (HazardKind::Storm, 89));
        assert_eq!(scores.lowest(), (HazardKind::Wildfire, 20));
        assert_eq!(scores.level(), RiskLevel::High);
    }
}
