//! Weather/elevation samples and the sources that provide them

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::location::Coordinate;

/// Current conditions plus a multi-day forecast for one location.
///
/// Index `i` of every daily array refers to the same forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub current_temperature: f64,
    pub current_humidity: f64,
    pub current_precipitation: f64,
    pub current_wind_speed: f64,
    pub daily_max_temps: Vec<f64>,
    pub daily_min_temps: Vec<f64>,
    pub daily_precipitation_sums: Vec<f64>,
    pub daily_precipitation_probabilities: Vec<f64>,
    pub daily_max_wind_speeds: Vec<f64>,
    pub elevation_meters: f64,
}

impl WeatherSample {
    /// Check that every field is present and finite and that daily arrays line up
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("current.temperature_2m", self.current_temperature),
            ("current.relative_humidity_2m", self.current_humidity),
            ("current.precipitation", self.current_precipitation),
            ("current.wind_speed_10m", self.current_wind_speed),
            ("elevation", self.elevation_meters),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(RiskError::incomplete(field));
            }
        }

        let daily = self.daily_series();
        let days = daily[0].1.len();
        for (field, values) in daily {
            if values.is_empty() {
                return Err(RiskError::incomplete(format!("{field} is empty")));
            }
            if values.len() != days {
                return Err(RiskError::incomplete(format!(
                    "{field} has {} days, expected {days}",
                    values.len()
                )));
            }
            if let Some(day) = values.iter().position(|v| !v.is_finite()) {
                return Err(RiskError::incomplete(format!("{field}[{day}]")));
            }
        }
        Ok(())
    }

    fn daily_series(&self) -> [(&'static str, &[f64]); 5] {
        [
            ("daily.temperature_2m_max", self.daily_max_temps.as_slice()),
            ("daily.temperature_2m_min", self.daily_min_temps.as_slice()),
            ("daily.precipitation_sum", self.daily_precipitation_sums.as_slice()),
            ("daily.precipitation_probability_max", self.daily_precipitation_probabilities.as_slice()),
            ("daily.wind_speed_10m_max", self.daily_max_wind_speeds.as_slice()),
        ]
    }

    /// Number of forecast days
    pub fn days(&self) -> usize {
        self.daily_max_temps.len()
    }

    /// Aggregate the forecast arrays into the values the hazard formulas use
    pub fn summarize(&self) -> Result<WeatherSummary> {
        self.validate()?;
        Ok(WeatherSummary {
            avg_daily_precipitation: mean(&self.daily_precipitation_sums),
            max_precipitation_probability: max(&self.daily_precipitation_probabilities),
            avg_max_temperature: mean(&self.daily_max_temps),
            max_wind_speed: max(&self.daily_max_wind_speeds),
            temperature_range: max(&self.daily_max_temps) - min(&self.daily_min_temps),
        })
    }
}

/// Forecast aggregates derived from a validated [`WeatherSample`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub avg_daily_precipitation: f64,
    pub max_precipitation_probability: f64,
    pub avg_max_temperature: f64,
    pub max_wind_speed: f64,
    /// Highest daily max minus lowest daily min across the forecast
    pub temperature_range: f64,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Anything that can produce a [`WeatherSample`] for a coordinate
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Human-readable provider name recorded in analysis metadata
    fn name(&self) -> &str;

    /// Fetch current conditions, forecast and elevation
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSample>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) fn sample() -> WeatherSample {
        WeatherSample {
            current_temperature: 24.0,
            current_humidity: 65.0,
            current_precipitation: 0.2,
            current_wind_speed: 12.0,
            daily_max_temps: vec![28.0, 31.0, 30.0],
            daily_min_temps: vec![19.0, 21.0, 18.0],
            daily_precipitation_sums: vec![0.0, 6.0, 3.0],
            daily_precipitation_probabilities: vec![10.0, 80.0, 40.0],
            daily_max_wind_speeds: vec![14.0, 22.0, 9.0],
            elevation_meters: 120.0,
        }
    }

    #[test]
    fn test_summarize() {
        let summary = sample().summarize().unwrap();
        assert_relative_eq!(summary.avg_daily_precipitation, 3.0);
        assert_relative_eq!(summary.max_precipitation_probability, 80.0);
        assert_relative_eq!(summary.avg_max_temperature, 89.0 / 3.0);
        assert_relative_eq!(summary.max_wind_speed, 22.0);
        assert_relative_eq!(summary.temperature_range, 13.0);
    }

    #[test]
    fn test_nan_rejected() {
        let mut s = sample();
        s.daily_precipitation_sums[1] = f64::NAN;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("daily.precipitation_sum[1]"));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut s = sample();
        s.daily_min_temps.pop();
        assert!(matches!(s.validate(), Err(RiskError::DataIncomplete { .. })));
    }

    #[test]
    fn test_empty_forecast_rejected() {
        let mut s = sample();
        s.daily_max_temps.clear();
        s.daily_min_temps.clear();
        s.daily_precipitation_sums.clear();
        s.daily_precipitation_probabilities.clear();
        s.daily_max_wind_speeds.clear();
        assert!(s.summarize().is_err());
    }
}
