//! Open-Meteo forecast and elevation client.
//!
//! Free public API, no key required. The JSON is deserialized into typed
//! structs whose values are `Option<f64>`; nothing reaches the hazard scorer
//! until every field has been checked.
//!
//! See <https://open-meteo.com/en/docs>

use async_trait::async_trait;
use serde::Deserialize;

use super::{WeatherSample, WeatherSource};
use crate::config::ServiceConfig;
use crate::error::{Result, RiskError};
use crate::location::Coordinate;

const SERVICE: &str = "open-meteo";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation,wind_speed_10m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,precipitation_probability_max,wind_speed_10m_max";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentBlock>,
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    wind_speed_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    #[serde(default)]
    elevation: Vec<Option<f64>>,
}

fn required(value: Option<f64>, field: &str) -> Result<f64> {
    value.ok_or_else(|| RiskError::incomplete(field))
}

fn required_series(values: Vec<Option<f64>>, field: &str) -> Result<Vec<f64>> {
    values
        .into_iter()
        .enumerate()
        .map(|(day, v)| v.ok_or_else(|| RiskError::incomplete(format!("{field}[{day}]"))))
        .collect()
}

/// Turn the raw forecast + elevation payloads into a validated sample
fn build_sample(forecast: ForecastResponse, elevation: ElevationResponse) -> Result<WeatherSample> {
    let current = forecast.current.ok_or_else(|| RiskError::incomplete("current"))?;
    let daily = forecast.daily.ok_or_else(|| RiskError::incomplete("daily"))?;
    let elevation_meters = elevation
        .elevation
        .first()
        .copied()
        .flatten()
        .ok_or_else(|| RiskError::incomplete("elevation"))?;

    let sample = WeatherSample {
        current_temperature: required(current.temperature_2m, "current.temperature_2m")?,
        current_humidity: required(current.relative_humidity_2m, "current.relative_humidity_2m")?,
        current_precipitation: required(current.precipitation, "current.precipitation")?,
        current_wind_speed: required(current.wind_speed_10m, "current.wind_speed_10m")?,
        daily_max_temps: required_series(daily.temperature_2m_max, "daily.temperature_2m_max")?,
        daily_min_temps: required_series(daily.temperature_2m_min, "daily.temperature_2m_min")?,
        daily_precipitation_sums: required_series(daily.precipitation_sum, "daily.precipitation_sum")?,
        daily_precipitation_probabilities: required_series(
            daily.precipitation_probability_max,
            "daily.precipitation_probability_max",
        )?,
        daily_max_wind_speeds: required_series(daily.wind_speed_10m_max, "daily.wind_speed_10m_max")?,
        elevation_meters,
    };
    sample.validate()?;
    Ok(sample)
}

/// HTTP client for the Open-Meteo forecast and elevation endpoints
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    forecast_url: String,
    elevation_url: String,
}

impl OpenMeteoClient {
    pub fn new(client: reqwest::Client, config: &ServiceConfig) -> Self {
        Self {
            client,
            forecast_url: config.forecast_url.clone(),
            elevation_url: config.elevation_url.clone(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| RiskError::upstream(SERVICE, e))?
            .error_for_status()
            .map_err(|e| RiskError::upstream(SERVICE, e))?;

        resp.json::<T>().await.map_err(|e| RiskError::upstream(SERVICE, e))
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    fn name(&self) -> &str {
        "Open-Meteo API"
    }

    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSample> {
        let position = [
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
        ];

        log::info!(
            "Fetching Open-Meteo forecast for {}, {}",
            coordinate.latitude,
            coordinate.longitude
        );
        let mut forecast_query = position.to_vec();
        forecast_query.push(("current", CURRENT_FIELDS.to_string()));
        forecast_query.push(("daily", DAILY_FIELDS.to_string()));
        forecast_query.push(("timezone", "auto".to_string()));
        let forecast: ForecastResponse = self.get_json(&self.forecast_url, &forecast_query).await?;

        let elevation: ElevationResponse = self.get_json(&self.elevation_url, &position).await?;
        log::debug!("Elevation response: {:?}", elevation.elevation);

        build_sample(forecast, elevation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast_json() -> serde_json::Value {
        serde_json::json!({
            "latitude": 29.76,
            "longitude": -95.37,
            "current": {
                "temperature_2m": 27.4,
                "relative_humidity_2m": 84,
                "precipitation": 0.3,
                "wind_speed_10m": 11.2
            },
            "daily": {
                "time": ["2026-10-17", "2026-10-18"],
                "temperature_2m_max": [30.1, 29.4],
                "temperature_2m_min": [22.0, 21.5],
                "precipitation_sum": [4.2, 12.8],
                "precipitation_probability_max": [45, 90],
                "wind_speed_10m_max": [18.3, 25.0]
            }
        })
    }

    #[test]
    fn test_parses_forecast() {
        let forecast: ForecastResponse = serde_json::from_value(forecast_json()).unwrap();
        let elevation: ElevationResponse =
            serde_json::from_value(serde_json::json!({ "elevation": [15.0] })).unwrap();

        let sample = build_sample(forecast, elevation).unwrap();
        assert_eq!(sample.days(), 2);
        assert_eq!(sample.current_humidity, 84.0);
        assert_eq!(sample.daily_precipitation_probabilities, vec![45.0, 90.0]);
        assert_eq!(sample.elevation_meters, 15.0);
    }

    #[test]
    fn test_null_daily_value_is_incomplete() {
        let mut json = forecast_json();
        json["daily"]["wind_speed_10m_max"] = serde_json::json!([18.3, null]);
        let forecast: ForecastResponse = serde_json::from_value(json).unwrap();
        let elevation: ElevationResponse =
            serde_json::from_value(serde_json::json!({ "elevation": [15.0] })).unwrap();

        let err = build_sample(forecast, elevation).unwrap_err();
        assert!(err.to_string().contains("daily.wind_speed_10m_max[1]"));
    }

    #[test]
    fn test_missing_elevation_is_incomplete() {
        let forecast: ForecastResponse = serde_json::from_value(forecast_json()).unwrap();
        let elevation: ElevationResponse = serde_json::from_value(serde_json::json!({})).unwrap();

        assert!(matches!(
            build_sample(forecast, elevation),
            Err(RiskError::DataIncomplete { .. })
        ));
    }

    #[test]
    fn test_missing_current_block() {
        let mut json = forecast_json();
        json.as_object_mut().unwrap().remove("current");
        let forecast: ForecastResponse = serde_json::from_value(json).unwrap();
        let elevation: ElevationResponse =
            serde_json::from_value(serde_json::json!({ "elevation": [15.0] })).unwrap();
        assert!(build_sample(forecast, elevation).is_err());
    }
}
