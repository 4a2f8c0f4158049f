//! Hourly forecasts from the OpenWeatherMap One Call API.

use crate::types::{Coordinates, HourlyForecast, TemperatureUnit, WeatherCondition, WeatherError};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Sections of the One Call response we never read
const EXCLUDE: &str = "current,minutely,daily,alerts";

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    hourly: Vec<OwmHourly>,
}

#[derive(Debug, Deserialize)]
struct OwmHourly {
    dt: i64,
    temp: f64,
    feels_like: f64,
    humidity: u8,
    wind_speed: f64,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    id: u16,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    api_url: String,
    api_key: String,
    unit: TemperatureUnit,
}

impl WeatherProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        unit: TemperatureUnit,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            api_url: api_url.into(),
            api_key: api_key.into(),
            unit,
        })
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Fetch the hourly forecast for a point, earliest hour first.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn hourly_forecast(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<HourlyForecast>, WeatherError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.unit.as_query().to_string()),
                ("exclude", EXCLUDE.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(WeatherError::InvalidApiKey);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<OwmErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: OneCallResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let hours = parsed
            .hourly
            .into_iter()
            .map(Self::convert_hour)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} hourly forecast entries", hours.len());
        Ok(hours)
    }

    fn convert_hour(hour: OwmHourly) -> Result<HourlyForecast, WeatherError> {
        let time = DateTime::<Utc>::from_timestamp(hour.dt, 0).ok_or_else(|| {
            WeatherError::Parse(format!("Invalid forecast timestamp: {}", hour.dt))
        })?;

        let (condition, description, icon) = match hour.weather.into_iter().next() {
            Some(w) => (WeatherCondition::from_owm_code(w.id), w.description, w.icon),
            None => (WeatherCondition::default(), String::new(), String::new()),
        };

        Ok(HourlyForecast {
            time,
            temperature: hour.temp,
            feels_like: hour.feels_like,
            humidity: hour.humidity,
            wind_speed: hour.wind_speed,
            precipitation_chance: (hour.pop.clamp(0.0, 1.0) * 100.0).round() as u8,
            condition,
            description,
            icon,
        })
    }
}
