//! Reverse geocoding: convert coordinates to a structured address.
//! Uses Nominatim (OpenStreetMap) - free, no API key required, but a
//! descriptive user agent is mandatory.

use crate::types::{Address, Coordinates, WeatherError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<Address>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReverseGeocoder {
    client: Arc<Client>,
    url: String,
}

impl ReverseGeocoder {
    pub fn new(
        url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            url: url.into(),
        })
    }

    /// Look up the address nearest to `coordinates`.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn reverse(&self, coordinates: Coordinates) -> Result<Address, WeatherError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        // Nominatim answers 200 with an `error` field for points in the sea
        if let Some(error) = body.error {
            return Err(WeatherError::Parse(error));
        }

        let address = body
            .address
            .ok_or_else(|| WeatherError::Parse("Response has no address".to_string()))?;

        tracing::info!("Reverse geocoded to: {}", address.summary());
        Ok(address)
    }
}
