//! Shared handler state built once from configuration.

use anyhow::{Context, Result};
use brolly_auth::GoogleOAuth2Provider;
use brolly_core::Config;
use brolly_postcodes::{PostcodeLookup, PostcodeStore, UserDataDb};
use brolly_weather::{ReverseGeocoder, TemperatureUnit, WeatherProvider};
use std::time::Duration;

pub struct AppState {
    pub lookup: PostcodeLookup,
    pub store: PostcodeStore,
    pub weather: WeatherProvider,
    pub geocoder: ReverseGeocoder,
    pub google: GoogleOAuth2Provider,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let lookup = PostcodeLookup::new(
            config.postcodes.api_url.clone(),
            Duration::from_secs(config.postcodes.timeout_secs),
        )
        .context("Failed to create postcode lookup client")?;

        let db = UserDataDb::new(&config.storage.database_path).with_context(|| {
            format!(
                "Failed to open user database at {}",
                config.storage.database_path.display()
            )
        })?;
        let store = PostcodeStore::new(db, lookup.clone());

        let unit = match config.weather.units {
            brolly_core::TemperatureUnit::Metric => TemperatureUnit::Metric,
            brolly_core::TemperatureUnit::Imperial => TemperatureUnit::Imperial,
            brolly_core::TemperatureUnit::Standard => TemperatureUnit::Standard,
        };
        let weather = WeatherProvider::new(
            config.weather.api_url.clone(),
            config.weather.api_key.clone(),
            unit,
            Duration::from_secs(config.weather.timeout_secs),
        )
        .context("Failed to create weather client")?;

        let geocoder = ReverseGeocoder::new(
            config.geocode.url.clone(),
            &config.geocode.user_agent,
            Duration::from_secs(config.geocode.timeout_secs),
        )
        .context("Failed to create geocoding client")?;

        let google = GoogleOAuth2Provider::new(
            config.google.client_id.clone(),
            config.google.client_secret.clone(),
            config.google.redirect_url.clone(),
        )
        .with_endpoints(
            config.google.auth_url.clone(),
            config.google.token_url.clone(),
            config.google.userinfo_url.clone(),
        );

        Ok(Self {
            lookup,
            store,
            weather,
            geocoder,
            google,
        })
    }
}
