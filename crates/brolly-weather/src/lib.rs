//! Weather lookups for Brolly
//!
//! Hourly forecasts come from OpenWeatherMap, place names from Nominatim
//! reverse geocoding.

pub mod geocode;
pub mod hours;
pub mod provider;
pub mod types;

pub use geocode::ReverseGeocoder;
pub use hours::{hour_labels, upcoming_hour_labels, FORECAST_HOURS};
pub use provider::WeatherProvider;
pub use types::*;
