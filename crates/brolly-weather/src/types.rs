use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Units requested from the forecast provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl TemperatureUnit {
    /// Value of the `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Standard => "K",
        }
    }

    /// Wind speed unit that comes back with these units
    pub fn wind_symbol(&self) -> &'static str {
        match self {
            Self::Imperial => "mph",
            Self::Metric | Self::Standard => "m/s",
        }
    }
}

/// Weather condition categories mapped from OpenWeatherMap condition codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert an OpenWeatherMap condition id to a WeatherCondition
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_owm_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Thunderstorm,
            300..=399 => Self::Drizzle,
            502..=504 | 522 => Self::HeavyRain,
            511 => Self::Sleet, // Freezing rain
            500..=599 => Self::Rain,
            611..=616 => Self::Sleet,
            600..=699 => Self::Snow,
            700..=799 => Self::Fog, // Mist, haze, dust and friends
            800 => Self::Clear,
            801 | 802 => Self::PartlyCloudy,
            803 | 804 => Self::Cloudy,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Hourly forecast entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    /// 0-100
    pub precipitation_chance: u8,
    pub condition: WeatherCondition,
    /// Provider's own wording, e.g. "light rain"
    pub description: String,
    /// Provider icon code, e.g. "10d"
    pub icon: String,
}

impl HourlyForecast {
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@2x.png", self.icon)
    }
}

/// Structured address returned by reverse geocoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Best single place name: city > town > village > suburb > county
    pub fn locality(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.suburb.as_deref())
            .or(self.county.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// One-line label such as "Westminster, SW1A 1AA".
    ///
    /// Falls back to the country, then to "Unknown location".
    pub fn summary(&self) -> String {
        let suffix = self
            .postcode
            .as_deref()
            .or(self.country.as_deref())
            .filter(|s| !s.is_empty());

        match (self.locality(), suffix) {
            (Some(place), Some(s)) if s != place => format!("{}, {}", place, s),
            (Some(place), _) => place.to_string(),
            (None, Some(s)) => s.to_string(),
            (None, None) => "Unknown location".to_string(),
        }
    }
}

/// Weather provider and geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owm_code_thunderstorm() {
        assert_eq!(WeatherCondition::from_owm_code(200), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_owm_code(232), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_owm_code_drizzle() {
        assert_eq!(WeatherCondition::from_owm_code(300), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_owm_code(321), WeatherCondition::Drizzle);
    }

    #[test]
    fn test_owm_code_rain() {
        assert_eq!(WeatherCondition::from_owm_code(500), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_owm_code(501), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_owm_code(521), WeatherCondition::Rain);
    }

    #[test]
    fn test_owm_code_heavy_rain() {
        assert_eq!(WeatherCondition::from_owm_code(502), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_owm_code(504), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_owm_code(522), WeatherCondition::HeavyRain);
    }

    #[test]
    fn test_owm_code_sleet() {
        assert_eq!(WeatherCondition::from_owm_code(511), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_owm_code(611), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_owm_code(616), WeatherCondition::Sleet);
    }

    #[test]
    fn test_owm_code_snow() {
        assert_eq!(WeatherCondition::from_owm_code(600), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_owm_code(622), WeatherCondition::Snow);
    }

    #[test]
    fn test_owm_code_atmosphere_is_fog() {
        assert_eq!(WeatherCondition::from_owm_code(701), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_owm_code(741), WeatherCondition::Fog);
    }

    #[test]
    fn test_owm_code_clouds() {
        assert_eq!(WeatherCondition::from_owm_code(800), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_owm_code(801), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_owm_code(802), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_owm_code(803), WeatherCondition::Cloudy);
        assert_eq!(WeatherCondition::from_owm_code(804), WeatherCondition::Cloudy);
    }

    #[test]
    fn test_owm_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_owm_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_owm_code(0), WeatherCondition::Clear);
    }

    #[test]
    fn test_unit_query_values() {
        assert_eq!(TemperatureUnit::Metric.as_query(), "metric");
        assert_eq!(TemperatureUnit::Imperial.symbol(), "°F");
        assert_eq!(TemperatureUnit::Imperial.wind_symbol(), "mph");
    }

    #[test]
    fn test_address_summary_prefers_city_and_postcode() {
        let addr = Address {
            city: Some("London".to_string()),
            suburb: Some("Westminster".to_string()),
            postcode: Some("SW1A 1AA".to_string()),
            country: Some("United Kingdom".to_string()),
            ..Default::default()
        };
        assert_eq!(addr.summary(), "London, SW1A 1AA");
    }

    #[test]
    fn test_address_summary_falls_back_to_country() {
        let addr = Address {
            village: Some("Grasmere".to_string()),
            country: Some("United Kingdom".to_string()),
            ..Default::default()
        };
        assert_eq!(addr.summary(), "Grasmere, United Kingdom");

        let bare = Address {
            country: Some("United Kingdom".to_string()),
            ..Default::default()
        };
        assert_eq!(bare.summary(), "United Kingdom");
        assert_eq!(Address::default().summary(), "Unknown location");
    }
}
