use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Prefix for environment overrides, e.g. `BROLLY_WEATHER__API_KEY`.
pub const ENV_PREFIX: &str = "BROLLY";

/// Minimum length of the cookie signing secret, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener and session cookie settings
    pub server: ServerConfig,

    /// Where the user postcode database lives
    pub storage: StorageConfig,

    /// Forecast provider settings
    pub weather: WeatherConfig,

    /// Reverse geocoding settings
    pub geocode: GeocodeConfig,

    /// Postcode lookup service settings
    pub postcodes: PostcodesConfig,

    /// Google OAuth settings
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Secret used to sign and encrypt the session cookie.
    ///
    /// Must be at least 64 bytes. When empty a random key is generated at
    /// startup and sessions do not survive a restart.
    pub session_secret: String,

    pub cookie_name: String,

    /// Only send the session cookie over HTTPS
    pub cookie_secure: bool,

    /// Lifetime of a signed-in session
    pub session_ttl_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            session_secret: String::new(),
            cookie_name: "brolly-session".to_string(),
            cookie_secure: false,
            session_ttl_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let database_path = dirs::data_dir()
            .map(|d| d.join("brolly"))
            .unwrap_or_else(|| PathBuf::from("databases"))
            .join("userdata.db");
        Self { database_path }
    }
}

/// Temperature unit preference, as understood by the forecast provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Metric,
    Imperial,
    Standard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: String,
    pub api_url: String,
    pub units: TemperatureUnit,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: "YOUR_OWM_API_KEY".to_string(),
            api_url: "https://api.openweathermap.org/data/3.0/onecall".to_string(),
            units: TemperatureUnit::Metric,
            timeout_secs: 10,
        }
    }
}

impl WeatherConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_key.starts_with("YOUR_")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    pub url: String,
    /// Nominatim rejects requests without an identifying user agent
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: concat!("brolly/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostcodesConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for PostcodesConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.postcodes.io".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Google OAuth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Create at: https://console.cloud.google.com/apis/credentials
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    /// Absolute URL of this app's `/authorize` route
    pub redirect_url: String,
}

impl GoogleConfig {
    /// Check if credentials are configured (not placeholders)
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.client_id.starts_with("YOUR_")
            && !self.client_secret.starts_with("YOUR_")
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: "YOUR_GOOGLE_CLIENT_ID".to_string(),
            client_secret: "YOUR_GOOGLE_CLIENT_SECRET".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            redirect_url: "http://localhost:5000/authorize".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Layers, lowest precedence first: built-in defaults, the TOML file at
    /// `path` (or the default location when `None`; a missing file is not an
    /// error), then `BROLLY_*` environment variables with `__` between
    /// nested keys.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// `env` stands in for the process environment when given.
    fn load_from(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        tracing::debug!("Loading configuration from {}", path.display());

        let defaults = config::Config::try_from(&Self::default())
            .context("Failed to build default configuration")?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize::<Config>()
            .context("Failed to parse configuration")
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails; warnings are logged.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = Self::load(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }

        if self.server.session_secret.is_empty() {
            result.add_warning(
                "server.session_secret",
                "No session secret set - sessions will not survive a restart",
            );
        } else if self.server.session_secret.len() < MIN_SESSION_SECRET_LEN {
            result.add_error(
                "server.session_secret",
                format!("Session secret must be at least {MIN_SESSION_SECRET_LEN} bytes"),
            );
        }

        if self.server.cookie_name.trim().is_empty() {
            result.add_error("server.cookie_name", "Cookie name cannot be empty");
        }

        if self.server.session_ttl_days == 0 {
            result.add_error("server.session_ttl_days", "Session lifetime must be at least 1 day");
        }

        self.validate_url(&self.weather.api_url, "weather.api_url", &mut result);
        self.validate_url(&self.geocode.url, "geocode.url", &mut result);
        self.validate_url(&self.postcodes.api_url, "postcodes.api_url", &mut result);
        self.validate_url(&self.google.auth_url, "google.auth_url", &mut result);
        self.validate_url(&self.google.token_url, "google.token_url", &mut result);
        self.validate_url(&self.google.userinfo_url, "google.userinfo_url", &mut result);
        self.validate_url(&self.google.redirect_url, "google.redirect_url", &mut result);

        if self.geocode.user_agent.trim().is_empty() {
            result.add_error("geocode.user_agent", "Nominatim requires a user agent");
        }

        if !self.weather.is_configured() {
            result.add_warning(
                "weather.api_key",
                "OpenWeatherMap API key not configured - forecasts will fail",
            );
        }

        if !self.google.is_configured() {
            result.add_warning(
                "google",
                "Google OAuth not configured - sign-in will be unavailable",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// `<config dir>/brolly/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("brolly");

        Ok(config_dir.join("config.toml"))
    }
}
