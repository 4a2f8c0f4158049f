pub mod config;
pub mod error;

pub use config::{
    Config, GeocodeConfig, GoogleConfig, PostcodesConfig, ServerConfig, StorageConfig,
    TemperatureUnit, ValidationResult, WeatherConfig,
};
pub use error::{
    AppError, AuthError, DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
    WeatherError,
};

use anyhow::Result;

/// Initialize tracing/logging.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when `verbose`.
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("Brolly core initialized");
    Ok(())
}
