use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use brolly_core::Config;
use brolly_web::{create_server, AppState, SessionSettings};

/// Hourly weather for UK postcodes, with saved postcodes per Google account.
#[derive(Debug, Parser)]
#[command(name = "brolly", version, about)]
struct Args {
    /// Address to listen on [default: server.host, 0.0.0.0]
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on [default: server.port, 5000]
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    debug: bool,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    brolly_core::init(args.debug)?;

    let (mut config, _validation) = Config::load_validated(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let state = AppState::from_config(&config)?;
    let session = SessionSettings::from_config(&config.server)?;

    tracing::info!("Brolly {} starting", env!("CARGO_PKG_VERSION"));

    create_server(state, session, &config.server.host, config.server.port)?.await?;

    tracing::info!("Brolly stopped");
    Ok(())
}
