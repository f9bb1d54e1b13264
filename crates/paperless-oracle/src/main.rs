//! Paperless verification oracle: entry point.
//!
//! Serves `POST /verify-aadhaar` with configuration from a TOML file or
//! defaults.

mod api;
mod config;
mod error;
mod state;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::OracleConfig;
use state::OracleState;

/// Paperless verification oracle
#[derive(Parser, Debug)]
#[command(name = "paperless-oracle", version, about = "Offline KYC verification oracle")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "paperless-oracle.toml")]
    config: PathBuf,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init {
        init_tracing("info", "text");
        let config = OracleConfig::default();
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    let mut config = OracleConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging.level, &config.logging.format);
    tracing::info!("Paperless oracle v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(OracleState::from_config(&config)?);
    api::start_api_server(config.socket_addr()?, state, config.api.max_upload_bytes).await?;

    tracing::info!("oracle exited cleanly");
    Ok(())
}
