//! Policy gate daemon - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Policy gate for outbound orders
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PGATE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pgate_telemetry::init_logging()?;

    info!("Starting policy gate v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > PGATE_CONFIG env var > default
    let explicit = args
        .config
        .or_else(|| std::env::var(pgate_daemon::config::CONFIG_PATH_ENV).ok());
    let required = explicit.is_some();
    let config_path =
        explicit.unwrap_or_else(|| pgate_daemon::config::DEFAULT_CONFIG_PATH.to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = pgate_daemon::AppConfig::load(&config_path, required)?;

    let app = pgate_daemon::Application::new(config)?;
    app.run().await?;

    Ok(())
}
