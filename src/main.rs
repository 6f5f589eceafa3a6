use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telebridge::plugins::echo::EchoPlugin;
use telebridge::telemetry::BridgeMetrics;
use telebridge::{Bridge, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,telebridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  API: {}", config.telegram.api_base_url);
    info!("  Poll interval: {}ms", config.telegram.poll_interval_ms);
    info!("  Outbox capacity: {}", config.channels.outbox_capacity);

    let echo = config.plugins.echo.clone();
    let mut bridge = Bridge::new(config, BridgeMetrics::new())?;

    if echo.enabled {
        if let Err(e) = bridge.add_plugin(Arc::new(EchoPlugin::new(echo.queue_capacity))) {
            error!("Plugin registration failed: {:#}", e);
        }
    }

    info!("Bridge is starting...");
    let handle = bridge.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");
    handle.shutdown().await?;

    Ok(())
}
