//! Delivery ETA server - single-page prediction form over HTTP
//!
//! Loads the trained pipeline once at startup and serves the form until
//! interrupted.

use anyhow::Result;
use eta_lib::{observability::StructuredLogger, ModelStore};
use eta_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    info!(model_path = %config.model_path.display(), "Server configured");

    let store = Arc::new(ModelStore::from_path(&config.model_path));
    let logger = StructuredLogger::new("web");
    logger.log_startup(SERVICE_VERSION, store.source());

    let state = Arc::new(api::AppState::new(store.clone(), logger.clone()));

    // Warm the cache so the first visitor does not pay for the load
    match store.load() {
        Ok(model) => {
            state
                .metrics
                .set_model_info(model.model_version(), model.warning.is_none());
        }
        Err(e) => warn!(error = %e, "Model not available yet, will retry on first prediction"),
    }

    api::serve(&config.bind_addr(), state, shutdown_signal()).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
