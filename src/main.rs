//! Model Drift Monitor - Host entry point
//!
//! Loads `.env`, initialises logging, opens the SQLite store and runs the
//! drift monitor until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;

use model_drift_monitor::logic::config::{database_path, DriftConfig};
use model_drift_monitor::logic::monitor::{DriftMonitor, TaskRegistry};
use model_drift_monitor::logic::store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Model Drift Monitor v{}...", env!("CARGO_PKG_VERSION"));

    let config = DriftConfig::from_env();
    config.validate().context("invalid drift configuration")?;

    let db_path = database_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open drift store at {}", db_path.display()))?;

    let monitor = DriftMonitor::new(config, Arc::new(store))?;
    let registry = Arc::new(TaskRegistry::new());
    monitor.start(registry.clone()).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    log::info!("Shutdown requested");

    registry.shutdown_all();
    monitor.stop().await?;

    log::info!("Model Drift Monitor exited cleanly");
    Ok(())
}
