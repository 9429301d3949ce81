//! Monitor Module - Drift monitoring service
//!
//! `DriftMonitor` is the caller-facing service: it tracks predictions,
//! evaluates drift on demand or on a timer, maintains baselines and summarizes
//! persisted reports.
//!
//! # Architecture
//! - `engine.rs`: shared state and the detect pipeline
//! - `scheduler.rs`: periodic background checks
//! - `registry.rs`: service registry + cancellation handles
//! - `alert.rs`: alert hook
//! - `summary.rs`: report aggregation types
//!
//! # Lifecycle
//! Nothing runs in the background until `start()`. `stop()` cancels the loop
//! and waits for it to exit.
//!
//! # Failure Strategy
//! Persistence errors are logged and never block tracking or detection.
//! `detect_drift` always returns a report; use `try_detect_drift` for the cause.

pub mod alert;
pub mod registry;
pub mod summary;
mod engine;
mod scheduler;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::constants::SERVICE_NAME;
use crate::logic::baseline::{BaselineUpdate, ModelBaseline};
use crate::logic::config::DriftConfig;
use crate::logic::drift::{DriftReport, Prediction};
use crate::logic::error::{DriftError, DriftResult};
use crate::logic::store::PersistentStore;
use crate::logic::window::ModelWindowStatus;

use engine::MonitorEngine;

pub use alert::{AlertSink, LogAlertSink};
pub use registry::{ServiceHandle, ServiceRegistry, TaskRegistry};
pub use summary::{DriftSummary, ModelDriftSummary};

struct Running {
    handle: ServiceHandle,
    registry: Arc<dyn ServiceRegistry>,
    task: JoinHandle<()>,
}

pub struct DriftMonitor {
    engine: Arc<MonitorEngine>,
    running: AsyncMutex<Option<Running>>,
}

impl DriftMonitor {
    /// Monitor with the logging alert sink
    pub fn new(config: DriftConfig, store: Arc<dyn PersistentStore>) -> DriftResult<Self> {
        Self::with_alert_sink(config, store, Arc::new(LogAlertSink))
    }

    pub fn with_alert_sink(
        config: DriftConfig,
        store: Arc<dyn PersistentStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> DriftResult<Self> {
        config.validate()?;
        Ok(Self {
            engine: Arc::new(MonitorEngine::new(config, store, alerts)),
            running: AsyncMutex::new(None),
        })
    }

    pub fn config(&self) -> &DriftConfig {
        self.engine.config()
    }

    // ========================================================================
    // CALLER API
    // ========================================================================

    /// Record one prediction (and its outcome, when known)
    pub fn track_prediction(
        &self,
        model: &str,
        features: &BTreeMap<String, f64>,
        prediction: Prediction,
        actual: Option<Prediction>,
        metadata: Option<Value>,
    ) -> DriftResult<()> {
        self.engine
            .track_prediction(model, features, prediction, actual, metadata)
    }

    pub async fn detect_drift(&self, model: &str, check_all_types: bool) -> DriftReport {
        self.engine.detect_drift(model, check_all_types).await
    }

    pub async fn try_detect_drift(&self, model: &str, check_all_types: bool) -> DriftResult<DriftReport> {
        self.engine.try_detect_drift(model, check_all_types).await
    }

    /// Partial baseline update. Store failures are logged, the cached baseline
    /// is used regardless.
    pub async fn update_baseline(&self, model: &str, update: BaselineUpdate) -> DriftResult<()> {
        self.engine.update_baseline(model, update).await
    }

    pub async fn get_drift_summary(&self, hours: u32) -> DriftResult<DriftSummary> {
        self.engine.get_drift_summary(hours).await
    }

    pub fn tracked_models(&self) -> Vec<String> {
        self.engine.tracked_models()
    }

    pub fn recent_reports(&self, model: &str, limit: usize) -> Vec<DriftReport> {
        self.engine.recent_reports(model, limit)
    }

    pub fn window_status(&self, model: &str) -> ModelWindowStatus {
        self.engine.window_status(model)
    }

    pub fn baseline(&self, model: &str) -> Option<Arc<ModelBaseline>> {
        self.engine.baseline(model)
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Restore baselines, register with `registry` and spawn the check loop
    pub async fn start(&self, registry: Arc<dyn ServiceRegistry>) -> DriftResult<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(DriftError::AlreadyRunning);
        }

        let restored = self.engine.baselines().load_all().await;
        let handle = registry.register_service(SERVICE_NAME)?;
        let task = tokio::spawn(scheduler::run(self.engine.clone(), handle.clone()));

        *running = Some(Running {
            handle,
            registry,
            task,
        });

        log::info!(
            "Drift monitor started ({} baselines restored, interval {}s)",
            restored,
            self.engine.config().check_interval_secs
        );
        Ok(())
    }

    /// Cancel the loop and wait for it to finish
    pub async fn stop(&self) -> DriftResult<()> {
        let Some(running) = self.running.lock().await.take() else {
            return Err(DriftError::NotRunning);
        };

        running.handle.cancel();
        let joined = running.task.await;
        running.registry.unregister_service(running.handle.name());
        joined.map_err(|e| DriftError::Task(e.to_string()))?;

        log::info!("Drift monitor stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// One round of background checks, outside the timer
    pub async fn check_all_models(&self) -> usize {
        scheduler::check_all(&self.engine).await
    }
}
