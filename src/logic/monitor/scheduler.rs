//! Background drift checks
//!
//! Runs every `check_interval`, checking each model with tracked predictions
//! on its own task. A failing or panicking model check is logged and the loop
//! carries on. Cancellation abandons both the sleep and an in-flight round.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use super::engine::MonitorEngine;
use super::registry::ServiceHandle;

pub(crate) async fn run(engine: Arc<MonitorEngine>, mut handle: ServiceHandle) {
    let period = engine.config().check_interval();
    log::info!("Drift check loop started (every {:?})", period);

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = handle.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = handle.cancelled() => {
                log::info!("Drift check round abandoned on shutdown");
                break;
            }
            drifted = check_all(&engine) => {
                if drifted > 0 {
                    log::warn!("Drift check round finished: {} models drifting", drifted);
                } else {
                    log::debug!("Drift check round finished: no drift");
                }
            }
        }
    }

    log::info!("Drift check loop stopped");
}

/// Check every tracked model in parallel. Returns the number of models with drift.
pub(crate) async fn check_all(engine: &Arc<MonitorEngine>) -> usize {
    let models = engine.tracked_models();
    if models.is_empty() {
        return 0;
    }

    let mut tasks = JoinSet::new();
    for model in models {
        let engine = engine.clone();
        tasks.spawn(async move {
            let report = engine.detect_drift(&model, true).await;
            (model, report)
        });
    }

    let mut drifted = 0;
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok((model, report)) if report.is_drift() => {
                drifted += 1;
                log::warn!(
                    "Drift on '{}': {} ({}), retraining required: {}",
                    model,
                    report.drift_type,
                    report.severity,
                    report.requires_retraining
                );
            }
            Ok(_) => {}
            Err(e) => log::error!("Drift check task failed: {}", e),
        }
    }
    drifted
}
