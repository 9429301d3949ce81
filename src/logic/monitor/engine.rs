//! Monitor engine
//!
//! Shared state behind `DriftMonitor`: windows, baselines, the evaluation
//! pipeline, per-model locks and the report history. The background loop holds
//! an `Arc` of this.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use super::alert::AlertSink;
use super::summary::DriftSummary;
use crate::constants::MAX_REPORT_HISTORY;
use crate::logic::baseline::{BaselineRepository, BaselineUpdate, ModelBaseline};
use crate::logic::config::DriftConfig;
use crate::logic::drift::{
    DriftEvaluator, DriftReport, Evaluation, Prediction, RecommendationEngine, SeverityClassifier,
};
use crate::logic::error::{DriftError, DriftResult, StoreError};
use crate::logic::store::rows::format_timestamp;
use crate::logic::store::{
    from_row, to_row, DriftReportRow, PersistentStore, PredictionTrackingRow, Query, Table,
};
use crate::logic::window::{is_reserved_key, ModelSnapshot, ModelWindowStatus, SlidingWindowStore};

pub(crate) struct MonitorEngine {
    config: DriftConfig,
    store: Arc<dyn PersistentStore>,
    alerts: Arc<dyn AlertSink>,
    windows: SlidingWindowStore,
    baselines: BaselineRepository,
    evaluator: DriftEvaluator,
    classifier: SeverityClassifier,
    recommender: RecommendationEngine,
    model_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    history: RwLock<HashMap<String, Vec<DriftReport>>>,
}

impl MonitorEngine {
    pub fn new(config: DriftConfig, store: Arc<dyn PersistentStore>, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            windows: SlidingWindowStore::new(config.window_size, config.max_keys_per_model),
            baselines: BaselineRepository::new(store.clone()),
            evaluator: DriftEvaluator::new(config.clone()),
            classifier: SeverityClassifier::new(config.thresholds.clone()),
            recommender: RecommendationEngine::new(),
            model_locks: Mutex::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            config,
            store,
            alerts,
        }
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    pub fn baselines(&self) -> &BaselineRepository {
        &self.baselines
    }

    // ========================================================================
    // TRACKING
    // ========================================================================

    pub fn track_prediction(
        &self,
        model: &str,
        features: &BTreeMap<String, f64>,
        prediction: Prediction,
        actual: Option<Prediction>,
        metadata: Option<Value>,
    ) -> DriftResult<()> {
        validate_model_name(model)?;
        if let Some(name) = features.keys().find(|name| is_reserved_key(name)) {
            return Err(DriftError::InvalidInput(format!("feature name '{}' is reserved", name)));
        }
        if let Some((name, _)) = features.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DriftError::InvalidInput(format!("feature '{}' is not finite", name)));
        }
        for value in std::iter::once(&prediction).chain(actual.as_ref()) {
            if value.as_numeric().is_some_and(|v| !v.is_finite()) {
                return Err(DriftError::InvalidInput(format!("prediction '{}' is not finite", value)));
            }
        }

        for (name, value) in features {
            if let Err(e) = self.windows.record_feature(model, name, *value) {
                log::warn!("Dropping feature '{}' of '{}': {}", name, model, e);
            }
        }
        self.windows.record_prediction(model, prediction.clone())?;

        if let Some(actual) = &actual {
            match prediction.score_against(actual) {
                Some(score) => self.windows.record_performance(model, score)?,
                None => log::warn!(
                    "'{}': prediction {:?} and actual {:?} are of different kinds, no performance score",
                    model,
                    prediction,
                    actual
                ),
            }
        }

        self.persist_tracking(model, features, &prediction, actual.as_ref(), metadata.as_ref());
        Ok(())
    }

    /// Fire-and-forget write of the raw tracking row
    fn persist_tracking(
        &self,
        model: &str,
        features: &BTreeMap<String, f64>,
        prediction: &Prediction,
        actual: Option<&Prediction>,
        metadata: Option<&Value>,
    ) {
        let row = PredictionTrackingRow::new(model, features, prediction, actual, metadata)
            .and_then(|r| to_row(Table::PredictionTracking, &r));
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Failed to encode tracking row for '{}': {}", model, e);
                return;
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::debug!("No async runtime, tracking row for '{}' not persisted", model);
            return;
        };

        let store = self.store.clone();
        let model = model.to_string();
        runtime.spawn(async move {
            if let Err(e) = store.upsert(Table::PredictionTracking, row).await {
                log::warn!("Failed to persist tracking row for '{}': {}", model, e);
            }
        });
    }

    // ========================================================================
    // DETECTION
    // ========================================================================

    /// Outer boundary: any failure becomes a degraded report
    pub async fn detect_drift(&self, model: &str, check_all_types: bool) -> DriftReport {
        match self.try_detect_drift(model, check_all_types).await {
            Ok(report) => report,
            Err(e) => {
                log::error!("Drift detection failed for '{}': {}", model, e);
                DriftReport::degraded(model)
            }
        }
    }

    pub async fn try_detect_drift(&self, model: &str, check_all_types: bool) -> DriftResult<DriftReport> {
        validate_model_name(model)?;

        // Never tracked and no baseline: nothing to compare, nothing to keep
        if !self.is_known(model) {
            log::debug!("'{}' has no windows or baseline, skipping detection", model);
            let evaluation = self
                .evaluator
                .evaluate(model, &ModelSnapshot::default(), None, check_all_types)?;
            return Ok(self.build_report(model, evaluation));
        }

        let lock = self.model_lock(model);
        let _guard = lock.lock().await;

        let snapshot = self.windows.snapshot(model);
        let baseline = self.baselines.get(model);
        let evaluation = self
            .evaluator
            .evaluate(model, &snapshot, baseline.as_deref(), check_all_types)?;
        let report = self.build_report(model, evaluation);

        if let Err(e) = self.persist_report(&report).await {
            log::error!("Drift report for '{}' not persisted: {}", model, e);
        }
        self.remember(&report);

        if report.is_drift() {
            log::info!(
                "'{}': {} ({}), confidence {:.2}",
                model,
                report.drift_type,
                report.severity,
                report.confidence
            );
        }
        if report.requires_retraining {
            self.alerts.raise_alert(&report);
        }

        Ok(report)
    }

    fn build_report(&self, model: &str, evaluation: Evaluation) -> DriftReport {
        let drift_type = evaluation.overall_type();
        let severity = self.classifier.classify(&evaluation.drift_types, &evaluation.metrics);
        let recommendations = self.recommender.recommend(
            drift_type,
            severity,
            &evaluation.metrics,
            &evaluation.affected_features,
        );

        DriftReport {
            report_id: Uuid::new_v4(),
            model_name: model.to_string(),
            detection_timestamp: Utc::now(),
            drift_type,
            severity,
            metrics: evaluation.metrics,
            affected_features: evaluation.affected_features,
            recommendations,
            requires_retraining: severity.requires_retraining(),
            confidence: evaluation.confidence,
        }
    }

    /// Tracked at least once or has a baseline
    fn is_known(&self, model: &str) -> bool {
        self.windows.has_model(model) || self.baselines.get(model).is_some()
    }

    fn model_lock(&self, model: &str) -> Arc<AsyncMutex<()>> {
        self.model_locks
            .lock()
            .entry(model.to_string())
            .or_insert_with(|| {
                log::debug!("Created detection lock for '{}'", model);
                Arc::new(AsyncMutex::new(()))
            })
            .clone()
    }

    #[cfg(test)]
    pub fn lock_count(&self) -> usize {
        self.model_locks.lock().len()
    }

    async fn persist_report(&self, report: &DriftReport) -> Result<(), StoreError> {
        let row = to_row(Table::DriftReports, &DriftReportRow::from_report(report)?)?;
        let attempts = self.config.persist_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.store.upsert(Table::DriftReports, row.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    log::warn!(
                        "Report write for '{}' failed (attempt {}/{}): {}",
                        report.model_name,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(self.config.persist_backoff() * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn remember(&self, report: &DriftReport) {
        let mut history = self.history.write();
        let reports = history.entry(report.model_name.clone()).or_default();
        reports.push(report.clone());

        if reports.len() > MAX_REPORT_HISTORY {
            let half = reports.len() / 2;
            reports.drain(0..half);
        }
    }

    // ========================================================================
    // BASELINES & SUMMARY
    // ========================================================================

    pub async fn update_baseline(&self, model: &str, update: BaselineUpdate) -> DriftResult<()> {
        validate_model_name(model)?;
        match self.baselines.save(model, &update).await {
            Ok(()) => Ok(()),
            Err(DriftError::Store(e)) => {
                log::error!("Baseline for '{}' kept in memory only: {}", model, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Aggregate persisted reports of the trailing `hours`
    pub async fn get_drift_summary(&self, hours: u32) -> DriftResult<DriftSummary> {
        // Windows reaching past the earliest representable instant cover everything
        let cutoff = Duration::try_hours(i64::from(hours)).and_then(|d| Utc::now().checked_sub_signed(d));
        let (since, query) = match cutoff {
            Some(since) => (
                since,
                Query::table(Table::DriftReports).gte("detection_timestamp", format_timestamp(&since)),
            ),
            None => (DateTime::<Utc>::MIN_UTC, Query::table(Table::DriftReports)),
        };
        let rows = self.store.select(query).await?;

        let mut summary = DriftSummary::new(hours, since);
        for row in rows {
            match from_row::<DriftReportRow>(row).and_then(DriftReportRow::into_report) {
                Ok(report) => summary.add(&report),
                Err(e) => log::warn!("Skipping unreadable drift report: {}", e),
            }
        }
        Ok(summary)
    }

    // ========================================================================
    // INSPECTION
    // ========================================================================

    pub fn tracked_models(&self) -> Vec<String> {
        self.windows.tracked_models()
    }

    /// Newest first
    pub fn recent_reports(&self, model: &str, limit: usize) -> Vec<DriftReport> {
        self.history
            .read()
            .get(model)
            .map(|reports| reports.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn window_status(&self, model: &str) -> ModelWindowStatus {
        self.windows.status(model)
    }

    pub fn baseline(&self, model: &str) -> Option<Arc<ModelBaseline>> {
        self.baselines.get(model)
    }
}

fn validate_model_name(model: &str) -> DriftResult<()> {
    if model.trim().is_empty() {
        return Err(DriftError::InvalidInput("model name is empty".to_string()));
    }
    Ok(())
}
