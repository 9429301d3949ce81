//! Baseline Module - Reference distributions per model
//!
//! Loads and saves feature baselines, the prediction baseline and the
//! performance baseline of each model through the persistent store, and keeps
//! an in-memory cache that every drift check reads from.
//!
//! # Architecture
//! - `types.rs`: `ModelBaseline`, `BaselineUpdate`
//!
//! # Failure Strategy
//! Store unreachable on load -> warn and continue with an empty baseline.
//! A model without a baseline simply reports no drift.

pub mod types;
#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::logic::drift::Prediction;
use crate::logic::error::{DriftError, StoreError};
use crate::logic::store::rows::{format_timestamp, parse_timestamp};
use crate::logic::store::{
    from_row, to_row, BaselineDistributionRow, BaselinePerformanceRow, PersistentStore, Query, Row,
    Table,
};
use crate::logic::window::PREDICTIONS_KEY;

pub use types::{BaselineUpdate, ModelBaseline};

pub struct BaselineRepository {
    store: Arc<dyn PersistentStore>,
    cache: RwLock<HashMap<String, Arc<ModelBaseline>>>,
}

impl BaselineRepository {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cached baseline snapshot. Later saves never mutate a returned snapshot.
    pub fn get(&self, model: &str) -> Option<Arc<ModelBaseline>> {
        self.cache.read().get(model).cloned()
    }

    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.cache.read().keys().cloned().collect();
        models.sort();
        models
    }

    /// Restore one model's baseline from the store. Fails soft.
    pub async fn load(&self, model: &str) -> Arc<ModelBaseline> {
        match self.try_load(model).await {
            Ok(baseline) => {
                let baseline = Arc::new(baseline);
                if !baseline.is_empty() {
                    self.cache.write().insert(model.to_string(), baseline.clone());
                    log::info!(
                        "Loaded baseline for '{}' ({} features, predictions: {}, performance: {:?})",
                        model,
                        baseline.features.len(),
                        baseline.predictions.is_some(),
                        baseline.performance
                    );
                }
                baseline
            }
            Err(e) => {
                log::warn!("Baseline load failed for '{}': {}. Continuing without baseline.", model, e);
                Arc::new(ModelBaseline::default())
            }
        }
    }

    pub async fn try_load(&self, model: &str) -> Result<ModelBaseline, StoreError> {
        let distributions = self
            .store
            .select(Query::table(Table::BaselineDistributions).eq("model_name", model))
            .await?;
        let performance = self
            .store
            .select(Query::table(Table::BaselinePerformance).eq("model_name", model))
            .await?;

        Ok(assemble(distributions, performance)
            .remove(model)
            .unwrap_or_default())
    }

    /// Restore every persisted baseline. Returns the number of models loaded.
    pub async fn load_all(&self) -> usize {
        let rows = async {
            let distributions = self
                .store
                .select(Query::table(Table::BaselineDistributions))
                .await?;
            let performance = self
                .store
                .select(Query::table(Table::BaselinePerformance))
                .await?;
            Ok::<_, StoreError>((distributions, performance))
        }
        .await;

        match rows {
            Ok((distributions, performance)) => {
                let baselines = assemble(distributions, performance);
                let count = baselines.len();
                let mut cache = self.cache.write();
                for (model, baseline) in baselines {
                    cache.insert(model, Arc::new(baseline));
                }
                log::info!("Restored baselines for {} models", count);
                count
            }
            Err(e) => {
                log::warn!("Baseline restore failed: {}. Starting with empty baselines.", e);
                0
            }
        }
    }

    /// Apply a partial update. The cache changes first, so checks in this
    /// process see the new baseline even if the store write fails.
    pub async fn save(&self, model: &str, update: &BaselineUpdate) -> Result<(), DriftError> {
        update.validate(model)?;

        let now = Utc::now();
        {
            let mut cache = self.cache.write();
            let mut baseline = cache
                .get(model)
                .map(|b| (**b).clone())
                .unwrap_or_default();
            baseline.apply(update, now);
            cache.insert(model.to_string(), Arc::new(baseline));
        }

        let updated_at = format_timestamp(&now);
        let mut rows: Vec<(Table, Row)> = Vec::new();

        if let Some(features) = &update.features {
            for (name, values) in features {
                let row = BaselineDistributionRow {
                    model_name: model.to_string(),
                    feature_name: name.clone(),
                    distribution_json: serde_json::to_string(values).map_err(StoreError::from)?,
                    updated_at: updated_at.clone(),
                };
                rows.push((Table::BaselineDistributions, to_row(Table::BaselineDistributions, &row)?));
            }
        }

        if let Some(predictions) = &update.predictions {
            let row = BaselineDistributionRow {
                model_name: model.to_string(),
                feature_name: PREDICTIONS_KEY.to_string(),
                distribution_json: serde_json::to_string(predictions).map_err(StoreError::from)?,
                updated_at: updated_at.clone(),
            };
            rows.push((Table::BaselineDistributions, to_row(Table::BaselineDistributions, &row)?));
        }

        if let Some(score) = update.performance_score {
            let row = BaselinePerformanceRow {
                model_name: model.to_string(),
                baseline_score: score,
                updated_at,
            };
            rows.push((Table::BaselinePerformance, to_row(Table::BaselinePerformance, &row)?));
        }

        for (table, row) in rows {
            self.store.upsert(table, row).await?;
        }

        log::info!("Baseline updated for '{}'", model);
        Ok(())
    }
}

/// Group stored rows into per-model baselines. Unreadable rows are skipped.
fn assemble(distributions: Vec<Row>, performance: Vec<Row>) -> HashMap<String, ModelBaseline> {
    let mut baselines: HashMap<String, ModelBaseline> = HashMap::new();

    for row in distributions {
        let row: BaselineDistributionRow = match from_row(row) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping unreadable baseline row: {}", e);
                continue;
            }
        };

        let baseline = baselines.entry(row.model_name.clone()).or_default();
        touch(baseline, &row.updated_at);

        if row.feature_name == PREDICTIONS_KEY {
            match serde_json::from_str::<Vec<Prediction>>(&row.distribution_json) {
                Ok(values) => baseline.predictions = Some(values),
                Err(e) => log::warn!("Bad prediction baseline for '{}': {}", row.model_name, e),
            }
        } else {
            match serde_json::from_str::<Vec<f64>>(&row.distribution_json) {
                Ok(values) => {
                    baseline.features.insert(row.feature_name, values);
                }
                Err(e) => log::warn!(
                    "Bad baseline for '{}'/'{}': {}",
                    row.model_name,
                    row.feature_name,
                    e
                ),
            }
        }
    }

    for row in performance {
        match from_row::<BaselinePerformanceRow>(row) {
            Ok(r) => {
                let baseline = baselines.entry(r.model_name.clone()).or_default();
                touch(baseline, &r.updated_at);
                baseline.performance = Some(r.baseline_score);
            }
            Err(e) => log::warn!("Skipping unreadable performance row: {}", e),
        }
    }

    baselines
}

fn touch(baseline: &mut ModelBaseline, updated_at: &str) {
    if let Ok(ts) = parse_timestamp(updated_at) {
        if baseline.updated_at.map_or(true, |current| ts > current) {
            baseline.updated_at = Some(ts);
        }
    }
}
