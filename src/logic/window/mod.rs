//! Window Module - Bounded recent-observation storage
//!
//! Keeps the most recent feature values, predictions and performance scores
//! per model. Memory is bounded per bucket regardless of traffic.
//!
//! # Architecture
//! - `buffer.rs`: `SlidingWindow<T>` FIFO ring buffer
//! - `WindowRegistry<T>`: buckets keyed by `(model, key)`, explicit registration
//! - `SlidingWindowStore`: the three registries a model needs
//!
//! # Locking
//! The bucket map is behind a `RwLock`; each bucket has its own `Mutex`.
//! Writers only contend on the same `(model, key)`. Readers copy the bucket
//! so statistics never see a window change mid-computation.

pub mod buffer;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::logic::drift::Prediction;
use crate::logic::error::WindowError;

pub use buffer::{SlidingWindow, WindowStatus};

pub const PREDICTIONS_KEY: &str = "_predictions";
pub const PERFORMANCE_KEY: &str = "_performance";

/// Names used internally for the prediction and performance series
pub fn is_reserved_key(name: &str) -> bool {
    name == PREDICTIONS_KEY || name == PERFORMANCE_KEY
}

type Bucket<T> = Arc<Mutex<SlidingWindow<T>>>;

// ============================================================================
// WINDOW REGISTRY
// ============================================================================

pub struct WindowRegistry<T> {
    label: &'static str,
    capacity: usize,
    max_keys_per_model: usize,
    buckets: RwLock<HashMap<String, HashMap<String, Bucket<T>>>>,
}

impl<T: Clone> WindowRegistry<T> {
    pub fn new(label: &'static str, capacity: usize, max_keys_per_model: usize) -> Self {
        Self {
            label,
            capacity,
            max_keys_per_model,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Create the bucket for `(model, key)`. Returns `true` if it was new.
    pub fn register(&self, model: &str, key: &str) -> Result<bool, WindowError> {
        if self.bucket(model, key).is_some() {
            return Ok(false);
        }

        let mut buckets = self.buckets.write();
        let keys = buckets.entry(model.to_string()).or_default();

        // Another writer may have won the race
        if keys.contains_key(key) {
            return Ok(false);
        }
        if keys.len() >= self.max_keys_per_model {
            return Err(WindowError::KeyLimitReached {
                model: model.to_string(),
                limit: self.max_keys_per_model,
            });
        }

        keys.insert(
            key.to_string(),
            Arc::new(Mutex::new(SlidingWindow::new(self.capacity))),
        );
        log::info!(
            "Registered {} window '{}' for model '{}' (capacity: {})",
            self.label,
            key,
            model,
            self.capacity
        );
        Ok(true)
    }

    /// Append to a registered bucket, evicting the oldest value when full
    pub fn record(&self, model: &str, key: &str, value: T) -> Result<(), WindowError> {
        let bucket = self
            .bucket(model, key)
            .ok_or_else(|| WindowError::NotRegistered {
                model: model.to_string(),
                key: key.to_string(),
            })?;

        bucket.lock().push(value);
        Ok(())
    }

    /// Point-in-time copy, oldest first. Empty for unknown buckets.
    pub fn read(&self, model: &str, key: &str) -> Vec<T> {
        self.bucket(model, key)
            .map(|b| b.lock().snapshot())
            .unwrap_or_default()
    }

    pub fn size(&self, model: &str, key: &str) -> usize {
        self.bucket(model, key).map(|b| b.lock().len()).unwrap_or(0)
    }

    pub fn is_registered(&self, model: &str, key: &str) -> bool {
        self.bucket(model, key).is_some()
    }

    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.buckets.read().keys().cloned().collect();
        models.sort();
        models
    }

    /// Copy every bucket of one model
    pub fn snapshot_model(&self, model: &str) -> BTreeMap<String, Vec<T>> {
        let buckets: Vec<(String, Bucket<T>)> = match self.buckets.read().get(model) {
            Some(keys) => keys.iter().map(|(k, b)| (k.clone(), b.clone())).collect(),
            None => return BTreeMap::new(),
        };

        buckets
            .into_iter()
            .map(|(k, b)| {
                let values = b.lock().snapshot();
                (k, values)
            })
            .collect()
    }

    pub fn status(&self, model: &str) -> BTreeMap<String, WindowStatus> {
        let buckets: Vec<(String, Bucket<T>)> = match self.buckets.read().get(model) {
            Some(keys) => keys.iter().map(|(k, b)| (k.clone(), b.clone())).collect(),
            None => return BTreeMap::new(),
        };

        buckets
            .into_iter()
            .map(|(k, b)| {
                let status = b.lock().status();
                (k, status)
            })
            .collect()
    }

    fn bucket(&self, model: &str, key: &str) -> Option<Bucket<T>> {
        self.buckets
            .read()
            .get(model)
            .and_then(|keys| keys.get(key))
            .cloned()
    }
}

// ============================================================================
// SLIDING WINDOW STORE
// ============================================================================

/// Point-in-time copy of all windows of one model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSnapshot {
    pub features: BTreeMap<String, Vec<f64>>,
    pub predictions: Vec<Prediction>,
    pub performance: Vec<f64>,
}

impl ModelSnapshot {
    /// Largest number of current observations across all windows
    pub fn sample_count(&self) -> usize {
        self.features
            .values()
            .map(Vec::len)
            .chain([self.predictions.len(), self.performance.len()])
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelWindowStatus {
    pub features: BTreeMap<String, WindowStatus>,
    pub predictions: Option<WindowStatus>,
    pub performance: Option<WindowStatus>,
}

pub struct SlidingWindowStore {
    features: WindowRegistry<f64>,
    predictions: WindowRegistry<Prediction>,
    performance: WindowRegistry<f64>,
}

impl SlidingWindowStore {
    pub fn new(capacity: usize, max_keys_per_model: usize) -> Self {
        Self {
            features: WindowRegistry::new("feature", capacity, max_keys_per_model),
            predictions: WindowRegistry::new("prediction", capacity, 1),
            performance: WindowRegistry::new("performance", capacity, 1),
        }
    }

    pub fn features(&self) -> &WindowRegistry<f64> {
        &self.features
    }

    pub fn predictions(&self) -> &WindowRegistry<Prediction> {
        &self.predictions
    }

    pub fn performance(&self) -> &WindowRegistry<f64> {
        &self.performance
    }

    /// Register (if needed) and record a feature value
    pub fn record_feature(&self, model: &str, feature: &str, value: f64) -> Result<(), WindowError> {
        self.features.register(model, feature)?;
        self.features.record(model, feature, value)
    }

    pub fn record_prediction(&self, model: &str, prediction: Prediction) -> Result<(), WindowError> {
        self.predictions.register(model, PREDICTIONS_KEY)?;
        self.predictions.record(model, PREDICTIONS_KEY, prediction)
    }

    pub fn record_performance(&self, model: &str, score: f64) -> Result<(), WindowError> {
        self.performance.register(model, PERFORMANCE_KEY)?;
        self.performance.record(model, PERFORMANCE_KEY, score)
    }

    /// Models that have tracked at least one prediction
    pub fn tracked_models(&self) -> Vec<String> {
        self.predictions.models()
    }

    /// Any window exists for `model`
    pub fn has_model(&self, model: &str) -> bool {
        self.predictions.is_registered(model, PREDICTIONS_KEY)
            || self.performance.is_registered(model, PERFORMANCE_KEY)
            || !self.features.status(model).is_empty()
    }

    pub fn snapshot(&self, model: &str) -> ModelSnapshot {
        ModelSnapshot {
            features: self.features.snapshot_model(model),
            predictions: self.predictions.read(model, PREDICTIONS_KEY),
            performance: self.performance.read(model, PERFORMANCE_KEY),
        }
    }

    pub fn status(&self, model: &str) -> ModelWindowStatus {
        ModelWindowStatus {
            features: self.features.status(model),
            predictions: self.predictions.status(model).remove(PREDICTIONS_KEY),
            performance: self.performance.status(model).remove(PERFORMANCE_KEY),
        }
    }
}
