use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::drift::Prediction;
use crate::logic::error::DriftError;
use crate::logic::window::is_reserved_key;

// ============================================================================
// MODEL BASELINE
// ============================================================================

/// Reference data for one model, captured when it was last known-good
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelBaseline {
    /// Reference population per feature, in stored order
    pub features: BTreeMap<String, Vec<f64>>,

    /// Reference model outputs
    pub predictions: Option<Vec<Prediction>>,

    /// Reference performance score
    pub performance: Option<f64>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl ModelBaseline {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.predictions.is_none() && self.performance.is_none()
    }

    /// Apply a partial update; components not supplied are left alone
    pub fn apply(&mut self, update: &BaselineUpdate, now: DateTime<Utc>) {
        if let Some(features) = &update.features {
            for (name, values) in features {
                self.features.insert(name.clone(), values.clone());
            }
        }
        if let Some(predictions) = &update.predictions {
            self.predictions = Some(predictions.clone());
        }
        if let Some(score) = update.performance_score {
            self.performance = Some(score);
        }
        self.updated_at = Some(now);
    }
}

// ============================================================================
// BASELINE UPDATE
// ============================================================================

/// Partial baseline payload for `update_baseline`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineUpdate {
    pub features: Option<BTreeMap<String, Vec<f64>>>,
    pub predictions: Option<Vec<Prediction>>,
    pub performance_score: Option<f64>,
}

impl BaselineUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feature(mut self, name: &str, values: Vec<f64>) -> Self {
        self.features
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), values);
        self
    }

    pub fn with_features(mut self, features: BTreeMap<String, Vec<f64>>) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_predictions(mut self, predictions: Vec<Prediction>) -> Self {
        self.predictions = Some(predictions);
        self
    }

    pub fn with_performance(mut self, score: f64) -> Self {
        self.performance_score = Some(score);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_none() && self.predictions.is_none() && self.performance_score.is_none()
    }

    /// Reject payloads that could never produce a meaningful comparison
    pub fn validate(&self, model: &str) -> Result<(), DriftError> {
        let invalid = |reason: String| DriftError::InvalidBaseline {
            model: model.to_string(),
            reason,
        };

        if self.is_empty() {
            return Err(invalid("update carries no baseline data".to_string()));
        }

        if let Some(features) = &self.features {
            for (name, values) in features {
                if name.is_empty() {
                    return Err(invalid("feature name is empty".to_string()));
                }
                if is_reserved_key(name) {
                    return Err(invalid(format!("feature name '{}' is reserved", name)));
                }
                if values.is_empty() {
                    return Err(invalid(format!("feature '{}' has no values", name)));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(invalid(format!("feature '{}' has non-finite values", name)));
                }
            }
        }

        if let Some(predictions) = &self.predictions {
            if predictions.is_empty() {
                return Err(invalid("prediction baseline is empty".to_string()));
            }
            let numeric = predictions.iter().filter(|p| p.is_numeric()).count();
            if numeric != 0 && numeric != predictions.len() {
                return Err(invalid("prediction baseline mixes numeric and categorical values".to_string()));
            }
            if predictions
                .iter()
                .filter_map(Prediction::as_numeric)
                .any(|v| !v.is_finite())
            {
                return Err(invalid("prediction baseline has non-finite values".to_string()));
            }
        }

        if let Some(score) = self.performance_score {
            if !score.is_finite() {
                return Err(invalid("performance score is not finite".to_string()));
            }
        }

        Ok(())
    }
}
