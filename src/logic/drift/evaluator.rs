//! Drift Evaluator
//!
//! Compares a point-in-time window snapshot with the model's baseline.
//! Input: ModelSnapshot, ModelBaseline
//! Output: Evaluation (metrics, fired checks, affected features)
//!
//! `wasserstein_distance` is the worst case over features and, when the
//! predictions are numeric, the prediction distribution.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::types::{DriftMetrics, DriftType, Prediction};
use crate::logic::baseline::ModelBaseline;
use crate::logic::config::DriftConfig;
use crate::logic::error::{DriftError, StatsError};
use crate::logic::stats::{self, categorical_psi, chi_square, ks_two_sample, psi, wasserstein_distance};
use crate::logic::window::ModelSnapshot;

// ============================================================================
// EVALUATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub metrics: DriftMetrics,

    /// Checks that fired: `DataDrift`, `PredictionDrift`, `PerformanceDrift`
    pub drift_types: BTreeSet<DriftType>,

    pub affected_features: BTreeSet<String>,

    /// Largest current window that took part in the evaluation
    pub sample_count: usize,

    pub confidence: f64,
}

impl Evaluation {
    /// Overall drift type. A performance drop means the input/output
    /// relationship changed, so it reads as concept drift.
    pub fn overall_type(&self) -> DriftType {
        if self.drift_types.contains(&DriftType::PerformanceDrift) {
            DriftType::ConceptDrift
        } else if self.drift_types.contains(&DriftType::DataDrift) {
            DriftType::DataDrift
        } else if self.drift_types.contains(&DriftType::PredictionDrift) {
            DriftType::PredictionDrift
        } else {
            DriftType::None
        }
    }
}

/// Per-feature comparison result
#[derive(Debug, Clone, Copy, PartialEq)]
struct FeatureComparison {
    ks_statistic: f64,
    ks_p_value: f64,
    psi: f64,
    wasserstein: f64,
}

/// Prediction comparison result. Wasserstein only applies to numeric outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PredictionComparison {
    p_value: f64,
    change: f64,
    wasserstein: Option<f64>,
}

// ============================================================================
// EVALUATOR
// ============================================================================

pub struct DriftEvaluator {
    config: DriftConfig,
}

impl DriftEvaluator {
    pub fn new(config: DriftConfig) -> Self {
        Self { config }
    }

    /// Run the drift checks. `check_all_types == false` runs data drift only.
    pub fn evaluate(
        &self,
        model: &str,
        snapshot: &ModelSnapshot,
        baseline: Option<&ModelBaseline>,
        check_all_types: bool,
    ) -> Result<Evaluation, DriftError> {
        let mut evaluation = Evaluation {
            metrics: DriftMetrics::default(),
            drift_types: BTreeSet::new(),
            affected_features: BTreeSet::new(),
            sample_count: 0,
            confidence: 0.0,
        };

        let Some(baseline) = baseline.filter(|b| !b.is_empty()) else {
            log::debug!("No baseline for '{}', skipping drift checks", model);
            return Ok(evaluation);
        };

        self.check_data_drift(model, snapshot, baseline, &mut evaluation);

        if check_all_types {
            self.check_prediction_drift(model, snapshot, baseline, &mut evaluation);
            self.check_performance_drift(snapshot, baseline, &mut evaluation);
        }

        if let Some(name) = evaluation.metrics.first_non_finite() {
            return Err(DriftError::NonFiniteMetric(name));
        }

        evaluation.confidence = self.confidence(evaluation.sample_count, evaluation.metrics.ks_p_value);
        Ok(evaluation)
    }

    /// `n / (n + min_samples)` scaled down as the KS p-value grows
    pub fn confidence(&self, sample_count: usize, p_value: f64) -> f64 {
        if sample_count == 0 {
            return 0.0;
        }
        let n = sample_count as f64;
        let size_factor = n / (n + self.config.min_samples as f64);
        (size_factor * (1.0 - p_value.clamp(0.0, 1.0) / 2.0)).clamp(0.0, 1.0)
    }

    // ------------------------------------------------------------------------
    // DATA DRIFT
    // ------------------------------------------------------------------------

    fn check_data_drift(
        &self,
        model: &str,
        snapshot: &ModelSnapshot,
        baseline: &ModelBaseline,
        evaluation: &mut Evaluation,
    ) {
        let t = &self.config.thresholds;
        let metrics = &mut evaluation.metrics;

        for (feature, reference) in &baseline.features {
            let Some(current) = snapshot.features.get(feature) else {
                continue;
            };
            if current.len() < self.config.min_samples {
                log::debug!(
                    "'{}'/'{}': {} samples, need {}",
                    model,
                    feature,
                    current.len(),
                    self.config.min_samples
                );
                continue;
            }

            let cmp = match self.compare_feature(reference, current) {
                Ok(cmp) => cmp,
                Err(e) => {
                    log::warn!("Skipping feature '{}' of '{}': {}", feature, model, e);
                    continue;
                }
            };

            evaluation.sample_count = evaluation.sample_count.max(current.len());
            metrics.ks_statistic = metrics.ks_statistic.max(cmp.ks_statistic);
            metrics.ks_p_value = metrics.ks_p_value.min(cmp.ks_p_value);
            metrics.psi_score = metrics.psi_score.max(cmp.psi);
            metrics.wasserstein_distance = metrics.wasserstein_distance.max(cmp.wasserstein);

            if cmp.ks_p_value < t.significance_level || cmp.psi > t.psi_warning {
                evaluation.affected_features.insert(feature.clone());
            }
        }

        if !evaluation.affected_features.is_empty() {
            evaluation.drift_types.insert(DriftType::DataDrift);
        }
    }

    fn compare_feature(&self, reference: &[f64], current: &[f64]) -> Result<FeatureComparison, StatsError> {
        let ks = ks_two_sample(reference, current)?;
        Ok(FeatureComparison {
            ks_statistic: ks.statistic,
            ks_p_value: ks.p_value,
            psi: psi(reference, current, self.config.psi_bins, self.config.psi_epsilon)?,
            wasserstein: wasserstein_distance(reference, current)?,
        })
    }

    // ------------------------------------------------------------------------
    // PREDICTION DRIFT
    // ------------------------------------------------------------------------

    fn check_prediction_drift(
        &self,
        model: &str,
        snapshot: &ModelSnapshot,
        baseline: &ModelBaseline,
        evaluation: &mut Evaluation,
    ) {
        let Some(reference) = baseline.predictions.as_deref() else {
            return;
        };
        let current = &snapshot.predictions;
        if current.len() < self.config.min_samples {
            return;
        }

        match self.compare_predictions(reference, current) {
            Ok(cmp) => {
                let t = &self.config.thresholds;
                let metrics = &mut evaluation.metrics;
                evaluation.sample_count = evaluation.sample_count.max(current.len());
                metrics.prediction_distribution_change = cmp.change;
                if let Some(distance) = cmp.wasserstein {
                    metrics.wasserstein_distance = metrics.wasserstein_distance.max(distance);
                }
                if cmp.p_value < t.significance_level || cmp.change > t.psi_warning {
                    evaluation.drift_types.insert(DriftType::PredictionDrift);
                }
            }
            Err(e) => log::warn!("Skipping prediction drift check of '{}': {}", model, e),
        }
    }

    fn compare_predictions(
        &self,
        reference: &[Prediction],
        current: &[Prediction],
    ) -> Result<PredictionComparison, StatsError> {
        let numeric = |values: &[Prediction]| -> Option<Vec<f64>> {
            values.iter().map(Prediction::as_numeric).collect()
        };
        let categories = |values: &[Prediction]| -> Option<Vec<String>> {
            values.iter().map(Prediction::category).collect()
        };

        if let (Some(base), Some(cur)) = (numeric(reference), numeric(current)) {
            let ks = ks_two_sample(&base, &cur)?;
            return Ok(PredictionComparison {
                p_value: ks.p_value,
                change: psi(&base, &cur, self.config.psi_bins, self.config.psi_epsilon)?,
                wasserstein: Some(wasserstein_distance(&base, &cur)?),
            });
        }

        if let (Some(base), Some(cur)) = (categories(reference), categories(current)) {
            let expected = stats::frequencies(base);
            let observed = stats::frequencies(cur);
            let test = chi_square(&observed, &expected)?;
            return Ok(PredictionComparison {
                p_value: test.p_value,
                change: categorical_psi(&expected, &observed, self.config.psi_epsilon)?,
                wasserstein: None,
            });
        }

        Err(StatsError::MixedPredictionKinds)
    }

    // ------------------------------------------------------------------------
    // PERFORMANCE DRIFT
    // ------------------------------------------------------------------------

    fn check_performance_drift(&self, snapshot: &ModelSnapshot, baseline: &ModelBaseline, evaluation: &mut Evaluation) {
        let Some(reference) = baseline.performance else {
            return;
        };
        if snapshot.performance.len() < self.config.min_performance_samples {
            return;
        }
        let Some(recent) = stats::mean(&snapshot.performance) else {
            return;
        };

        let delta = reference - recent;
        evaluation.sample_count = evaluation.sample_count.max(snapshot.performance.len());
        evaluation.metrics.performance_delta = delta;
        if delta > self.config.thresholds.performance_drop {
            evaluation.drift_types.insert(DriftType::PerformanceDrift);
        }
    }
}
