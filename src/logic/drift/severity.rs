//! Severity Classifier
//!
//! Decision table, first matching rule wins:
//! 1. nothing fired -> None
//! 2. performance drift -> Critical above 2x the allowed drop, else High
//! 3. worst PSI -> Critical above `psi_critical`, Medium above `psi_warning`
//! 4. Wasserstein -> High above `wasserstein_critical`, Medium above `wasserstein_warning`
//! 5. Low

use std::collections::BTreeSet;

use super::types::{DriftMetrics, DriftSeverity, DriftType};
use crate::logic::config::Thresholds;

pub struct SeverityClassifier {
    thresholds: Thresholds,
}

impl SeverityClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, drift_types: &BTreeSet<DriftType>, metrics: &DriftMetrics) -> DriftSeverity {
        let t = &self.thresholds;

        if drift_types.is_empty() || drift_types.iter().all(|d| *d == DriftType::None) {
            return DriftSeverity::None;
        }

        if drift_types.contains(&DriftType::PerformanceDrift) {
            return if metrics.performance_delta > 2.0 * t.performance_drop {
                DriftSeverity::Critical
            } else {
                DriftSeverity::High
            };
        }

        let psi = metrics.worst_psi();
        if psi > t.psi_critical {
            return DriftSeverity::Critical;
        }
        if psi > t.psi_warning {
            return DriftSeverity::Medium;
        }

        if metrics.wasserstein_distance > t.wasserstein_critical {
            return DriftSeverity::High;
        }
        if metrics.wasserstein_distance > t.wasserstein_warning {
            return DriftSeverity::Medium;
        }

        DriftSeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> SeverityClassifier {
        SeverityClassifier::new(Thresholds::default())
    }

    fn types(list: &[DriftType]) -> BTreeSet<DriftType> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_nothing_fired() {
        let metrics = DriftMetrics {
            psi_score: 5.0,
            ..Default::default()
        };
        assert_eq!(classifier().classify(&types(&[]), &metrics), DriftSeverity::None);
    }

    #[test]
    fn test_performance_rules() {
        let c = classifier();
        let mut metrics = DriftMetrics {
            performance_delta: 0.08,
            ..Default::default()
        };
        let fired = types(&[DriftType::PerformanceDrift]);
        assert_eq!(c.classify(&fired, &metrics), DriftSeverity::High);

        metrics.performance_delta = 0.2;
        assert_eq!(c.classify(&fired, &metrics), DriftSeverity::Critical);
    }

    #[test]
    fn test_psi_rules_use_worst_psi() {
        let c = classifier();
        let fired = types(&[DriftType::PredictionDrift]);

        let metrics = DriftMetrics {
            psi_score: 0.05,
            prediction_distribution_change: 0.3,
            ..Default::default()
        };
        assert_eq!(c.classify(&fired, &metrics), DriftSeverity::Critical);

        let metrics = DriftMetrics {
            psi_score: 0.15,
            ..Default::default()
        };
        assert_eq!(c.classify(&fired, &metrics), DriftSeverity::Medium);
    }

    #[test]
    fn test_wasserstein_and_fallback() {
        let c = classifier();
        let fired = types(&[DriftType::DataDrift]);

        let metrics = DriftMetrics {
            wasserstein_distance: 0.5,
            ..Default::default()
        };
        assert_eq!(c.classify(&fired, &metrics), DriftSeverity::High);

        let metrics = DriftMetrics {
            wasserstein_distance: 0.15,
            ..Default::default()
        };
        assert_eq!(c.classify(&fired, &metrics), DriftSeverity::Medium);

        assert_eq!(c.classify(&fired, &DriftMetrics::default()), DriftSeverity::Low);
    }
}
