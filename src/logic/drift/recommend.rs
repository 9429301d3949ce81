//! Recommendation Engine
//!
//! Pure mapping from a classified drift to human-readable actions.
//! Order: urgency, type-specific guidance, quantitative footer.

use std::collections::BTreeSet;

use super::types::{DriftMetrics, DriftSeverity, DriftType};

#[derive(Debug, Default, Clone, Copy)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn recommend(
        &self,
        drift_type: DriftType,
        severity: DriftSeverity,
        metrics: &DriftMetrics,
        affected_features: &BTreeSet<String>,
    ) -> Vec<String> {
        let mut out = vec![urgency(severity).to_string()];

        match drift_type {
            DriftType::None => {}
            DriftType::DataDrift => {
                out.extend(investigate(affected_features));
                out.push("Check upstream data pipelines for changes in input distributions".to_string());
            }
            DriftType::PredictionDrift => {
                out.push("Review the distribution of model outputs for shifted classes or values".to_string());
                out.push("Compare recent predictions against business expectations".to_string());
            }
            DriftType::ConceptDrift | DriftType::PerformanceDrift => {
                out.push("Review error patterns on recent labelled outcomes".to_string());
                out.push("Collect fresh labelled data and retrain the model".to_string());
                out.extend(investigate(affected_features));
            }
        }

        out.push(format!(
            "PSI: {:.4}, performance delta: {:.4}",
            metrics.worst_psi(),
            metrics.performance_delta
        ));
        out
    }
}

fn urgency(severity: DriftSeverity) -> &'static str {
    match severity {
        DriftSeverity::Critical => "URGENT: critical drift detected, retrain the model immediately",
        DriftSeverity::High => "High drift detected, schedule model retraining",
        DriftSeverity::Medium => "Moderate drift detected, monitor closely and prepare retraining data",
        DriftSeverity::Low => "Low drift detected, continue monitoring",
        DriftSeverity::None => "No significant drift detected",
    }
}

fn investigate(features: &BTreeSet<String>) -> Option<String> {
    if features.is_empty() {
        return None;
    }
    let names: Vec<&str> = features.iter().map(String::as_str).collect();
    Some(format!("Investigate features: {}", names.join(", ")))
}
