use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// DRIFT TYPE & SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftType {
    None,
    ConceptDrift,
    DataDrift,
    PerformanceDrift,
    PredictionDrift,
}

impl DriftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftType::None => "none",
            DriftType::ConceptDrift => "concept_drift",
            DriftType::DataDrift => "data_drift",
            DriftType::PerformanceDrift => "performance_drift",
            DriftType::PredictionDrift => "prediction_drift",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(DriftType::None),
            "concept_drift" => Some(DriftType::ConceptDrift),
            "data_drift" => Some(DriftType::DataDrift),
            "performance_drift" => Some(DriftType::PerformanceDrift),
            "prediction_drift" => Some(DriftType::PredictionDrift),
            _ => None,
        }
    }
}

impl fmt::Display for DriftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered: `None < Low < Medium < High < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftSeverity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl DriftSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftSeverity::None => "none",
            DriftSeverity::Low => "low",
            DriftSeverity::Medium => "medium",
            DriftSeverity::High => "high",
            DriftSeverity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(DriftSeverity::None),
            "low" => Some(DriftSeverity::Low),
            "medium" => Some(DriftSeverity::Medium),
            "high" => Some(DriftSeverity::High),
            "critical" => Some(DriftSeverity::Critical),
            _ => None,
        }
    }

    /// High and critical drift warrant retraining
    pub fn requires_retraining(&self) -> bool {
        *self >= DriftSeverity::High
    }
}

impl fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PREDICTIONS
// ============================================================================

/// A single model output.
///
/// Numeric outputs are compared with KS/PSI/Wasserstein; categorical and
/// boolean outputs are compared as category frequencies (chi-square).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Prediction {
    Numeric(f64),
    Categorical(String),
    Boolean(bool),
}

impl Prediction {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Prediction::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Prediction::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Category label used for frequency comparisons
    pub fn category(&self) -> Option<String> {
        match self {
            Prediction::Numeric(_) => None,
            Prediction::Categorical(c) => Some(c.clone()),
            Prediction::Boolean(b) => Some(b.to_string()),
        }
    }

    /// Score in `[0, 1]` of this prediction against the observed outcome.
    /// `None` when the two values are of different kinds.
    pub fn score_against(&self, actual: &Prediction) -> Option<f64> {
        match (self, actual) {
            (Prediction::Numeric(p), Prediction::Numeric(a)) => {
                if !p.is_finite() || !a.is_finite() {
                    return None;
                }
                let scale = a.abs().max(1e-9);
                Some(1.0 - ((p - a).abs() / scale).min(1.0))
            }
            (Prediction::Categorical(p), Prediction::Categorical(a)) => {
                Some(if p == a { 1.0 } else { 0.0 })
            }
            (Prediction::Boolean(p), Prediction::Boolean(a)) => Some(if p == a { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Numeric(v) => write!(f, "{}", v),
            Prediction::Categorical(c) => f.write_str(c),
            Prediction::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<f64> for Prediction {
    fn from(v: f64) -> Self {
        Prediction::Numeric(v)
    }
}

impl From<bool> for Prediction {
    fn from(v: bool) -> Self {
        Prediction::Boolean(v)
    }
}

impl From<&str> for Prediction {
    fn from(v: &str) -> Self {
        Prediction::Categorical(v.to_string())
    }
}

// ============================================================================
// METRICS & REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftMetrics {
    pub ks_statistic: f64,
    pub ks_p_value: f64,
    pub psi_score: f64,
    pub wasserstein_distance: f64,
    pub performance_delta: f64,
    pub prediction_distribution_change: f64,
}

impl Default for DriftMetrics {
    fn default() -> Self {
        Self {
            ks_statistic: 0.0,
            ks_p_value: 1.0,
            psi_score: 0.0,
            wasserstein_distance: 0.0,
            performance_delta: 0.0,
            prediction_distribution_change: 0.0,
        }
    }
}

impl DriftMetrics {
    /// Worst distribution shift seen on either features or predictions
    pub fn worst_psi(&self) -> f64 {
        self.psi_score.max(self.prediction_distribution_change)
    }

    /// Name of the first non-finite metric, if any
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("ks_statistic", self.ks_statistic),
            ("ks_p_value", self.ks_p_value),
            ("psi_score", self.psi_score),
            ("wasserstein_distance", self.wasserstein_distance),
            ("performance_delta", self.performance_delta),
            ("prediction_distribution_change", self.prediction_distribution_change),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

/// Result of one drift evaluation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub report_id: Uuid,
    pub model_name: String,
    pub detection_timestamp: DateTime<Utc>,
    pub drift_type: DriftType,
    pub severity: DriftSeverity,
    pub metrics: DriftMetrics,
    pub affected_features: BTreeSet<String>,
    pub recommendations: Vec<String>,
    pub requires_retraining: bool,
    pub confidence: f64,
}

pub const DETECTION_ERROR_RECOMMENDATION: &str = "Error during drift detection";

impl DriftReport {
    /// Report returned when detection itself failed
    pub fn degraded(model_name: &str) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            model_name: model_name.to_string(),
            detection_timestamp: Utc::now(),
            drift_type: DriftType::None,
            severity: DriftSeverity::None,
            metrics: DriftMetrics::default(),
            affected_features: BTreeSet::new(),
            recommendations: vec![DETECTION_ERROR_RECOMMENDATION.to_string()],
            requires_retraining: false,
            confidence: 0.0,
        }
    }

    pub fn is_drift(&self) -> bool {
        self.drift_type != DriftType::None
    }
}
