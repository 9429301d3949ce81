//! Typed rows for the four persisted tables

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::drift::{DriftMetrics, DriftReport, DriftSeverity, DriftType, Prediction};
use crate::logic::error::StoreError;

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Unavailable(format!("bad timestamp '{}': {}", s, e)))
}

// ============================================================================
// BASELINES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineDistributionRow {
    pub model_name: String,
    pub feature_name: String,
    /// JSON array: `f64` values for features, `Prediction`s for `_predictions`
    pub distribution_json: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselinePerformanceRow {
    pub model_name: String,
    pub baseline_score: f64,
    pub updated_at: String,
}

// ============================================================================
// TRACKING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionTrackingRow {
    pub model_name: String,
    pub features_json: String,
    pub prediction: Prediction,
    pub actual: Option<Prediction>,
    pub metadata_json: Option<String>,
    pub created_at: String,
}

impl PredictionTrackingRow {
    pub fn new(
        model_name: &str,
        features: &BTreeMap<String, f64>,
        prediction: &Prediction,
        actual: Option<&Prediction>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            model_name: model_name.to_string(),
            features_json: serde_json::to_string(features)?,
            prediction: prediction.clone(),
            actual: actual.cloned(),
            metadata_json: metadata.map(serde_json::to_string).transpose()?,
            created_at: format_timestamp(&Utc::now()),
        })
    }
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReportRow {
    pub report_id: String,
    pub model_name: String,
    pub detection_timestamp: String,
    pub drift_type: String,
    pub severity: String,
    pub metrics_json: String,
    pub affected_features: Vec<String>,
    pub recommendations: Vec<String>,
    pub requires_retraining: bool,
    pub confidence: f64,
}

impl DriftReportRow {
    pub fn from_report(report: &DriftReport) -> Result<Self, StoreError> {
        Ok(Self {
            report_id: report.report_id.to_string(),
            model_name: report.model_name.clone(),
            detection_timestamp: format_timestamp(&report.detection_timestamp),
            drift_type: report.drift_type.as_str().to_string(),
            severity: report.severity.as_str().to_string(),
            metrics_json: serde_json::to_string(&report.metrics)?,
            affected_features: report.affected_features.iter().cloned().collect(),
            recommendations: report.recommendations.clone(),
            requires_retraining: report.requires_retraining,
            confidence: report.confidence,
        })
    }

    pub fn into_report(self) -> Result<DriftReport, StoreError> {
        let report_id =
            Uuid::parse_str(&self.report_id).map_err(|_| StoreError::InvalidRow("drift_reports"))?;
        let metrics: DriftMetrics = serde_json::from_str(&self.metrics_json)?;
        let drift_type = DriftType::parse(&self.drift_type)
            .ok_or(StoreError::InvalidRow("drift_reports"))?;
        let severity = DriftSeverity::parse(&self.severity)
            .ok_or(StoreError::InvalidRow("drift_reports"))?;

        Ok(DriftReport {
            report_id,
            model_name: self.model_name,
            detection_timestamp: parse_timestamp(&self.detection_timestamp)?,
            drift_type,
            severity,
            metrics,
            affected_features: self.affected_features.into_iter().collect(),
            recommendations: self.recommendations,
            requires_retraining: self.requires_retraining,
            confidence: self.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_row_preserves_fields() {
        let mut report = DriftReport::degraded("churn");
        report.drift_type = DriftType::DataDrift;
        report.severity = DriftSeverity::Medium;
        report.affected_features.insert("tenure".to_string());
        report.metrics.psi_score = 0.18;
        report.confidence = 0.6;

        let row = DriftReportRow::from_report(&report).unwrap();
        assert_eq!(row.drift_type, "data_drift");
        assert_eq!(row.severity, "medium");

        let restored = row.into_report().unwrap();
        assert_eq!(restored.report_id, report.report_id);
        assert_eq!(restored.affected_features, report.affected_features);
        assert_eq!(restored.metrics, report.metrics);
        // Stored at microsecond precision
        assert_eq!(
            restored.detection_timestamp.timestamp_micros(),
            report.detection_timestamp.timestamp_micros()
        );
    }

    #[test]
    fn test_corrupt_report_id_rejected() {
        let mut row = DriftReportRow::from_report(&DriftReport::degraded("churn")).unwrap();
        row.report_id = "not-a-uuid".to_string();

        assert!(matches!(
            row.into_report(),
            Err(StoreError::InvalidRow("drift_reports"))
        ));
    }

    #[test]
    fn test_timestamps_sort_lexicographically() {
        let early = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z").unwrap().with_timezone(&Utc);
        let late = DateTime::parse_from_rfc3339("2026-01-02T03:04:05.5Z").unwrap().with_timezone(&Utc);
        assert!(format_timestamp(&early) < format_timestamp(&late));
    }
}
