use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::drift::{DriftReport, DriftSeverity};

/// Per-model slice of a drift summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDriftSummary {
    pub total_reports: usize,
    pub by_severity: BTreeMap<DriftSeverity, usize>,
    pub retraining_required: usize,
    pub latest_detection: Option<DateTime<Utc>>,
}

/// Aggregate of persisted reports over a trailing time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub hours: u32,
    pub since: DateTime<Utc>,
    pub total_reports: usize,
    pub by_severity: BTreeMap<DriftSeverity, usize>,
    pub by_model: BTreeMap<String, ModelDriftSummary>,
    pub retraining_required: usize,
}

impl DriftSummary {
    pub fn new(hours: u32, since: DateTime<Utc>) -> Self {
        Self {
            hours,
            since,
            total_reports: 0,
            by_severity: BTreeMap::new(),
            by_model: BTreeMap::new(),
            retraining_required: 0,
        }
    }

    pub fn add(&mut self, report: &DriftReport) {
        self.total_reports += 1;
        *self.by_severity.entry(report.severity).or_insert(0) += 1;

        let model = self.by_model.entry(report.model_name.clone()).or_default();
        model.total_reports += 1;
        *model.by_severity.entry(report.severity).or_insert(0) += 1;
        if model
            .latest_detection
            .map_or(true, |ts| report.detection_timestamp > ts)
        {
            model.latest_detection = Some(report.detection_timestamp);
        }

        if report.requires_retraining {
            self.retraining_required += 1;
            model.retraining_required += 1;
        }
    }

    pub fn models_requiring_retraining(&self) -> Vec<&str> {
        self.by_model
            .iter()
            .filter(|(_, s)| s.retraining_required > 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
