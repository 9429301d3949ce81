//! Alert hook
//!
//! Called whenever a report requires retraining. The default sink writes a
//! structured log line at `error` level under the `drift_alert` target.

use crate::logic::drift::DriftReport;

pub trait AlertSink: Send + Sync {
    fn raise_alert(&self, report: &DriftReport);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn raise_alert(&self, report: &DriftReport) {
        let features: Vec<&str> = report.affected_features.iter().map(String::as_str).collect();
        log::error!(
            target: "drift_alert",
            "[DRIFT ALERT] model={} type={} severity={} confidence={:.2} psi={:.4} performance_delta={:.4} features=[{}] report={}",
            report.model_name,
            report.drift_type,
            report.severity,
            report.confidence,
            report.metrics.worst_psi(),
            report.metrics.performance_delta,
            features.join(","),
            report.report_id
        );
    }
}
