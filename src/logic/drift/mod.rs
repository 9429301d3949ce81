//! Drift Module - Evaluation, severity and recommendations
//!
//! # Architecture
//! - `types.rs`: DriftType, DriftSeverity, Prediction, DriftMetrics, DriftReport
//! - `evaluator.rs`: data / prediction / performance checks
//! - `severity.rs`: severity decision table
//! - `recommend.rs`: deterministic recommendations
//!
//! Everything here is synchronous and side-effect free apart from logging.

pub mod types;
pub mod evaluator;
pub mod severity;
pub mod recommend;

pub use types::*;
pub use evaluator::{DriftEvaluator, Evaluation};
pub use severity::SeverityClassifier;
pub use recommend::RecommendationEngine;
