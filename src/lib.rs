//! Model Drift Monitor
//!
//! Tracks the inputs, outputs and accuracy of deployed predictive models,
//! detects statistically significant shifts against stored baselines,
//! classifies their severity and decides whether retraining is warranted.
//!
//! Entry point is [`DriftMonitor`].

pub mod constants;
pub mod logic;

pub use logic::baseline::{BaselineUpdate, ModelBaseline};
pub use logic::config::{DriftConfig, Thresholds};
pub use logic::drift::{DriftMetrics, DriftReport, DriftSeverity, DriftType, Prediction};
pub use logic::error::{DriftError, DriftResult};
pub use logic::monitor::{AlertSink, DriftMonitor, DriftSummary, ServiceRegistry, TaskRegistry};
pub use logic::store::{MemoryStore, PersistentStore, SqliteStore};
