//! Logic Module - Drift detection engine
//!
//! Leaf-first:
//! - `stats/` - KS, PSI, Wasserstein, chi-square
//! - `window/` - bounded per-model sliding windows
//! - `store/` - persistence boundary (memory, SQLite)
//! - `baseline/` - reference distributions per model
//! - `drift/` - evaluation, severity, recommendations
//! - `monitor/` - `DriftMonitor` service and background loop

pub mod config;
pub mod error;

pub mod stats;
pub mod window;
pub mod store;
pub mod baseline;
pub mod drift;
pub mod monitor;
