//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! `DriftConfig::default()` and `DriftConfig::from_env()` read from here;
//! nothing else in the crate hard-codes a threshold.

// ============================================================================
// WINDOWS
// ============================================================================

/// Most-recent observations kept per `(model, key)` bucket
pub const DEFAULT_WINDOW_SIZE: usize = 1000;

/// Upper bound on registered feature buckets per model
pub const DEFAULT_MAX_KEYS_PER_MODEL: usize = 256;

// ============================================================================
// SAMPLE REQUIREMENTS
// ============================================================================

/// Current observations required before a feature/prediction is tested
pub const DEFAULT_MIN_SAMPLES: usize = 30;

/// Performance scores required before performance drift is evaluated
pub const DEFAULT_MIN_PERFORMANCE_SAMPLES: usize = 10;

// ============================================================================
// STATISTICS
// ============================================================================

/// Equal-width bins used by PSI
pub const DEFAULT_PSI_BINS: usize = 10;

/// Added to every bin percentage so `ln(0)` never happens
pub const DEFAULT_PSI_EPSILON: f64 = 1e-4;

// ============================================================================
// THRESHOLDS
// ============================================================================

pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;
pub const DEFAULT_PSI_WARNING: f64 = 0.1;
pub const DEFAULT_PSI_CRITICAL: f64 = 0.25;
pub const DEFAULT_WASSERSTEIN_WARNING: f64 = 0.1;
pub const DEFAULT_WASSERSTEIN_CRITICAL: f64 = 2.0 * DEFAULT_WASSERSTEIN_WARNING;
pub const DEFAULT_PERFORMANCE_DROP: f64 = 0.05;

// ============================================================================
// SCHEDULING & PERSISTENCE
// ============================================================================

/// Background check interval (hourly)
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;

/// Attempts per report write before the report is dropped from the store
pub const DEFAULT_PERSIST_ATTEMPTS: u32 = 3;

/// Pause between persistence attempts
pub const DEFAULT_PERSIST_BACKOFF_MS: u64 = 200;

/// Reports kept in the per-process history
pub const MAX_REPORT_HISTORY: usize = 1000;

/// Service name used with the task registry
pub const SERVICE_NAME: &str = "drift-monitor";

/// Default SQLite file name (under the local data dir)
pub const DEFAULT_DB_FILE: &str = "drift_monitor.db";
