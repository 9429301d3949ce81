//! Drift Monitor Configuration
//!
//! Every tunable lives here. Defaults come from `crate::constants`;
//! `from_env` overrides them from `DRIFT_*` variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::logic::error::ConfigError;

/// Decision thresholds shared by the evaluator, classifier and recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// KS p-value below which a distribution counts as shifted
    pub significance_level: f64,

    /// PSI above which a shift is worth a warning
    pub psi_warning: f64,

    /// PSI above which a shift is critical
    pub psi_critical: f64,

    pub wasserstein_warning: f64,
    pub wasserstein_critical: f64,

    /// Drop from baseline performance that flags performance drift
    pub performance_drop: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            psi_warning: DEFAULT_PSI_WARNING,
            psi_critical: DEFAULT_PSI_CRITICAL,
            wasserstein_warning: DEFAULT_WASSERSTEIN_WARNING,
            wasserstein_critical: DEFAULT_WASSERSTEIN_CRITICAL,
            performance_drop: DEFAULT_PERFORMANCE_DROP,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigError::Significance(self.significance_level));
        }

        for (name, value) in [
            ("psi_warning", self.psi_warning),
            ("wasserstein_warning", self.wasserstein_warning),
            ("performance_drop", self.performance_drop),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        if self.psi_critical <= self.psi_warning {
            return Err(ConfigError::ThresholdOrder {
                warning: "psi_warning",
                critical: "psi_critical",
            });
        }
        if self.wasserstein_critical <= self.wasserstein_warning {
            return Err(ConfigError::ThresholdOrder {
                warning: "wasserstein_warning",
                critical: "wasserstein_critical",
            });
        }

        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Capacity of every sliding window
    pub window_size: usize,

    /// Registered feature windows allowed per model
    pub max_keys_per_model: usize,

    /// Minimum current observations for a KS/PSI/Wasserstein check
    pub min_samples: usize,

    /// Minimum performance scores for a performance check
    pub min_performance_samples: usize,

    pub psi_bins: usize,
    pub psi_epsilon: f64,

    /// Background check interval in seconds
    pub check_interval_secs: u64,

    /// Report write attempts before giving up
    pub persist_attempts: u32,
    pub persist_backoff_ms: u64,

    pub thresholds: Thresholds,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_keys_per_model: DEFAULT_MAX_KEYS_PER_MODEL,
            min_samples: DEFAULT_MIN_SAMPLES,
            min_performance_samples: DEFAULT_MIN_PERFORMANCE_SAMPLES,
            psi_bins: DEFAULT_PSI_BINS,
            psi_epsilon: DEFAULT_PSI_EPSILON,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            persist_attempts: DEFAULT_PERSIST_ATTEMPTS,
            persist_backoff_ms: DEFAULT_PERSIST_BACKOFF_MS,
            thresholds: Thresholds::default(),
        }
    }
}

impl DriftConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let t = defaults.thresholds.clone();

        Self {
            window_size: env_or("DRIFT_WINDOW_SIZE", defaults.window_size),
            max_keys_per_model: env_or("DRIFT_MAX_KEYS_PER_MODEL", defaults.max_keys_per_model),
            min_samples: env_or("DRIFT_MIN_SAMPLES", defaults.min_samples),
            min_performance_samples: env_or(
                "DRIFT_MIN_PERFORMANCE_SAMPLES",
                defaults.min_performance_samples,
            ),
            psi_bins: env_or("DRIFT_PSI_BINS", defaults.psi_bins),
            psi_epsilon: env_or("DRIFT_PSI_EPSILON", defaults.psi_epsilon),
            check_interval_secs: env_or("DRIFT_CHECK_INTERVAL_SECS", defaults.check_interval_secs),
            persist_attempts: env_or("DRIFT_PERSIST_ATTEMPTS", defaults.persist_attempts),
            persist_backoff_ms: env_or("DRIFT_PERSIST_BACKOFF_MS", defaults.persist_backoff_ms),
            thresholds: Thresholds {
                significance_level: env_or("DRIFT_SIGNIFICANCE_LEVEL", t.significance_level),
                psi_warning: env_or("DRIFT_PSI_WARNING", t.psi_warning),
                psi_critical: env_or("DRIFT_PSI_CRITICAL", t.psi_critical),
                wasserstein_warning: env_or("DRIFT_WASSERSTEIN_WARNING", t.wasserstein_warning),
                wasserstein_critical: env_or("DRIFT_WASSERSTEIN_CRITICAL", t.wasserstein_critical),
                performance_drop: env_or("DRIFT_PERFORMANCE_DROP", t.performance_drop),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("window_size", self.window_size),
            ("max_keys_per_model", self.max_keys_per_model),
            ("min_samples", self.min_samples),
            ("min_performance_samples", self.min_performance_samples),
            ("psi_bins", self.psi_bins),
            ("persist_attempts", self.persist_attempts as usize),
            ("check_interval_secs", self.check_interval_secs as usize),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { name, value: 0.0 });
            }
        }
        if !(self.psi_epsilon > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "psi_epsilon",
                value: self.psi_epsilon,
            });
        }

        self.thresholds.validate()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn persist_backoff(&self) -> Duration {
        Duration::from_millis(self.persist_backoff_ms)
    }
}

/// SQLite file used by the host binary
pub fn database_path() -> PathBuf {
    env::var("DRIFT_DB_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("model-drift")
            .join(DEFAULT_DB_FILE)
    })
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
