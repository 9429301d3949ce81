//! Error types
//!
//! One enum per concern, folded into `DriftError` at the monitor boundary.

use thiserror::Error;

/// Statistical computation failures (degenerate inputs)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("sample '{0}' is empty")]
    EmptySample(&'static str),

    #[error("sample '{0}' contains non-finite values")]
    NonFinite(&'static str),

    #[error("at least {needed} bins required, got {got}")]
    InvalidBins { needed: usize, got: usize },

    #[error("predictions mix numeric and categorical values")]
    MixedPredictionKinds,

    #[error("distribution error: {0}")]
    Distribution(String),
}

/// Sliding window registry failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window '{key}' is not registered for model '{model}'")]
    NotRegistered { model: String, key: String },

    #[error("model '{model}' already has {limit} registered windows")]
    KeyLimitReached { model: String, limit: usize },
}

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid column name '{0}'")]
    InvalidColumn(String),

    #[error("malformed row in table '{0}'")]
    InvalidRow(&'static str),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Configuration validation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{critical} must be greater than {warning}")]
    ThresholdOrder {
        warning: &'static str,
        critical: &'static str,
    },

    #[error("significance level must be in (0, 1), got {0}")]
    Significance(f64),
}

/// Top-level error of the drift engine
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid baseline for '{model}': {reason}")]
    InvalidBaseline { model: String, reason: String },

    #[error("metric '{0}' is not finite")]
    NonFiniteMetric(&'static str),

    #[error("drift monitor is already running")]
    AlreadyRunning,

    #[error("drift monitor is not running")]
    NotRunning,

    #[error("service '{0}' is already registered")]
    ServiceRegistered(String),

    #[error("background task failed: {0}")]
    Task(String),
}

pub type DriftResult<T> = Result<T, DriftError>;
