//! Statistics Module - Distribution comparison tests
//!
//! Pure, stateless functions comparing a baseline sample with a current sample.
//!
//! # Architecture
//! - `ks.rs`: two-sample Kolmogorov-Smirnov statistic and p-value
//! - `psi.rs`: Population Stability Index (numeric and categorical)
//! - `wasserstein.rs`: 1-D earth mover's distance
//! - `chi_square.rs`: chi-square test on category frequencies
//!
//! Given the same inputs every function returns the same bits. Degenerate
//! inputs are reported as `StatsError`, never as a panic.

pub mod ks;
pub mod psi;
pub mod wasserstein;
pub mod chi_square;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use crate::logic::error::StatsError;

pub use ks::{ks_two_sample, KsResult};
pub use psi::{categorical_psi, psi};
pub use wasserstein::wasserstein_distance;
pub use chi_square::{chi_square, ChiSquareResult};

/// Copy, validate and sort a sample
pub(crate) fn sorted_finite(values: &[f64], name: &'static str) -> Result<Vec<f64>, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptySample(name));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite(name));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(sorted)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Count occurrences of each category
pub fn frequencies<I, S>(values: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts = BTreeMap::new();
    for v in values {
        *counts.entry(v.into()).or_insert(0) += 1;
    }
    counts
}
