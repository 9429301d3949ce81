//! Chi-square goodness-of-fit on category frequencies
//!
//! Baseline (expected) frequencies are rescaled to the observed total before
//! the statistic is computed. Half-count smoothing keeps categories that only
//! appear on one side from producing an infinite statistic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::logic::error::StatsError;

const SMOOTHING: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
}

/// `observed` are the current category counts, `expected` the baseline counts
pub fn chi_square(
    observed: &BTreeMap<String, usize>,
    expected: &BTreeMap<String, usize>,
) -> Result<ChiSquareResult, StatsError> {
    let observed_total: usize = observed.values().sum();
    let expected_total: usize = expected.values().sum();
    if expected_total == 0 {
        return Err(StatsError::EmptySample("baseline"));
    }
    if observed_total == 0 {
        return Err(StatsError::EmptySample("current"));
    }

    let categories: BTreeSet<&String> = observed.keys().chain(expected.keys()).collect();
    let k = categories.len();
    if k < 2 {
        return Ok(ChiSquareResult {
            statistic: 0.0,
            degrees_of_freedom: 0,
            p_value: 1.0,
        });
    }

    let smoothed_total = expected_total as f64 + SMOOTHING * k as f64;
    let scale = observed_total as f64 / smoothed_total;

    let statistic: f64 = categories
        .iter()
        .map(|c| {
            let o = observed.get(*c).copied().unwrap_or(0) as f64;
            let e = (expected.get(*c).copied().unwrap_or(0) as f64 + SMOOTHING) * scale;
            (o - e).powi(2) / e
        })
        .sum();

    let degrees_of_freedom = k - 1;
    let dist = ChiSquared::new(degrees_of_freedom as f64)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;
    let p_value = dist.sf(statistic).clamp(0.0, 1.0);

    Ok(ChiSquareResult {
        statistic,
        degrees_of_freedom,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_same_proportions_different_totals() {
        // Expected gets rescaled to the observed total
        let expected = counts(&[("yes", 500), ("no", 500)]);
        let observed = counts(&[("yes", 50), ("no", 50)]);
        let result = chi_square(&observed, &expected).unwrap();
        assert_eq!(result.degrees_of_freedom, 1);
        assert!(result.statistic < 1e-6);
        assert!(result.p_value > 0.99);
    }

    #[test]
    fn test_shifted_proportions() {
        let expected = counts(&[("yes", 500), ("no", 500)]);
        let observed = counts(&[("yes", 90), ("no", 10)]);
        let result = chi_square(&observed, &expected).unwrap();
        assert!(result.statistic > 30.0);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn test_new_category_is_finite() {
        let expected = counts(&[("a", 100)]);
        let observed = counts(&[("a", 50), ("b", 50)]);
        let result = chi_square(&observed, &expected).unwrap();
        assert!(result.statistic.is_finite());
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_single_category() {
        let expected = counts(&[("a", 10)]);
        let result = chi_square(&expected, &expected).unwrap();
        assert_eq!(result.degrees_of_freedom, 0);
        assert_eq!(result.p_value, 1.0);
    }
}
