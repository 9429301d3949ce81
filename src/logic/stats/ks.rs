//! Two-sample Kolmogorov-Smirnov test

use serde::{Deserialize, Serialize};

use super::sorted_finite;
use crate::logic::error::StatsError;

/// Series terms before the Kolmogorov tail sum is considered non-convergent
const MAX_SERIES_TERMS: usize = 100;
const EPS_TERM: f64 = 0.001;
const EPS_SUM: f64 = 1.0e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsResult {
    /// Largest absolute gap between the two empirical CDFs
    pub statistic: f64,
    /// Asymptotic p-value, in `[0, 1]`
    pub p_value: f64,
}

/// Compare two samples. A low p-value means the samples likely come from
/// different distributions.
pub fn ks_two_sample(baseline: &[f64], current: &[f64]) -> Result<KsResult, StatsError> {
    let a = sorted_finite(baseline, "baseline")?;
    let b = sorted_finite(current, "current")?;

    let statistic = ks_statistic(&a, &b);

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let effective_n = (n1 * n2 / (n1 + n2)).sqrt();
    let lambda = (effective_n + 0.12 + 0.11 / effective_n) * statistic;

    Ok(KsResult {
        statistic,
        p_value: kolmogorov_survival(lambda),
    })
}

/// Sup-norm distance between the empirical CDFs of two sorted samples
fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;

    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;

    // Once one sample is exhausted the gap can only shrink
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    d
}

/// `Q(λ) = 2 Σ (-1)^(k-1) exp(-2 k² λ²)`, clamped to `[0, 1]`
fn kolmogorov_survival(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }

    let a2 = -2.0 * lambda * lambda;
    let mut sign = 2.0;
    let mut sum = 0.0;
    let mut previous_term = 0.0;

    for k in 1..=MAX_SERIES_TERMS {
        let kf = k as f64;
        let term = sign * (a2 * kf * kf).exp();
        sum += term;
        if term.abs() <= EPS_TERM * previous_term || term.abs() <= EPS_SUM * sum {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        previous_term = term.abs();
    }

    // No convergence only happens for tiny λ, where Q -> 1
    1.0
}
