//! Population Stability Index
//!
//! `PSI = Σ (cur% - base%) * ln(cur% / base%)`
//!
//! Conventional reading: `< 0.1` negligible, `0.1 - 0.25` warning, `> 0.25`
//! critical. The cut-offs are configuration, not part of this module.

use std::collections::{BTreeMap, BTreeSet};

use super::sorted_finite;
use crate::logic::error::StatsError;

/// PSI over `bins` equal-width bins spanning the combined range of both samples.
/// `epsilon` is added to every bin percentage.
pub fn psi(baseline: &[f64], current: &[f64], bins: usize, epsilon: f64) -> Result<f64, StatsError> {
    if bins < 2 {
        return Err(StatsError::InvalidBins { needed: 2, got: bins });
    }

    let base = sorted_finite(baseline, "baseline")?;
    let cur = sorted_finite(current, "current")?;

    let min = base[0].min(cur[0]);
    let max = base[base.len() - 1].max(cur[cur.len() - 1]);

    // All values identical: both samples fall in one bin
    if max - min <= f64::EPSILON * max.abs().max(1.0) {
        return Ok(0.0);
    }

    let width = (max - min) / bins as f64;
    let base_counts = histogram(&base, min, width, bins);
    let cur_counts = histogram(&cur, min, width, bins);

    Ok(psi_from_counts(
        &base_counts,
        base.len(),
        &cur_counts,
        cur.len(),
        epsilon,
    ))
}

/// PSI over category frequencies (one "bin" per category seen in either sample)
pub fn categorical_psi(
    baseline: &BTreeMap<String, usize>,
    current: &BTreeMap<String, usize>,
    epsilon: f64,
) -> Result<f64, StatsError> {
    let base_total: usize = baseline.values().sum();
    let cur_total: usize = current.values().sum();
    if base_total == 0 {
        return Err(StatsError::EmptySample("baseline"));
    }
    if cur_total == 0 {
        return Err(StatsError::EmptySample("current"));
    }

    let categories: BTreeSet<&String> = baseline.keys().chain(current.keys()).collect();
    let base_counts: Vec<usize> = categories
        .iter()
        .map(|c| baseline.get(*c).copied().unwrap_or(0))
        .collect();
    let cur_counts: Vec<usize> = categories
        .iter()
        .map(|c| current.get(*c).copied().unwrap_or(0))
        .collect();

    Ok(psi_from_counts(&base_counts, base_total, &cur_counts, cur_total, epsilon))
}

fn histogram(sorted: &[f64], min: f64, width: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    for &v in sorted {
        // Max value lands in the last bin
        let bin = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[bin] += 1;
    }
    counts
}

fn psi_from_counts(
    base_counts: &[usize],
    base_total: usize,
    cur_counts: &[usize],
    cur_total: usize,
    epsilon: f64,
) -> f64 {
    let score: f64 = base_counts
        .iter()
        .zip(cur_counts.iter())
        .map(|(&b, &c)| {
            let base_pct = b as f64 / base_total as f64 + epsilon;
            let cur_pct = c as f64 / cur_total as f64 + epsilon;
            (cur_pct - base_pct) * (cur_pct / base_pct).ln()
        })
        .sum();

    // Every term is >= 0; clamp away rounding noise
    score.max(0.0)
}
