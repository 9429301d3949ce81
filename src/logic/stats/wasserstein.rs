//! 1-D Wasserstein (earth mover's) distance
//!
//! `W1 = ∫ |F_u(x) - F_v(x)| dx` over the merged support.

use super::sorted_finite;
use crate::logic::error::StatsError;

pub fn wasserstein_distance(baseline: &[f64], current: &[f64]) -> Result<f64, StatsError> {
    let u = sorted_finite(baseline, "baseline")?;
    let v = sorted_finite(current, "current")?;

    let mut all: Vec<f64> = u.iter().chain(v.iter()).copied().collect();
    all.sort_by(|a, b| a.total_cmp(b));

    let nu = u.len() as f64;
    let nv = v.len() as f64;
    let (mut i, mut j) = (0usize, 0usize);
    let mut distance = 0.0;

    for window in all.windows(2) {
        let x = window[0];
        while i < u.len() && u[i] <= x {
            i += 1;
        }
        while j < v.len() && v[j] <= x {
            j += 1;
        }
        let delta = window[1] - x;
        distance += (i as f64 / nu - j as f64 / nv).abs() * delta;
    }

    Ok(distance)
}
