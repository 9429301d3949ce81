use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

/// Box-Muller normal sample, seeded so every run sees the same data
fn normal_sample(seed: u64, n: usize, mean: f64, std: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            mean + std * z
        })
        .collect()
}

#[test]
fn test_engine_is_deterministic() {
    let baseline = normal_sample(1, 400, 0.0, 1.0);
    let current = normal_sample(2, 300, 0.4, 1.2);

    let ks1 = ks_two_sample(&baseline, &current).unwrap();
    let ks2 = ks_two_sample(&baseline, &current).unwrap();
    assert_eq!(ks1.statistic.to_bits(), ks2.statistic.to_bits());
    assert_eq!(ks1.p_value.to_bits(), ks2.p_value.to_bits());

    let psi1 = psi(&baseline, &current, 10, 1e-4).unwrap();
    let psi2 = psi(&baseline, &current, 10, 1e-4).unwrap();
    assert_eq!(psi1.to_bits(), psi2.to_bits());

    let w1 = wasserstein_distance(&baseline, &current).unwrap();
    let w2 = wasserstein_distance(&baseline, &current).unwrap();
    assert_eq!(w1.to_bits(), w2.to_bits());
}

#[test]
fn test_same_distribution_low_psi() {
    let baseline = normal_sample(10, 1000, 0.0, 1.0);
    let current = normal_sample(11, 600, 0.0, 1.0);

    let score = psi(&baseline, &current, 10, 1e-4).unwrap();
    assert!(score < 0.1, "psi = {}", score);

    let ks = ks_two_sample(&baseline, &current).unwrap();
    assert!(ks.p_value > 0.01, "p = {}", ks.p_value);
}

#[test]
fn test_shifted_distribution_flagged() {
    let baseline = normal_sample(20, 200, 0.0, 1.0);
    let current = normal_sample(21, 150, 3.0, 1.0);

    let ks = ks_two_sample(&baseline, &current).unwrap();
    assert!(ks.statistic > 0.7);
    assert!(ks.p_value < 0.05);

    let score = psi(&baseline, &current, 10, 1e-4).unwrap();
    assert!(score > 0.25, "psi = {}", score);

    let distance = wasserstein_distance(&baseline, &current).unwrap();
    assert!((distance - 3.0).abs() < 0.5, "distance = {}", distance);
}

#[test]
fn test_p_value_in_unit_interval() {
    for shift in [0.0, 0.1, 0.5, 1.0, 5.0] {
        let baseline = normal_sample(30, 80, 0.0, 1.0);
        let current = normal_sample(31, 60, shift, 1.0);
        let ks = ks_two_sample(&baseline, &current).unwrap();
        assert!((0.0..=1.0).contains(&ks.p_value));
        assert!(psi(&baseline, &current, 10, 1e-4).unwrap() >= 0.0);
        assert!(wasserstein_distance(&baseline, &current).unwrap() >= 0.0);
    }
}

#[test]
fn test_frequencies_and_mean() {
    let counts = frequencies(["a", "b", "a"]);
    assert_eq!(counts.get("a"), Some(&2));
    assert_eq!(counts.get("b"), Some(&1));

    assert_eq!(mean(&[]), None);
    assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
}
