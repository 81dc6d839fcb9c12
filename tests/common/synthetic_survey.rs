#![allow(dead_code)]

use destripe::Sample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smooth regional field plus a slow along-y drift.
pub fn regional_field(x: f64, y: f64) -> f64 {
    0.02 * x + 30.0 * (y / 200.0).sin()
}

/// Alternating per-line offset for lines 100 units apart.
pub fn line_bias(y: f64) -> f64 {
    if (y / 100.0).floor() as i64 % 2 == 0 {
        1.5
    } else {
        -1.5
    }
}

/// `n` uniformly scattered samples in `[0, extent)²` with a fixed seed.
pub fn scattered_survey(n: usize, extent: f64, seed: u64) -> Vec<Sample> {
    assert!(n > 0, "survey needs at least one sample");
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let x = rng.gen_range(0.0..extent);
            let y = rng.gen_range(0.0..extent);
            Sample::new(x, y, regional_field(x, y) + line_bias(y))
        })
        .collect()
}

/// Samples placed exactly on a `side × side` lattice with spacing `cell`.
pub fn lattice_survey(side: usize, cell: f64) -> Vec<Sample> {
    let mut out = Vec::with_capacity(side * side);
    for j in 0..side {
        for i in 0..side {
            let (x, y) = (i as f64 * cell, j as f64 * cell);
            out.push(Sample::new(x, y, regional_field(x, y) + line_bias(y)));
        }
    }
    out
}

pub fn variance(values: &[f64]) -> f64 {
    assert!(!values.is_empty(), "variance of an empty set");
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Least-squares slope of `ys` regressed on `xs`.
pub fn regression_slope(xs: &[f64], ys: &[f64]) -> f64 {
    assert_eq!(xs.len(), ys.len(), "paired samples required");
    let n = xs.len() as f64;
    let (mx, my) = (xs.iter().sum::<f64>() / n, ys.iter().sum::<f64>() / n);
    let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let var: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    assert!(var > 0.0, "regressor has no spread");
    cov / var
}
