//! Benchmark functions with many local minima.

use ndarray::Array1;

/// Rastrigin; global minimum 0 at the origin, lattice of local minima.
pub fn rastrigin(x: &Array1<f64>) -> f64 {
    let a = 10.0;
    a * x.len() as f64
        + x.iter()
            .map(|&xi| xi * xi - a * (2.0 * std::f64::consts::PI * xi).cos())
            .sum::<f64>()
}

/// Ackley; global minimum 0 at the origin, nearly flat outer region.
pub fn ackley(x: &Array1<f64>) -> f64 {
    let n = x.len() as f64;
    let sum_sq: f64 = x.iter().map(|&v| v * v).sum();
    let sum_cos: f64 = x
        .iter()
        .map(|&v| (2.0 * std::f64::consts::PI * v).cos())
        .sum();
    -20.0 * (-0.2 * (sum_sq / n).sqrt()).exp() - (sum_cos / n).exp()
        + 20.0
        + std::f64::consts::E
}
