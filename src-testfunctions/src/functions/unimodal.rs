//! Single-optimum benchmark functions.

use ndarray::Array1;

/// Sphere: `sum(x_i^2)`, global minimum 0 at the origin.
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&v| v * v).sum()
}

/// Alias kept for the classic quadratic-bowl name.
pub fn quadratic(x: &Array1<f64>) -> f64 {
    sphere(x)
}

/// Sphere shifted so the optimum sits at `center` in every coordinate.
pub fn shifted_sphere(x: &Array1<f64>, center: f64) -> f64 {
    x.iter().map(|&v| (v - center) * (v - center)).sum()
}

/// N-dimensional Rosenbrock valley; global minimum 0 at (1, .., 1).
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    let mut total = 0.0;
    for i in 0..x.len().saturating_sub(1) {
        let a = x[i + 1] - x[i] * x[i];
        let b = 1.0 - x[i];
        total += 100.0 * a * a + b * b;
    }
    total
}
