//! Optimization test functions library
//!
//! A small collection of benchmark functions used to validate the samplers,
//! organized by category:
//!
//! - **Unimodal**: single global optimum (sphere, quadratic, rosenbrock)
//! - **Multimodal**: many local minima (rastrigin, ackley)
//!
//! # Example
//!
//! ```rust
//! use ndarray::Array1;
//! use hypertune_testfunctions::*;
//!
//! let x = Array1::from_vec(vec![0.0, 0.0]);
//! assert_eq!(sphere(&x), 0.0);
//!
//! let bounds = get_function_bounds("sphere").unwrap();
//! assert_eq!(bounds, (-5.12, 5.12));
//! ```

use ndarray::{Array1, Array2};

pub mod functions;
pub use functions::*;

/// Create bounds matrix for optimization (2 x n matrix)
/// bounds[[0, i]] = lower bound, bounds[[1, i]] = upper bound
pub fn create_bounds(n: usize, lower: f64, upper: f64) -> Array2<f64> {
    Array2::from_shape_fn((2, n), |(i, _)| if i == 0 { lower } else { upper })
}

/// Canonical per-dimension bounds for a named function, when one is defined.
pub fn get_function_bounds(name: &str) -> Option<(f64, f64)> {
    match name {
        "sphere" | "rastrigin" => Some((-5.12, 5.12)),
        "quadratic" => Some((-5.0, 5.0)),
        "rosenbrock" => Some((-2.0, 2.0)),
        "ackley" => Some((-32.768, 32.768)),
        _ => None,
    }
}

/// Evaluate a named function on a slice, for table-driven tests.
pub fn evaluate(name: &str, x: &[f64]) -> Option<f64> {
    let x = Array1::from_vec(x.to_vec());
    match name {
        "sphere" => Some(sphere(&x)),
        "quadratic" => Some(quadratic(&x)),
        "rosenbrock" => Some(rosenbrock(&x)),
        "rastrigin" => Some(rastrigin(&x)),
        "ackley" => Some(ackley(&x)),
        _ => None,
    }
}
