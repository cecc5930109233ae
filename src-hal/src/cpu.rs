//! Default in-process dense implementation of the compute backend.

use ndarray::{Array1, Array2};

use crate::{check_shapes, BackendError, ComputeBackend};

/// Plain ndarray implementation; no state beyond the type itself.
#[derive(Debug, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for CpuBackend {
    fn sample_population(
        &mut self,
        bd: &Array2<f64>,
        z: &Array2<f64>,
        mean: &Array1<f64>,
        sigma: f64,
        out: &mut Array2<f64>,
    ) -> Result<(), BackendError> {
        let n = mean.len();
        check_shapes("sample_population", bd.nrows() == n && bd.ncols() == n, || {
            format!("bd is {}x{}, mean has {} entries", bd.nrows(), bd.ncols(), n)
        })?;
        check_shapes("sample_population", z.ncols() == n, || {
            format!("z has {} columns, expected {}", z.ncols(), n)
        })?;
        check_shapes(
            "sample_population",
            out.nrows() == z.nrows() && out.ncols() == n,
            || {
                format!(
                    "out is {}x{}, expected {}x{}",
                    out.nrows(),
                    out.ncols(),
                    z.nrows(),
                    n
                )
            },
        )?;

        // out = Z * (BD)^T scaled and shifted; one matmul for the whole batch.
        let mapped = z.dot(&bd.t());
        for (mut row, src) in out.rows_mut().into_iter().zip(mapped.rows()) {
            for ((o, &m), &y) in row.iter_mut().zip(mean.iter()).zip(src.iter()) {
                *o = m + sigma * y;
            }
        }
        Ok(())
    }

    fn rank_mu(
        &mut self,
        artmp: &Array2<f64>,
        weights: &Array1<f64>,
        out: &mut Array2<f64>,
    ) -> Result<(), BackendError> {
        let n = artmp.ncols();
        check_shapes("rank_mu", weights.len() == artmp.nrows(), || {
            format!(
                "{} weights for {} rows of artmp",
                weights.len(),
                artmp.nrows()
            )
        })?;
        check_shapes("rank_mu", out.nrows() == n && out.ncols() == n, || {
            format!("out is {}x{}, expected {}x{}", out.nrows(), out.ncols(), n, n)
        })?;

        // out = artmp^T * diag(w) * artmp
        out.fill(0.0);
        for (row, &w) in artmp.rows().into_iter().zip(weights.iter()) {
            for i in 0..n {
                let wi = w * row[i];
                for j in 0..n {
                    out[(i, j)] += wi * row[j];
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sample_population_matches_manual_compute() {
        let mut backend = CpuBackend::new();
        let bd = array![[1.0, 0.5], [0.0, 2.0]];
        let z = array![[1.0, 1.0], [-1.0, 0.5]];
        let mean = array![10.0, 20.0];
        let sigma = 2.0;
        let mut out = Array2::zeros((2, 2));

        backend
            .sample_population(&bd, &z, &mean, sigma, &mut out)
            .unwrap();

        // Row 0: BD * [1, 1] = [1.5, 2.0] -> mean + 2 * y
        assert!((out[(0, 0)] - 13.0).abs() < 1e-12);
        assert!((out[(0, 1)] - 24.0).abs() < 1e-12);
        // Row 1: BD * [-1, 0.5] = [-0.75, 1.0]
        assert!((out[(1, 0)] - 8.5).abs() < 1e-12);
        assert!((out[(1, 1)] - 22.0).abs() < 1e-12);
    }

    #[test]
    fn rank_mu_matches_manual_compute() {
        let mut backend = CpuBackend::new();
        let artmp = array![[1.0, 2.0], [3.0, -1.0]];
        let weights = array![0.75, 0.25];
        let mut out = Array2::zeros((2, 2));

        backend.rank_mu(&artmp, &weights, &mut out).unwrap();

        // 0.75 * [1,2][1,2]^T + 0.25 * [3,-1][3,-1]^T
        assert!((out[(0, 0)] - (0.75 + 2.25)).abs() < 1e-12);
        assert!((out[(0, 1)] - (1.5 - 0.75)).abs() < 1e-12);
        assert!((out[(1, 0)] - out[(0, 1)]).abs() < 1e-12);
        assert!((out[(1, 1)] - (3.0 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut backend = CpuBackend::new();
        let bd = Array2::zeros((2, 2));
        let z = Array2::zeros((3, 3));
        let mean = Array1::zeros(2);
        let mut out = Array2::zeros((3, 2));
        assert!(matches!(
            backend.sample_population(&bd, &z, &mean, 1.0, &mut out),
            Err(BackendError::Shape { .. })
        ));
    }
}
