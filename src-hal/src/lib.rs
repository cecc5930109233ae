//! Compute backend abstraction for hypertune
//!
//! CMA-ES spends its inner-loop time on two batched dense routines: mapping a
//! block of standard-normal draws through `m + sigma * BD * z`, and
//! accumulating the weighted rank-mu outer-product sum. This crate defines
//! the backend interface for those two routines plus the default in-process
//! ndarray implementation.
//!
//! Accelerated implementations (GPU batched matmul) live outside the
//! workspace and register through the same trait; eigendecomposition is
//! deliberately not part of the interface and always runs in-process.

use ndarray::{Array1, Array2};
use thiserror::Error;

pub mod cpu;

pub use cpu::CpuBackend;

/// Backend selection, chosen at sampler construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// In-process dense linear algebra (always available).
    #[default]
    Cpu,
    /// Offloaded batched routines; requires an accelerated build.
    Gpu,
}

/// Errors raised by backend creation or the batched routines.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("backend '{0}' is not available in this build")]
    Unavailable(&'static str),

    #[error("shape mismatch in {routine}: {detail}")]
    Shape {
        routine: &'static str,
        detail: String,
    },
}

/// Batched dense routines consumed by the CMA-ES sampler.
pub trait ComputeBackend: Send {
    /// `out[i, :] = mean + sigma * bd.dot(z[i, :])` for every row of `z`.
    ///
    /// `bd` is the `n x n` product `B * diag(D)` of the covariance
    /// eigendecomposition, `z` is `lambda x n` standard-normal draws.
    fn sample_population(
        &mut self,
        bd: &Array2<f64>,
        z: &Array2<f64>,
        mean: &Array1<f64>,
        sigma: f64,
        out: &mut Array2<f64>,
    ) -> Result<(), BackendError>;

    /// `out = sum_i weights[i] * artmp[i, :] * artmp[i, :]^T`.
    ///
    /// `artmp` holds the `mu` scaled mean-relative steps, one per row.
    fn rank_mu(
        &mut self,
        artmp: &Array2<f64>,
        weights: &Array1<f64>,
        out: &mut Array2<f64>,
    ) -> Result<(), BackendError>;

    /// Backend name for logs and error messages.
    fn name(&self) -> &'static str;

    /// Release backend-owned resources. Idempotent; the default does nothing.
    fn dispose(&mut self) {}
}

/// Instantiate the requested backend.
///
/// `Backend::Gpu` fails here rather than at first use so samplers can surface
/// the error before any trial number is allocated.
pub fn create_backend(backend: Backend) -> Result<Box<dyn ComputeBackend>, BackendError> {
    match backend {
        Backend::Cpu => {
            log::debug!("using in-process CPU compute backend");
            Ok(Box::new(CpuBackend::new()))
        }
        Backend::Gpu => Err(BackendError::Unavailable("gpu")),
    }
}

pub(crate) fn check_shapes(
    routine: &'static str,
    condition: bool,
    detail: impl FnOnce() -> String,
) -> Result<(), BackendError> {
    if condition {
        Ok(())
    } else {
        Err(BackendError::Shape {
            routine,
            detail: detail(),
        })
    }
}
