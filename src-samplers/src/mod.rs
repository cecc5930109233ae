//! Sampler algorithms for hypertune
//!
//! Three samplers share one capability interface:
//! - uniform random over each range variant,
//! - TPE (Tree-structured Parzen Estimator), a density-ratio method built on
//!   the kernel estimators in [`parzen`] and [`categorical`],
//! - CMA-ES, a (mu/mu_w, lambda) evolution strategy over the continuous
//!   coordinates, with its batched algebra delegated to `hypertune-hal`.
//!
//! Every sampler owns its own seeded RNG; none of them keeps global state.
//!
//! # References
//!
//! - Bergstra et al., "Algorithms for Hyper-Parameter Optimization" (TPE)
//! - Hansen & Ostermeier, "Completely Derandomized Self-Adaptation in
//!   Evolution Strategies" (CMA-ES)

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use hypertune_space::{Direction, ParamAssignment, SearchSpace, Trial};

pub mod categorical;
pub mod cmaes;
pub mod numerics;
pub mod parzen;
pub mod random;
pub mod tpe;

// Re-export commonly used items
pub use categorical::CategoricalEstimator;
pub use cmaes::{CmaesConfig, CmaesMetrics, CmaesSampler};
pub use parzen::ParzenEstimator;
pub use random::{sample_uniform, RandomSampler};
pub use tpe::{TpeConfig, TpeSampler};

/// Errors raised by sampler construction or sampling.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("search space contains no continuous parameters")]
    NoContinuousParameters,

    #[error("n_ei_candidates must be a positive integer")]
    ZeroCandidates,

    #[error(transparent)]
    Backend(#[from] hypertune_hal::BackendError),
}

/// The capability a study plugs in: propose one parameter assignment from the
/// trial history, the optimization direction(s) and the search space.
///
/// The study invokes `sample` under its own lock with a consistent snapshot
/// of the trial list; implementations must not retain the trials. A sampler
/// instance belongs to exactly one study.
pub trait Sampler: Send {
    fn sample(
        &mut self,
        trials: &[Arc<Trial>],
        directions: &[Direction],
        space: &SearchSpace,
    ) -> Result<ParamAssignment, SamplerError>;

    /// Release sampler-owned resources (e.g. compute-backend handles).
    /// Idempotent; the default does nothing.
    fn dispose(&mut self) {}

    /// Sampler name for logs (e.g. "random", "tpe", "cmaes").
    fn name(&self) -> &'static str;
}

/// Seeded RNG ownership shared by all samplers: a fixed seed gives a
/// reproducible stream, otherwise the thread RNG bootstraps one.
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => {
            let mut thread_rng = rand::rng();
            StdRng::from_rng(&mut thread_rng)
        }
    }
}
