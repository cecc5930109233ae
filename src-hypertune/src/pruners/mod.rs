//! Early-stopping policies over intermediate trial values.
//!
//! All pruners operate on oriented values: the study hands its direction in
//! and every policy treats a numerically larger oriented value as worse, so
//! maximizing studies need no special cases anywhere below.

use std::sync::Arc;

use thiserror::Error;

use hypertune_space::{Direction, Trial, TrialState};

mod median;
mod percentile;
mod successive_halving;

pub use median::MedianPruner;
pub use percentile::PercentilePruner;
pub use successive_halving::SuccessiveHalvingPruner;

/// Errors raised by pruner construction.
#[derive(Debug, Clone, Error)]
pub enum PrunerError {
    #[error("percentile must lie in [0, 100], got {0}")]
    PercentileOutOfRange(f64),

    #[error("reduction_factor must be greater than 1, got {0}")]
    BadReductionFactor(u64),

    #[error("min_resource must be at least 1")]
    BadMinResource,

    #[error("interval_steps must be at least 1")]
    BadIntervalSteps,
}

/// Decide whether a Running trial should be stopped early, given a snapshot
/// of the study's trial history.
pub trait Pruner: Send {
    fn should_prune(&self, trial: &Trial, trials: &[Arc<Trial>], direction: Direction) -> bool;

    /// Pruner name for logs (e.g. "nop", "median").
    fn name(&self) -> &'static str;
}

/// Pruner that never prunes; the study default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopPruner;

impl Pruner for NopPruner {
    fn should_prune(&self, _trial: &Trial, _trials: &[Arc<Trial>], _direction: Direction) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "nop"
    }
}

/// Oriented step-`step` intermediates of Complete peers of `trial`.
pub(crate) fn peer_values_at(
    trial: &Trial,
    trials: &[Arc<Trial>],
    step: u64,
    direction: Direction,
) -> Vec<f64> {
    trials
        .iter()
        .filter(|t| t.number() != trial.number() && t.state() == TrialState::Complete)
        .filter_map(|t| t.intermediate_at(step))
        .map(|v| direction.orient(v))
        .collect()
}

/// Median of a non-empty slice (mean of the middle pair for even lengths).
pub(crate) fn median_of(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        0.5 * (values[mid - 1] + values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypertune_space::ParamAssignment;

    #[test]
    fn nop_never_prunes() {
        let trial = Trial::new(0, ParamAssignment::new());
        trial.report(1, 1e9);
        assert!(!NopPruner.should_prune(&trial, &[], Direction::Minimize));
        assert!(!NopPruner.should_prune(&trial, &[], Direction::Maximize));
    }

    #[test]
    fn median_of_handles_even_and_odd() {
        assert_eq!(median_of(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_of(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median_of(&mut [7.0]), 7.0);
    }
}
