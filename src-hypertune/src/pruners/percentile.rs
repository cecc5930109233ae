//! Percentile pruner: the median rule generalized to an arbitrary quantile.

use std::sync::Arc;

use ordered_float::OrderedFloat;

use hypertune_space::{Direction, Trial, TrialState};

use super::{peer_values_at, Pruner, PrunerError};

/// Prunes a Running trial whose latest intermediate is worse than the
/// `percentile`-th quantile of its peers at the same step. `percentile = 50`
/// reproduces the median pruner.
#[derive(Debug, Clone)]
pub struct PercentilePruner {
    percentile: f64,
    n_startup_trials: usize,
    n_warmup_steps: u64,
    interval_steps: u64,
}

impl PercentilePruner {
    pub fn new(
        percentile: f64,
        n_startup_trials: usize,
        n_warmup_steps: u64,
        interval_steps: u64,
    ) -> Result<Self, PrunerError> {
        if !(0.0..=100.0).contains(&percentile) {
            return Err(PrunerError::PercentileOutOfRange(percentile));
        }
        if interval_steps < 1 {
            return Err(PrunerError::BadIntervalSteps);
        }
        Ok(Self {
            percentile,
            n_startup_trials,
            n_warmup_steps,
            interval_steps,
        })
    }
}

/// `ceil(p/100 * m) - 1` clamped into the index range of `m` sorted values.
fn quantile_index(percentile: f64, m: usize) -> usize {
    let raw = (percentile / 100.0 * m as f64).ceil() as i64 - 1;
    raw.clamp(0, m as i64 - 1) as usize
}

impl Pruner for PercentilePruner {
    fn should_prune(&self, trial: &Trial, trials: &[Arc<Trial>], direction: Direction) -> bool {
        if trial.state() != TrialState::Running {
            return false;
        }
        let Some(step) = trial.last_step() else {
            return false;
        };
        if step <= self.n_warmup_steps || step % self.interval_steps != 0 {
            return false;
        }
        let mut peers = peer_values_at(trial, trials, step, direction);
        if peers.len() < self.n_startup_trials {
            return false;
        }
        let Some(current) = trial.intermediate_at(step) else {
            return false;
        };
        peers.sort_by_key(|&v| OrderedFloat(v));
        let threshold = peers[quantile_index(self.percentile, peers.len())];
        direction.orient(current) > threshold
    }

    fn name(&self) -> &'static str {
        "percentile"
    }
}
