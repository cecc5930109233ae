//! Median pruner: stop a trial whose latest intermediate is worse than the
//! median of its peers' values at the same step.

use std::sync::Arc;

use hypertune_space::{Direction, Trial, TrialState};

use super::{median_of, peer_values_at, Pruner, PrunerError};

/// Prunes a Running trial when its value at its most recent step exceeds the
/// median of the Complete peers that also reported at that step.
#[derive(Debug, Clone)]
pub struct MedianPruner {
    n_startup_trials: usize,
    n_warmup_steps: u64,
    interval_steps: u64,
}

impl MedianPruner {
    pub fn new(
        n_startup_trials: usize,
        n_warmup_steps: u64,
        interval_steps: u64,
    ) -> Result<Self, PrunerError> {
        if interval_steps < 1 {
            return Err(PrunerError::BadIntervalSteps);
        }
        Ok(Self {
            n_startup_trials,
            n_warmup_steps,
            interval_steps,
        })
    }
}

impl Default for MedianPruner {
    fn default() -> Self {
        Self {
            n_startup_trials: 5,
            n_warmup_steps: 0,
            interval_steps: 1,
        }
    }
}

impl Pruner for MedianPruner {
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
        direction.orient(current) > median_of(&mut peers)
    }

    fn name(&self) -> &'static str {
        "median"
    }
}
