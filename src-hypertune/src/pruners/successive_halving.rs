//! Successive-halving pruner: rung-based tournament over resources.
//!
//! Steps map onto geometric rungs `r_k = min_resource * eta^k`. At each rung
//! only the top `1/eta` of the cohort survives; everything else is pruned.

use std::sync::Arc;

use ordered_float::OrderedFloat;

use hypertune_space::{Direction, Trial, TrialState};

use super::{Pruner, PrunerError};

#[derive(Debug, Clone)]
pub struct SuccessiveHalvingPruner {
    min_resource: u64,
    reduction_factor: u64,
}

impl SuccessiveHalvingPruner {
    pub fn new(min_resource: u64, reduction_factor: u64) -> Result<Self, PrunerError> {
        if min_resource < 1 {
            return Err(PrunerError::BadMinResource);
        }
        if reduction_factor <= 1 {
            return Err(PrunerError::BadReductionFactor(reduction_factor));
        }
        Ok(Self {
            min_resource,
            reduction_factor,
        })
    }

    /// Rung resource for a trial at `step`: the largest
    /// `min_resource * eta^k` not exceeding `step` (the base rung for
    /// `step <= min_resource`).
    fn rung_resource(&self, step: u64) -> u64 {
        let mut resource = self.min_resource;
        while resource.saturating_mul(self.reduction_factor) <= step {
            resource *= self.reduction_factor;
        }
        resource
    }
}

impl Pruner for SuccessiveHalvingPruner {
    fn should_prune(&self, trial: &Trial, trials: &[Arc<Trial>], direction: Direction) -> bool {
        if trial.state() != TrialState::Running {
            return false;
        }
        let Some(step) = trial.last_step() else {
            return false;
        };
        let resource = self.rung_resource(step);

        // The trial's own value at this rung; its latest report stands in
        // when the rung step itself was never reported.
        let Some(current_raw) = trial
            .intermediate_at(resource)
            .or_else(|| trial.intermediate_at(step))
        else {
            return false;
        };
        let current = direction.orient(current_raw);

        // Complete peers that reached this rung, by their value at it.
        let mut cohort: Vec<f64> = trials
            .iter()
            .filter(|t| t.number() != trial.number() && t.state() == TrialState::Complete)
            .filter(|t| t.last_step().map(|s| s >= resource).unwrap_or(false))
            .filter_map(|t| t.intermediate_at(resource))
            .map(|v| direction.orient(v))
            .collect();
        cohort.sort_by_key(|&v| OrderedFloat(v));

        let cohort_size = cohort.len() + 1;
        let survivors = cohort_size.div_ceil(self.reduction_factor as usize);
        // Rank counts strictly better cohort members, so ties survive.
        let rank = cohort.iter().filter(|&&v| v < current).count();
        rank >= survivors
    }

    fn name(&self) -> &'static str {
        "successive_halving"
    }
}
