//! Study coordinator: thread-safe ask/tell over a search space.
//!
//! A study owns its sampler, pruner and trial history behind one mutex.
//! `ask` allocates the next dense trial number and appends a Running trial;
//! `tell` commits a terminal state, evaluates the constraint function and
//! refreshes the best-trial cache. Batch variants amortize the lock. A tell
//! either fully commits or leaves the study unchanged.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use hypertune_samplers::{Sampler, SamplerError, TpeSampler};
use hypertune_space::{Direction, SearchSpace, Trial, TrialState};

use crate::multiobjective;
use crate::persistence::PersistenceError;
use crate::pruners::{NopPruner, Pruner};

/// Result reported for one trial. `Complete` always carries its value(s);
/// there is no state-only completion.
#[derive(Debug, Clone)]
pub enum TrialResult {
    Value(f64),
    Values(Vec<f64>),
    Fail,
    Pruned,
}

/// Constraint function evaluated during `tell`, after the objective is
/// staged on the trial. Coordinates <= 0 are feasible. An `Err` aborts the
/// tell and leaves the trial Running so the caller may retry.
pub type ConstraintFn = Box<dyn Fn(&Trial) -> Result<Vec<f64>, String> + Send>;

/// Errors surfaced by study construction and the ask/tell contract.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("search space must contain at least one parameter")]
    EmptySpace,

    #[error("at least one direction is required")]
    NoDirections,

    #[error("unknown trial number {0}")]
    UnknownTrial(usize),

    #[error("trial {0} was already told")]
    AlreadyTold(usize),

    #[error("an empty objective vector is not a valid result")]
    EmptyValues,

    #[error("constraint evaluation failed: {0}")]
    Constraint(String),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

struct StudyInner {
    sampler: Box<dyn Sampler>,
    pruner: Box<dyn Pruner>,
    constraint_fn: Option<ConstraintFn>,
    trials: Vec<Arc<Trial>>,
    best: Option<Arc<Trial>>,
    disposed: bool,
}

/// The coordinator owning a search space, a sampler and a trial history.
///
/// Every public operation acquires the internal mutex, runs to completion
/// and releases it; trial numbers are allocated in lock-acquisition order.
pub struct Study {
    name: String,
    space: SearchSpace,
    directions: Vec<Direction>,
    inner: Mutex<StudyInner>,
}

/// Fluent construction for studies with a non-default sampler, pruner or
/// warm-start history.
pub struct StudyBuilder {
    name: String,
    space: SearchSpace,
    directions: Vec<Direction>,
    sampler: Option<Box<dyn Sampler>>,
    pruner: Option<Box<dyn Pruner>>,
    warm_start: Vec<Arc<Trial>>,
}

impl StudyBuilder {
    pub fn direction(mut self, direction: Direction) -> Self {
        self.directions = vec![direction];
        self
    }

    pub fn directions(mut self, directions: Vec<Direction>) -> Self {
        self.directions = directions;
        self
    }

    pub fn sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn pruner(mut self, pruner: Box<dyn Pruner>) -> Self {
        self.pruner = Some(pruner);
        self
    }

    /// Import a previously produced history. Only Complete trials are kept;
    /// they are renumbered densely in their original order with parameters,
    /// values, intermediates and constraint values copied verbatim.
    pub fn warm_start(mut self, trials: Vec<Arc<Trial>>) -> Self {
        self.warm_start = trials;
        self
    }

    pub fn build(self) -> Result<Study, StudyError> {
        if self.space.is_empty() {
            return Err(StudyError::EmptySpace);
        }
        if self.directions.is_empty() {
            return Err(StudyError::NoDirections);
        }

        let mut trials: Vec<Arc<Trial>> = Vec::with_capacity(self.warm_start.len());
        for old in self
            .warm_start
            .iter()
            .filter(|t| t.state() == TrialState::Complete)
        {
            let values = old
                .values()
                .unwrap_or_else(|| old.value().into_iter().collect());
            let restored = Trial::restore(
                trials.len(),
                old.parameters().clone(),
                TrialState::Complete,
                old.value(),
                if values.len() > 1 { Some(values) } else { None },
                old.constraint_values(),
                old.intermediate_values(),
            );
            trials.push(Arc::new(restored));
        }

        let best = recompute_best(&trials, self.directions[0]);
        Ok(Study {
            name: self.name,
            space: self.space,
            directions: self.directions,
            inner: Mutex::new(StudyInner {
                sampler: self.sampler.unwrap_or_else(|| Box::new(TpeSampler::default())),
                pruner: self.pruner.unwrap_or_else(|| Box::new(NopPruner)),
                constraint_fn: None,
                trials,
                best,
                disposed: false,
            }),
        })
    }
}

/// Single-objective study with the default sampler and pruner.
pub fn create_study(
    name: impl Into<String>,
    space: SearchSpace,
    direction: Direction,
) -> Result<Study, StudyError> {
    Study::builder(name, space).direction(direction).build()
}

/// Multi-objective study; one direction per objective.
pub fn create_multi_objective_study(
    name: impl Into<String>,
    space: SearchSpace,
    directions: Vec<Direction>,
) -> Result<Study, StudyError> {
    Study::builder(name, space).directions(directions).build()
}

fn recompute_best(trials: &[Arc<Trial>], direction: Direction) -> Option<Arc<Trial>> {
    let mut best: Option<(f64, &Arc<Trial>)> = None;
    for trial in trials {
        if trial.state() != TrialState::Complete {
            continue;
        }
        let Some(value) = trial.value() else { continue };
        let oriented = direction.orient(value);
        match best {
            Some((current, _)) if oriented >= current => {}
            _ => best = Some((oriented, trial)),
        }
    }
    best.map(|(_, t)| t.clone())
}

impl Study {
    pub fn builder(name: impl Into<String>, space: SearchSpace) -> StudyBuilder {
        StudyBuilder {
            name: name.into(),
            space,
            directions: vec![Direction::Minimize],
            sampler: None,
            pruner: None,
            warm_start: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// First (or only) optimization direction.
    pub fn direction(&self) -> Direction {
        self.directions[0]
    }

    /// Suggest the next trial. The sampler sees a consistent snapshot of the
    /// history; on sampler failure no trial number is consumed.
    pub fn ask(&self) -> Result<Arc<Trial>, StudyError> {
        let mut inner = self.inner.lock();
        Self::ask_locked(&mut inner, &self.directions, &self.space)
    }

    /// Suggest `n` trials under a single lock acquisition; numbers are
    /// contiguous. With the TPE sampler and constant liar enabled, earlier
    /// trials of the batch sit in the "above" group of later ones.
    pub fn ask_batch(&self, n: usize) -> Result<Vec<Arc<Trial>>, StudyError> {
        let mut inner = self.inner.lock();
        let mut batch = Vec::with_capacity(n);
        for _ in 0..n {
            batch.push(Self::ask_locked(&mut inner, &self.directions, &self.space)?);
        }
        Ok(batch)
    }

    fn ask_locked(
        inner: &mut StudyInner,
        directions: &[Direction],
        space: &SearchSpace,
    ) -> Result<Arc<Trial>, StudyError> {
        let StudyInner {
            sampler, trials, ..
        } = inner;
        let params = sampler.sample(trials, directions, space)?;
        let trial = Arc::new(Trial::new(trials.len(), params));
        trials.push(Arc::clone(&trial));
        log::debug!(
            "study: allocated trial {} via sampler '{}'",
            trial.number(),
            sampler.name()
        );
        Ok(trial)
    }

    /// Commit a result for trial `number`. Unknown numbers and repeated
    /// tells are errors that leave the study untouched.
    pub fn tell(&self, number: usize, result: TrialResult) -> Result<(), StudyError> {
        let mut inner = self.inner.lock();
        Self::tell_locked(&mut inner, &self.directions, number, result)
    }

    /// Best-effort batch tell: unknown numbers are skipped (the evaluator
    /// may race a save/restore), every other per-entry failure propagates.
    /// An empty batch is a no-op.
    pub fn tell_batch(&self, results: Vec<(usize, TrialResult)>) -> Result<(), StudyError> {
        let mut inner = self.inner.lock();
        for (number, result) in results {
            if number >= inner.trials.len() {
                log::warn!("study: tell_batch skipping unknown trial number {number}");
                continue;
            }
            Self::tell_locked(&mut inner, &self.directions, number, result)?;
        }
        Ok(())
    }

    fn tell_locked(
        inner: &mut StudyInner,
        directions: &[Direction],
        number: usize,
        result: TrialResult,
    ) -> Result<(), StudyError> {
        let trial = inner
            .trials
            .get(number)
            .cloned()
            .ok_or(StudyError::UnknownTrial(number))?;
        if trial.state().is_terminal() {
            return Err(StudyError::AlreadyTold(number));
        }
        match result {
            TrialResult::Fail => trial.transition(TrialState::Fail),
            TrialResult::Pruned => trial.transition(TrialState::Pruned),
            TrialResult::Value(value) => {
                Self::commit_complete(inner, directions, &trial, &[value])?
            }
            TrialResult::Values(values) => {
                if values.is_empty() {
                    return Err(StudyError::EmptyValues);
                }
                Self::commit_complete(inner, directions, &trial, &values)?
            }
        }
        log::debug!("study: trial {} -> {:?}", number, trial.state());
        Ok(())
    }

    fn commit_complete(
        inner: &mut StudyInner,
        directions: &[Direction],
        trial: &Arc<Trial>,
        values: &[f64],
    ) -> Result<(), StudyError> {
        // Stage the objective so the constraint function can read it, but
        // only transition once the constraint evaluated cleanly.
        trial.stage_objective(values);
        if let Some(constraint) = &inner.constraint_fn {
            match constraint(trial) {
                Ok(constraint_values) => trial.set_constraint_values(constraint_values),
                Err(message) => {
                    trial.clear_objective();
                    return Err(StudyError::Constraint(message));
                }
            }
        }
        trial.transition(TrialState::Complete);

        let direction = directions[0];
        let better = match &inner.best {
            None => true,
            Some(best) => {
                let candidate = direction.orient(trial.value().unwrap_or(direction.worst()));
                let incumbent = direction.orient(best.value().unwrap_or(direction.worst()));
                candidate < incumbent
            }
        };
        if better {
            inner.best = Some(Arc::clone(trial));
        }
        Ok(())
    }

    /// Forward an intermediate report to the trial.
    pub fn report(&self, trial: &Trial, step: u64, value: f64) {
        trial.report(step, value);
    }

    /// Ask the configured pruner about a Running trial, against a snapshot
    /// of the history.
    pub fn should_prune(&self, trial: &Trial) -> bool {
        let inner = self.inner.lock();
        inner
            .pruner
            .should_prune(trial, &inner.trials, self.directions[0])
    }

    /// Install (or replace) the constraint function applied on later tells.
    pub fn set_constraint_function(&self, constraint: ConstraintFn) {
        self.inner.lock().constraint_fn = Some(constraint);
    }

    /// Feasible iff the trial has no constraint vector or all coordinates
    /// are <= 0.
    pub fn is_feasible(&self, trial: &Trial) -> bool {
        trial.is_feasible()
    }

    /// Complete trial extremal in the first objective under its direction.
    /// Failed, Pruned and Running trials never qualify.
    pub fn best_trial(&self) -> Option<Arc<Trial>> {
        self.inner.lock().best.clone()
    }

    /// Non-dominated Complete trials; for scalar studies this is the best
    /// trial alone.
    pub fn pareto_front(&self) -> Vec<Arc<Trial>> {
        let inner = self.inner.lock();
        if self.directions.len() <= 1 {
            return inner.best.clone().into_iter().collect();
        }
        multiobjective::pareto_front(&inner.trials, &self.directions)
    }

    /// Snapshot of all trials in number order.
    pub fn trials(&self) -> Vec<Arc<Trial>> {
        self.inner.lock().trials.clone()
    }

    pub fn n_trials(&self) -> usize {
        self.inner.lock().trials.len()
    }

    /// Release sampler-owned resources (compute backends). Idempotent; the
    /// study remains readable afterwards.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        if inner.disposed {
            return;
        }
        inner.sampler.dispose();
        inner.disposed = true;
    }
}
