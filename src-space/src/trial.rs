//! Trial record: one suggestion/evaluation pair and its lifecycle.

use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::range::ParamValue;

/// Parameter assignment suggested for one trial, keyed by range name.
pub type ParamAssignment = BTreeMap<String, ParamValue>;

/// Lifecycle state of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialState {
    Running,
    Complete,
    Fail,
    Pruned,
}

impl TrialState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TrialState::Running)
    }
}

#[derive(Debug)]
struct Outcome {
    state: TrialState,
    value: Option<f64>,
    values: Option<Vec<f64>>,
    constraint_values: Option<Vec<f64>>,
}

/// One suggestion/evaluation pair tracked by a study.
///
/// The study exclusively owns its trials; callers hold `Arc` handles keyed by
/// the trial number. Parameters and the number are write-once. The
/// intermediate-value map carries its own mutex so an evaluator thread may
/// `report` while the study reads during pruning; the outcome fields sit
/// behind a read/write lock and are mutated only by the study while it holds
/// its own lock.
#[derive(Debug)]
pub struct Trial {
    number: usize,
    parameters: ParamAssignment,
    outcome: RwLock<Outcome>,
    intermediates: Mutex<BTreeMap<u64, f64>>,
}

impl Trial {
    /// Fresh Running trial, as constructed by the study during `ask`.
    pub fn new(number: usize, parameters: ParamAssignment) -> Self {
        Self {
            number,
            parameters,
            outcome: RwLock::new(Outcome {
                state: TrialState::Running,
                value: None,
                values: None,
                constraint_values: None,
            }),
            intermediates: Mutex::new(BTreeMap::new()),
        }
    }

    /// Rebuild a trial record verbatim. Used by warm starts and study loading.
    pub fn restore(
        number: usize,
        parameters: ParamAssignment,
        state: TrialState,
        value: Option<f64>,
        values: Option<Vec<f64>>,
        constraint_values: Option<Vec<f64>>,
        intermediates: BTreeMap<u64, f64>,
    ) -> Self {
        Self {
            number,
            parameters,
            outcome: RwLock::new(Outcome {
                state,
                value,
                values,
                constraint_values,
            }),
            intermediates: Mutex::new(intermediates),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn parameters(&self) -> &ParamAssignment {
        &self.parameters
    }

    /// Value of a single parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn state(&self) -> TrialState {
        self.outcome.read().state
    }

    /// Scalar objective; present once Complete (first objective for
    /// multi-objective trials).
    pub fn value(&self) -> Option<f64> {
        self.outcome.read().value
    }

    /// Objective vector for multi-objective trials.
    pub fn values(&self) -> Option<Vec<f64>> {
        self.outcome.read().values.clone()
    }

    pub fn constraint_values(&self) -> Option<Vec<f64>> {
        self.outcome.read().constraint_values.clone()
    }

    /// Snapshot of the step -> value map, ordered by step.
    pub fn intermediate_values(&self) -> BTreeMap<u64, f64> {
        self.intermediates.lock().clone()
    }

    /// Most recently reported step, if any.
    pub fn last_step(&self) -> Option<u64> {
        self.intermediates.lock().keys().next_back().copied()
    }

    pub fn intermediate_at(&self, step: u64) -> Option<f64> {
        self.intermediates.lock().get(&step).copied()
    }

    /// Record an intermediate objective at `step`, overwriting any previous
    /// report for the same step. Silently ignored once the trial is terminal.
    pub fn report(&self, step: u64, value: f64) {
        let outcome = self.outcome.read();
        if outcome.state != TrialState::Running {
            return;
        }
        // Insert while holding the state guard so a concurrent tell cannot
        // slip a terminal transition between the check and the append.
        self.intermediates.lock().insert(step, value);
    }

    /// Feasible iff no constraint vector is attached or every coordinate
    /// is <= 0.
    pub fn is_feasible(&self) -> bool {
        match &self.outcome.read().constraint_values {
            None => true,
            Some(values) => values.iter().all(|&v| v <= 0.0),
        }
    }

    /// Sum of positive constraint coordinates; 0 for feasible trials.
    pub fn constraint_violation(&self) -> f64 {
        match &self.outcome.read().constraint_values {
            None => 0.0,
            Some(values) => values.iter().map(|&v| v.max(0.0)).sum(),
        }
    }

    // The remaining mutators implement the study's commit protocol and are
    // called only while the study holds its lock.

    /// Stage the objective(s) without leaving Running. `values` must be
    /// non-empty; the first component doubles as the scalar value.
    pub fn stage_objective(&self, values: &[f64]) {
        let mut outcome = self.outcome.write();
        outcome.value = values.first().copied();
        outcome.values = if values.len() > 1 {
            Some(values.to_vec())
        } else {
            None
        };
    }

    /// Roll back a staged objective after a failed constraint evaluation.
    pub fn clear_objective(&self) {
        let mut outcome = self.outcome.write();
        outcome.value = None;
        outcome.values = None;
    }

    pub fn set_constraint_values(&self, values: Vec<f64>) {
        self.outcome.write().constraint_values = Some(values);
    }

    /// Commit the terminal state.
    pub fn transition(&self, state: TrialState) {
        self.outcome.write().state = state;
    }
}
