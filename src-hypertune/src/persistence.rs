//! Study persistence: typed JSON serialization of finished trials.
//!
//! `save` writes the study name, its direction vector and every Complete or
//! Pruned trial; Running and Failed trials are omitted. `load_study`
//! validates the records against a search space and replays the Complete
//! trials through the warm-start import, so a reloaded study continues
//! exactly where its finished history left off.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hypertune_samplers::Sampler;
use hypertune_space::{Direction, ParamAssignment, SearchSpace, Trial, TrialState};

use crate::study::{Study, StudyError};

/// Errors raised while saving or loading a study file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unparsable content, or a file missing the study name, direction
    /// vector or trials array.
    #[error("malformed study file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("parameter '{name}' of trial {number} does not match the search space")]
    ParameterMismatch { number: usize, name: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct StudyRecord {
    name: String,
    directions: Vec<Direction>,
    trials: Vec<TrialRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrialRecord {
    number: usize,
    state: TrialState,
    parameters: ParamAssignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    constraint_values: Option<Vec<f64>>,
    #[serde(default)]
    intermediate_values: Vec<(u64, f64)>,
}

impl TrialRecord {
    fn from_trial(trial: &Trial) -> Self {
        Self {
            number: trial.number(),
            state: trial.state(),
            parameters: trial.parameters().clone(),
            value: trial.value(),
            values: trial.values(),
            constraint_values: trial.constraint_values(),
            intermediate_values: trial.intermediate_values().into_iter().collect(),
        }
    }
}

impl Study {
    /// Write the study metadata and all Complete/Pruned trials to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let record = StudyRecord {
            name: self.name().to_string(),
            directions: self.directions().to_vec(),
            trials: self
                .trials()
                .iter()
                .filter(|t| matches!(t.state(), TrialState::Complete | TrialState::Pruned))
                .map(|t| TrialRecord::from_trial(t))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(path, json)?;
        log::debug!(
            "study '{}': saved {} finished trials",
            record.name,
            record.trials.len()
        );
        Ok(())
    }
}

/// Rebuild a study from `path`, replaying its Complete trials with the
/// provided (possibly different) sampler under the original direction(s).
///
/// Every recorded parameter must name a range of `space` and carry a value
/// that range could have produced; anything else is rejected before a study
/// is constructed.
pub fn load_study(
    path: impl AsRef<Path>,
    space: SearchSpace,
    sampler: Box<dyn Sampler>,
) -> Result<Study, StudyError> {
    let text = fs::read_to_string(path).map_err(PersistenceError::from)?;
    let record: StudyRecord =
        serde_json::from_str(&text).map_err(PersistenceError::from)?;

    for trial in &record.trials {
        for (name, value) in &trial.parameters {
            let matches = space.get(name).is_some_and(|range| range.contains(value));
            if !matches {
                return Err(PersistenceError::ParameterMismatch {
                    number: trial.number,
                    name: name.clone(),
                }
                .into());
            }
        }
    }

    let warm: Vec<Arc<Trial>> = record
        .trials
        .into_iter()
        .filter(|t| t.state == TrialState::Complete)
        .map(|t| {
            Arc::new(Trial::restore(
                t.number,
                t.parameters,
                t.state,
                t.value,
                t.values,
                t.constraint_values,
                t.intermediate_values.into_iter().collect(),
            ))
        })
        .collect();

    Study::builder(record.name, space)
        .directions(record.directions)
        .sampler(sampler)
        .warm_start(warm)
        .build()
}
