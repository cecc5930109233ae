//! Search-space and trial primitives for the hypertune workspace
//!
//! This crate holds the base types every other workspace member builds on:
//! parameter ranges and their concrete values, the ordered search space, the
//! trial record with its lifecycle, and the optimization direction. It is
//! re-exported from the main `hypertune` crate to ensure type compatibility
//! across samplers, pruners and the study coordinator.

use serde::{Deserialize, Serialize};

pub mod range;
pub mod space;
pub mod trial;

// Re-export commonly used items
pub use range::{ParamValue, ParameterRange};
pub use space::{SearchSpace, SpaceError};
pub use trial::{ParamAssignment, Trial, TrialState};

/// Optimization direction for a single objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Minimize,
    Maximize,
}

impl Direction {
    /// Orient `value` so that smaller always means better.
    ///
    /// Best-trial selection and the pruners compare oriented values only, so
    /// a maximizing study never needs special-casing downstream.
    pub fn orient(self, value: f64) -> f64 {
        match self {
            Direction::Minimize => value,
            Direction::Maximize => -value,
        }
    }

    /// Worst representable objective under this direction.
    pub fn worst(self) -> f64 {
        match self {
            Direction::Minimize => f64::INFINITY,
            Direction::Maximize => f64::NEG_INFINITY,
        }
    }
}
