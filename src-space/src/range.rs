//! Parameter range variants and the concrete values they produce.

use serde::{Deserialize, Serialize};

use crate::space::SpaceError;

/// A concrete value drawn from one [`ParameterRange`] variant.
///
/// The serialized form is self-describing (`{"type": "float", "value": 0.1}`)
/// so saved studies can be decoded against their search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Categorical(String),
}

impl ParamValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Categorical(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Numeric view: floats as-is, ints widened. Categoricals have none.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Categorical(_) => None,
        }
    }
}

/// One named dimension of a search space.
///
/// Exactly three variants exist; every variant carries the unique name used
/// as the key inside trials.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterRange {
    /// Real-valued interval `[low, high]`, optionally sampled on a log scale.
    Float {
        name: String,
        low: f64,
        high: f64,
        log: bool,
    },
    /// Integer interval `[low, high]` stepped by `step >= 1`. Generated
    /// values are `low + k * step` clamped into the interval.
    Int {
        name: String,
        low: i64,
        high: i64,
        step: i64,
    },
    /// Ordered list of choices; equality is by value.
    Categorical { name: String, choices: Vec<String> },
}

impl ParameterRange {
    /// Uniform float range. Requires `low < high`.
    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Result<Self, SpaceError> {
        let name = name.into();
        if !(low < high) {
            return Err(SpaceError::EmptyInterval(name));
        }
        Ok(ParameterRange::Float {
            name,
            low,
            high,
            log: false,
        })
    }

    /// Log-scaled float range. Requires `0 < low < high`.
    pub fn log_float(name: impl Into<String>, low: f64, high: f64) -> Result<Self, SpaceError> {
        let name = name.into();
        if low <= 0.0 {
            return Err(SpaceError::NonPositiveLogBound(name));
        }
        if !(low < high) {
            return Err(SpaceError::EmptyInterval(name));
        }
        Ok(ParameterRange::Float {
            name,
            low,
            high,
            log: true,
        })
    }

    /// Stepped integer range. Requires `low <= high` and `step >= 1`.
    pub fn int(name: impl Into<String>, low: i64, high: i64, step: i64) -> Result<Self, SpaceError> {
        let name = name.into();
        if low > high {
            return Err(SpaceError::EmptyInterval(name));
        }
        if step < 1 {
            return Err(SpaceError::BadStep(name));
        }
        Ok(ParameterRange::Int {
            name,
            low,
            high,
            step,
        })
    }

    /// Categorical range over at least one choice.
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        choices: impl IntoIterator<Item = S>,
    ) -> Result<Self, SpaceError> {
        let name = name.into();
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        if choices.is_empty() {
            return Err(SpaceError::NoChoices(name));
        }
        Ok(ParameterRange::Categorical { name, choices })
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterRange::Float { name, .. }
            | ParameterRange::Int { name, .. }
            | ParameterRange::Categorical { name, .. } => name,
        }
    }

    /// True when `value` is a legal draw from this range: right variant,
    /// inside the interval, aligned to the step, or one of the choices.
    pub fn contains(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (ParameterRange::Float { low, high, .. }, ParamValue::Float(v)) => {
                *low <= *v && *v <= *high
            }
            (
                ParameterRange::Int {
                    low, high, step, ..
                },
                ParamValue::Int(v),
            ) => *low <= *v && *v <= *high && (*v - *low) % *step == 0,
            (ParameterRange::Categorical { choices, .. }, ParamValue::Categorical(v)) => {
                choices.iter().any(|c| c == v)
            }
            _ => false,
        }
    }

    /// Position of `label` among the choices of a categorical range.
    pub fn choice_index(&self, label: &str) -> Option<usize> {
        match self {
            ParameterRange::Categorical { choices, .. } => {
                choices.iter().position(|c| c == label)
            }
            _ => None,
        }
    }
}
