//! Ordered, name-addressable collection of parameter ranges.

use std::collections::HashMap;

use thiserror::Error;

use crate::range::ParameterRange;

/// Errors raised while constructing ranges or search spaces.
#[derive(Debug, Clone, Error)]
pub enum SpaceError {
    #[error("parameter '{0}': low must be strictly below high")]
    EmptyInterval(String),
    #[error("parameter '{0}': log-scaled ranges require low > 0")]
    NonPositiveLogBound(String),
    #[error("parameter '{0}': step must be at least 1")]
    BadStep(String),
    #[error("parameter '{0}': at least one choice is required")]
    NoChoices(String),
    #[error("duplicate parameter name '{0}'")]
    DuplicateName(String),
}

/// The named, typed collection of dimensions being searched.
///
/// Immutable after construction; addressable by name and by position, in the
/// order the ranges were supplied.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    ranges: Vec<ParameterRange>,
    by_name: HashMap<String, usize>,
}

impl SearchSpace {
    /// Build a space from a sequence of ranges, rejecting duplicate names.
    pub fn new(ranges: Vec<ParameterRange>) -> Result<Self, SpaceError> {
        let mut by_name = HashMap::with_capacity(ranges.len());
        for (idx, range) in ranges.iter().enumerate() {
            if by_name.insert(range.name().to_string(), idx).is_some() {
                return Err(SpaceError::DuplicateName(range.name().to_string()));
            }
        }
        Ok(Self { ranges, by_name })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Range with the given name, if any.
    pub fn get(&self, name: &str) -> Option<&ParameterRange> {
        self.by_name.get(name).map(|&idx| &self.ranges[idx])
    }

    /// Range at `index`, in construction order.
    pub fn at(&self, index: usize) -> Option<&ParameterRange> {
        self.ranges.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParameterRange> {
        self.ranges.iter()
    }
}

impl<'a> IntoIterator for &'a SearchSpace {
    type Item = &'a ParameterRange;
    type IntoIter = std::slice::Iter<'a, ParameterRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
