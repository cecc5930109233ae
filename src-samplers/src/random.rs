//! Uniform random sampler over each range variant.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use hypertune_space::{
    Direction, ParamAssignment, ParamValue, ParameterRange, SearchSpace, Trial,
};

use crate::{seeded_rng, Sampler, SamplerError};

/// Draw one uniform assignment over the whole space.
///
/// Shared by [`RandomSampler`], TPE's startup phase and CMA-ES's categorical
/// coordinates, so a fixed seed yields the same startup stream everywhere.
pub fn sample_uniform<R: Rng + ?Sized>(rng: &mut R, space: &SearchSpace) -> ParamAssignment {
    let mut params = ParamAssignment::new();
    for range in space {
        let value = match range {
            ParameterRange::Float {
                low, high, log, ..
            } => {
                if *log {
                    let (lo, hi) = (low.ln(), high.ln());
                    ParamValue::Float((lo + rng.random::<f64>() * (hi - lo)).exp())
                } else {
                    ParamValue::Float(low + rng.random::<f64>() * (high - low))
                }
            }
            ParameterRange::Int {
                low, high, step, ..
            } => {
                let k = (high - low) / step;
                ParamValue::Int(low + rng.random_range(0..=k) * step)
            }
            ParameterRange::Categorical { choices, .. } => {
                ParamValue::Categorical(choices[rng.random_range(0..choices.len())].clone())
            }
        };
        params.insert(range.name().to_string(), value);
    }
    params
}

/// Sampler that ignores history and direction entirely.
#[derive(Debug)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seeded_rng(seed),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(Some(seed))
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Sampler for RandomSampler {
    fn sample(
        &mut self,
        _trials: &[Arc<Trial>],
        _directions: &[Direction],
        space: &SearchSpace,
    ) -> Result<ParamAssignment, SamplerError> {
        Ok(sample_uniform(&mut self.rng, space))
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
