//! TPE sampler: Expected-Improvement search over the ratio of two kernel
//! density estimates.
//!
//! Completed trials are split into a small "below" group (the best gamma
//! fraction) and an "above" group holding everything else. Each dimension
//! gets one estimator per group; candidates drawn from the below estimator
//! are scored by `log l(x) - log g(x)` and the argmax wins. Dimensions are
//! sampled independently; parameter correlations are deliberately not
//! modeled, which keeps the method robust on mixed-type spaces.

use std::sync::Arc;

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::Rng;

use hypertune_space::{
    Direction, ParamAssignment, ParamValue, ParameterRange, SearchSpace, Trial, TrialState,
};

use crate::categorical::CategoricalEstimator;
use crate::parzen::ParzenEstimator;
use crate::random::sample_uniform;
use crate::{seeded_rng, Sampler, SamplerError};

/// Configuration for the TPE sampler.
#[derive(Debug, Clone)]
pub struct TpeConfig {
    /// Completed-trial count below which sampling stays uniform.
    pub n_startup_trials: usize,
    /// Candidates drawn per dimension for the EI argmax.
    pub n_ei_candidates: usize,
    /// Weight of the uniform prior component in both estimators.
    pub prior_weight: f64,
    /// Place Running trials in the "above" group so concurrent asks do not
    /// collapse to the same suggestion.
    pub constant_liar: bool,
    /// Floor kernel bandwidths so duplicate observations keep spread.
    pub magic_clip: bool,
    /// Reservoir cap on the "above" group; 0 disables the cap.
    pub max_above_trials: usize,
    pub seed: Option<u64>,
}

impl Default for TpeConfig {
    fn default() -> Self {
        Self {
            n_startup_trials: 10,
            n_ei_candidates: 24,
            prior_weight: 1.0,
            constant_liar: true,
            magic_clip: true,
            max_above_trials: 200,
            seed: None,
        }
    }
}

/// Tree-structured Parzen Estimator sampler.
pub struct TpeSampler {
    config: TpeConfig,
    rng: StdRng,
}

impl TpeSampler {
    pub fn new(config: TpeConfig) -> Result<Self, SamplerError> {
        if config.n_ei_candidates == 0 {
            return Err(SamplerError::ZeroCandidates);
        }
        let rng = seeded_rng(config.seed);
        Ok(Self { config, rng })
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            config: TpeConfig {
                seed: Some(seed),
                ..TpeConfig::default()
            },
            rng: seeded_rng(Some(seed)),
        }
    }
}

impl Default for TpeSampler {
    fn default() -> Self {
        Self {
            config: TpeConfig::default(),
            rng: seeded_rng(None),
        }
    }
}

/// Size of the "below" group for `count` ordered trials.
fn gamma_split(count: usize) -> usize {
    ((0.1 * count as f64).ceil() as usize).min(25)
}

/// Uniform down-sample of `items` to `cap` entries, single reservoir pass.
fn reservoir_downsample<T, R: Rng + ?Sized>(items: &mut Vec<T>, cap: usize, rng: &mut R) {
    for i in cap..items.len() {
        let j = rng.random_range(0..=i);
        if j < cap {
            items.swap(i, j);
        }
    }
    items.truncate(cap);
}

/// Transformed-space bounds of a numeric range (log floats live in log
/// space; ints are treated continuously and rounded on output).
fn numeric_bounds(range: &ParameterRange) -> Option<(f64, f64, bool)> {
    match range {
        ParameterRange::Float { low, high, log, .. } => {
            if *log {
                Some((low.ln(), high.ln(), true))
            } else {
                Some((*low, *high, false))
            }
        }
        ParameterRange::Int { low, high, .. } => Some((*low as f64, *high as f64, false)),
        ParameterRange::Categorical { .. } => None,
    }
}

/// Transformed-space observation of `trial` for the given numeric range.
fn numeric_observation(trial: &Trial, range: &ParameterRange) -> Option<f64> {
    let value = trial.param(range.name())?;
    match range {
        ParameterRange::Float { log, .. } => {
            let v = value.as_float()?;
            Some(if *log { v.ln() } else { v })
        }
        ParameterRange::Int { .. } => value.as_int().map(|v| v as f64),
        ParameterRange::Categorical { .. } => None,
    }
}

impl TpeSampler {
    /// Partition sorted completed trials into (below, above) by feasibility
    /// and the gamma rule.
    fn split<'a>(
        &self,
        sorted: &[&'a Arc<Trial>],
    ) -> (Vec<&'a Arc<Trial>>, Vec<&'a Arc<Trial>>) {
        let feasible: Vec<&Arc<Trial>> =
            sorted.iter().copied().filter(|t| t.is_feasible()).collect();

        if feasible.len() >= self.config.n_startup_trials {
            let gamma = gamma_split(feasible.len());
            let below = feasible[..gamma].to_vec();
            let mut above = feasible[gamma..].to_vec();
            above.extend(sorted.iter().copied().filter(|t| !t.is_feasible()));
            (below, above)
        } else {
            // Too few feasible trials: rank everything by violation sum.
            // The sort is stable, so equal violations keep objective order.
            let mut by_violation = sorted.to_vec();
            by_violation.sort_by_key(|t| OrderedFloat(t.constraint_violation()));
            let gamma = gamma_split(by_violation.len());
            let above = by_violation.split_off(gamma.min(by_violation.len()));
            (by_violation, above)
        }
    }

    fn pick_numeric(
        &mut self,
        range: &ParameterRange,
        below: &[&Arc<Trial>],
        above: &[&Arc<Trial>],
    ) -> ParamValue {
        let (low, high, log) = match numeric_bounds(range) {
            Some(b) => b,
            None => unreachable!("categorical handled separately"),
        };
        let below_obs: Vec<f64> = below
            .iter()
            .filter_map(|t| numeric_observation(t, range))
            .collect();
        let above_obs: Vec<f64> = above
            .iter()
            .filter_map(|t| numeric_observation(t, range))
            .collect();

        let l = ParzenEstimator::new(
            &below_obs,
            low,
            high,
            self.config.prior_weight,
            self.config.magic_clip,
        );
        let g = ParzenEstimator::new(
            &above_obs,
            low,
            high,
            self.config.prior_weight,
            self.config.magic_clip,
        );

        let mut best = f64::NEG_INFINITY;
        let mut chosen = 0.5 * (low + high);
        for _ in 0..self.config.n_ei_candidates {
            let x = l.sample(&mut self.rng);
            let score = l.log_pdf(x) - g.log_pdf(x);
            if score > best || best == f64::NEG_INFINITY {
                best = score;
                chosen = x;
            }
        }

        match range {
            ParameterRange::Float { .. } => {
                ParamValue::Float(if log { chosen.exp() } else { chosen })
            }
            ParameterRange::Int {
                low: ilow,
                high: ihigh,
                step,
                ..
            } => {
                let k_max = (ihigh - ilow) / step;
                let k = (((chosen - *ilow as f64) / *step as f64).round() as i64).clamp(0, k_max);
                ParamValue::Int(ilow + k * step)
            }
            ParameterRange::Categorical { .. } => unreachable!(),
        }
    }

    fn pick_categorical(
        &mut self,
        range: &ParameterRange,
        choices: &[String],
        below: &[&Arc<Trial>],
        above: &[&Arc<Trial>],
    ) -> ParamValue {
        let observe = |group: &[&Arc<Trial>]| -> Vec<usize> {
            group
                .iter()
                .filter_map(|t| {
                    t.param(range.name())
                        .and_then(|v| v.as_str())
                        .and_then(|s| range.choice_index(s))
                })
                .collect()
        };
        let l = CategoricalEstimator::new(&observe(below), choices.len(), self.config.prior_weight);
        let g = CategoricalEstimator::new(&observe(above), choices.len(), self.config.prior_weight);

        let mut best = f64::NEG_INFINITY;
        let mut chosen = 0;
        for _ in 0..self.config.n_ei_candidates {
            let idx = l.sample(&mut self.rng);
            let score = l.log_pdf(idx) - g.log_pdf(idx);
            if score > best || best == f64::NEG_INFINITY {
                best = score;
                chosen = idx;
            }
        }
        ParamValue::Categorical(choices[chosen].clone())
    }
}

impl Sampler for TpeSampler {
    fn sample(
        &mut self,
        trials: &[Arc<Trial>],
        directions: &[Direction],
        space: &SearchSpace,
    ) -> Result<ParamAssignment, SamplerError> {
        let direction = directions.first().copied().unwrap_or(Direction::Minimize);

        let mut completed: Vec<&Arc<Trial>> = trials
            .iter()
            .filter(|t| t.state() == TrialState::Complete && t.value().is_some())
            .collect();
        if completed.len() < self.config.n_startup_trials {
            return Ok(sample_uniform(&mut self.rng, space));
        }

        // Best first under the study's direction.
        completed.sort_by_key(|t| OrderedFloat(direction.orient(t.value().unwrap_or(f64::MAX))));

        let (below, mut above) = self.split(&completed);
        if self.config.constant_liar {
            above.extend(trials.iter().filter(|t| t.state() == TrialState::Running));
        }
        if self.config.max_above_trials > 0 && above.len() > self.config.max_above_trials {
            reservoir_downsample(&mut above, self.config.max_above_trials, &mut self.rng);
        }

        let mut params = ParamAssignment::new();
        for range in space {
            let value = match range {
                ParameterRange::Categorical { choices, .. } => {
                    self.pick_categorical(range, choices, &below, &above)
                }
                _ => self.pick_numeric(range, &below, &above),
            };
            params.insert(range.name().to_string(), value);
        }
        Ok(params)
    }

    fn name(&self) -> &'static str {
        "tpe"
    }
}
