//! CMA-ES sampler: covariance matrix adaptation over the continuous
//! coordinates of the search space.
//!
//! Standard (mu/mu_w, lambda)-CMA-ES after Hansen & Ostermeier: a population
//! of lambda candidates is drawn from `N(m, sigma^2 C)`, and once every
//! member of a generation has been told, the mean, both evolution paths, the
//! covariance and the step size are updated from the mu best members.
//!
//! Only continuous coordinates are adapted. Log floats are handled in log
//! space, ints are rounded to their step at emit time, and categoricals are
//! drawn uniformly on every ask. Failed and pruned generation members count
//! as worst-possible fitness in their slot.
//!
//! The batched population map and the rank-mu accumulation are delegated to
//! the `hypertune-hal` compute backend; the eigendecomposition always runs
//! in-process.

use std::sync::Arc;

use ndarray::{Array1, Array2};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::Rng;

use hypertune_hal::{create_backend, Backend, ComputeBackend, CpuBackend};
use hypertune_space::{
    Direction, ParamAssignment, ParamValue, ParameterRange, SearchSpace, Trial, TrialState,
};

use crate::numerics::{standard_normal, symmetric_eigen};
use crate::{seeded_rng, Sampler, SamplerError};

/// Configuration for the CMA-ES sampler.
#[derive(Debug, Clone)]
pub struct CmaesConfig {
    /// Population size lambda; defaults to `4 + floor(3 ln n)`.
    pub population_size: Option<usize>,
    /// Initial step size as a fraction of the mean parameter range.
    pub initial_sigma: f64,
    pub seed: Option<u64>,
    /// Where the batched population/rank-mu algebra runs.
    pub backend: Backend,
}

impl Default for CmaesConfig {
    fn default() -> Self {
        Self {
            population_size: None,
            initial_sigma: 0.3,
            seed: None,
            backend: Backend::Cpu,
        }
    }
}

/// Telemetry snapshot recorded after each covariance update.
#[derive(Debug, Clone, Copy)]
pub struct CmaesMetrics {
    pub generation: usize,
    pub sigma: f64,
    /// `max(D) / min(D)` over the refreshed eigendecomposition.
    pub condition_number: f64,
    /// Best objective of the closed generation, in the study's direction.
    pub best_fitness: f64,
    /// Members of the closed generation that finished Complete.
    pub completed_trials: usize,
}

#[derive(Debug, Clone)]
enum DimKind {
    Float { log: bool },
    Int { low: i64, high: i64, step: i64 },
}

/// One adapted coordinate, with transformed-space bounds.
#[derive(Debug, Clone)]
struct ContinuousDim {
    name: String,
    low: f64,
    high: f64,
    kind: DimKind,
}

struct GenerationMember {
    number: usize,
    x: Array1<f64>,
}

struct CmaesState {
    dims: Vec<ContinuousDim>,
    n: usize,
    lambda: usize,
    mu: usize,
    weights: Array1<f64>,
    mu_eff: f64,
    c_c: f64,
    c_sigma: f64,
    c_1: f64,
    c_mu: f64,
    d_sigma: f64,
    chi_n: f64,

    mean: Array1<f64>,
    cov: Array2<f64>,
    sigma: f64,
    p_c: Array1<f64>,
    p_sigma: Array1<f64>,
    /// `(B, D)` with `D` the square roots of the eigenvalues; `None` marks
    /// the cache dirty after every covariance mutation.
    eigen: Option<(Array2<f64>, Array1<f64>)>,
    generation: usize,

    /// Candidate buffer in transformed space, and the issue cursor.
    population: Vec<Array1<f64>>,
    next_candidate: usize,
    /// The lambda trials belonging to the open generation.
    members: Vec<GenerationMember>,
    metrics: Option<CmaesMetrics>,
}

/// CMA-ES sampler. Construction fails only for an unavailable backend; the
/// no-continuous-dimension error surfaces on the first ask, before any trial
/// number is allocated.
pub struct CmaesSampler {
    config: CmaesConfig,
    rng: StdRng,
    backend: Box<dyn ComputeBackend>,
    state: Option<CmaesState>,
}

impl CmaesSampler {
    pub fn new(config: CmaesConfig) -> Result<Self, SamplerError> {
        let backend = create_backend(config.backend)?;
        let rng = seeded_rng(config.seed);
        Ok(Self {
            config,
            rng,
            backend,
            state: None,
        })
    }

    /// Seeded sampler on the default CPU backend.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            config: CmaesConfig {
                seed: Some(seed),
                ..CmaesConfig::default()
            },
            rng: seeded_rng(Some(seed)),
            backend: Box::new(CpuBackend::new()),
            state: None,
        }
    }

    /// Telemetry from the most recent update, if any generation closed yet.
    pub fn metrics(&self) -> Option<CmaesMetrics> {
        self.state.as_ref().and_then(|s| s.metrics)
    }

    fn init_state(config: &CmaesConfig, space: &SearchSpace) -> Result<CmaesState, SamplerError> {
        let mut dims = Vec::new();
        for range in space {
            match range {
                ParameterRange::Float {
                    name, low, high, log,
                } => {
                    let (lo, hi) = if *log {
                        (low.ln(), high.ln())
                    } else {
                        (*low, *high)
                    };
                    dims.push(ContinuousDim {
                        name: name.clone(),
                        low: lo,
                        high: hi,
                        kind: DimKind::Float { log: *log },
                    });
                }
                ParameterRange::Int {
                    name,
                    low,
                    high,
                    step,
                } => dims.push(ContinuousDim {
                    name: name.clone(),
                    low: *low as f64,
                    high: *high as f64,
                    kind: DimKind::Int {
                        low: *low,
                        high: *high,
                        step: *step,
                    },
                }),
                ParameterRange::Categorical { .. } => {}
            }
        }
        if dims.is_empty() {
            return Err(SamplerError::NoContinuousParameters);
        }

        let n = dims.len();
        let nf = n as f64;
        let lambda = config
            .population_size
            .unwrap_or(4 + (3.0 * nf.ln()).floor() as usize)
            .max(2);
        let mu = lambda / 2;

        // Recombination weights log(mu + 1/2) - log(i), normalized.
        let mut weights = Array1::from_iter(
            (1..=mu).map(|i| (mu as f64 + 0.5).ln() - (i as f64).ln()),
        );
        let sum = weights.sum();
        weights.mapv_inplace(|w| w / sum);
        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let c_c = (4.0 + mu_eff / nf) / (nf + 4.0 + 2.0 * mu_eff / nf);
        let c_sigma = (mu_eff + 2.0) / (nf + mu_eff + 5.0);
        let c_1 = 2.0 / ((nf + 1.3).powi(2) + mu_eff);
        let c_mu =
            (1.0 - c_1).min(2.0 * (mu_eff - 2.0 + 1.0 / mu_eff) / ((nf + 2.0).powi(2) + mu_eff));
        let d_sigma =
            1.0 + 2.0 * (((mu_eff - 1.0) / (nf + 1.0)).sqrt() - 1.0).max(0.0) + c_sigma;
        let chi_n = nf.sqrt() * (1.0 - 1.0 / (4.0 * nf) + 1.0 / (21.0 * nf * nf));

        let mean = Array1::from_iter(dims.iter().map(|d| 0.5 * (d.low + d.high)));
        let avg_range = dims.iter().map(|d| d.high - d.low).sum::<f64>() / nf;
        let sigma = config.initial_sigma * avg_range;

        Ok(CmaesState {
            dims,
            n,
            lambda,
            mu,
            weights,
            mu_eff,
            c_c,
            c_sigma,
            c_1,
            c_mu,
            d_sigma,
            chi_n,
            mean,
            cov: Array2::eye(n),
            sigma,
            p_c: Array1::zeros(n),
            p_sigma: Array1::zeros(n),
            eigen: None,
            generation: 0,
            population: Vec::new(),
            next_candidate: 0,
            members: Vec::new(),
            metrics: None,
        })
    }

    /// Refresh `(B, D)` when the covariance changed: symmetrize, diagonalize
    /// and floor each eigenvalue at 1e-20 before the square root.
    fn ensure_eigen(state: &mut CmaesState) {
        if state.eigen.is_some() {
            return;
        }
        let n = state.n;
        for i in 0..n {
            for j in (i + 1)..n {
                let m = 0.5 * (state.cov[(i, j)] + state.cov[(j, i)]);
                state.cov[(i, j)] = m;
                state.cov[(j, i)] = m;
            }
        }
        let (b, mut vals) = symmetric_eigen(&state.cov);
        vals.mapv_inplace(|v| v.max(1e-20).sqrt());
        state.eigen = Some((b, vals));
    }

    /// Draw a fresh population of lambda candidates from `N(m, sigma^2 C)`
    /// and reflect every coordinate into its bounds.
    fn generate_population(
        state: &mut CmaesState,
        rng: &mut StdRng,
        backend: &mut dyn ComputeBackend,
    ) -> Result<(), SamplerError> {
        Self::ensure_eigen(state);
        let (b, d) = state.eigen.as_ref().expect("unreachable");
        let n = state.n;
        let lambda = state.lambda;

        let mut bd = Array2::zeros((n, n));
        for j in 0..n {
            for i in 0..n {
                bd[(i, j)] = b[(i, j)] * d[j];
            }
        }
        let mut z = Array2::zeros((lambda, n));
        for v in z.iter_mut() {
            *v = standard_normal(rng);
        }
        let mut out = Array2::zeros((lambda, n));
        backend.sample_population(&bd, &z, &state.mean, state.sigma, &mut out)?;

        state.population.clear();
        for row in out.rows() {
            let mut x = row.to_owned();
            for (xi, dim) in x.iter_mut().zip(&state.dims) {
                *xi = reflect_into(*xi, dim.low, dim.high);
            }
            state.population.push(x);
        }
        state.next_candidate = 0;
        Ok(())
    }

    /// True when every member of the open generation is terminal.
    fn generation_closed(state: &CmaesState, trials: &[Arc<Trial>]) -> bool {
        state.members.iter().all(|m| {
            trials
                .get(m.number)
                .map(|t| t.state().is_terminal())
                .unwrap_or(false)
        })
    }

    /// Full strategy update from a closed generation.
    fn update(
        state: &mut CmaesState,
        backend: &mut dyn ComputeBackend,
        direction: Direction,
        trials: &[Arc<Trial>],
    ) -> Result<(), SamplerError> {
        let n = state.n;
        let mu = state.mu;

        // Oriented fitness per member; Fail and Pruned take the worst slot.
        let mut order: Vec<(f64, usize)> = state
            .members
            .iter()
            .enumerate()
            .map(|(idx, member)| {
                let fitness = trials
                    .get(member.number)
                    .filter(|t| t.state() == TrialState::Complete)
                    .and_then(|t| t.value())
                    .map(|v| direction.orient(v))
                    .unwrap_or(f64::INFINITY);
                (fitness, idx)
            })
            .collect();
        order.sort_by_key(|(fitness, _)| OrderedFloat(*fitness));

        let old_mean = state.mean.clone();
        let mut new_mean = Array1::<f64>::zeros(n);
        for (i, (_, idx)) in order.iter().take(mu).enumerate() {
            new_mean.scaled_add(state.weights[i], &state.members[*idx].x);
        }

        // C^{-1/2} (m' - m) / sigma via the cached eigendecomposition.
        Self::ensure_eigen(state);
        let (b, d) = state.eigen.as_ref().expect("unreachable");
        let delta = (&new_mean - &old_mean).mapv(|v| v / state.sigma);
        let mut bt_delta = b.t().dot(&delta);
        for (v, di) in bt_delta.iter_mut().zip(d.iter()) {
            *v /= di;
        }
        let c_inv_sqrt_delta = b.dot(&bt_delta);

        // Step-size path.
        let cs = state.c_sigma;
        state.p_sigma.mapv_inplace(|v| v * (1.0 - cs));
        state
            .p_sigma
            .scaled_add((cs * (2.0 - cs) * state.mu_eff).sqrt(), &c_inv_sqrt_delta);
        let p_sigma_norm = state.p_sigma.dot(&state.p_sigma).sqrt();

        // Heaviside stall indicator.
        let nf = n as f64;
        let decay = 1.0 - (1.0 - cs).powf(2.0 * (state.generation as f64 + 1.0));
        let h_sigma = if p_sigma_norm
            < (1.4 + 2.0 / (nf + 1.0)) * state.chi_n * decay.max(0.0).sqrt()
        {
            1.0
        } else {
            0.0
        };

        // Covariance path.
        let cc = state.c_c;
        state.p_c.mapv_inplace(|v| v * (1.0 - cc));
        state
            .p_c
            .scaled_add(h_sigma * (cc * (2.0 - cc) * state.mu_eff).sqrt(), &delta);

        // Rank-one and rank-mu terms.
        let mut artmp = Array2::zeros((mu, n));
        for (i, (_, idx)) in order.iter().take(mu).enumerate() {
            let x = &state.members[*idx].x;
            for j in 0..n {
                artmp[(i, j)] = (x[j] - old_mean[j]) / state.sigma;
            }
        }
        let mut rank_mu = Array2::zeros((n, n));
        backend.rank_mu(&artmp, &state.weights, &mut rank_mu)?;

        let correction = (1.0 - h_sigma) * cc * (2.0 - cc);
        let (c_1, c_mu) = (state.c_1, state.c_mu);
        for i in 0..n {
            for j in 0..n {
                let rank_one = state.p_c[i] * state.p_c[j];
                state.cov[(i, j)] = (1.0 - c_1 - c_mu) * state.cov[(i, j)]
                    + c_1 * (rank_one + correction * state.cov[(i, j)])
                    + c_mu * rank_mu[(i, j)];
            }
        }

        state.sigma = (state.sigma
            * ((cs / state.d_sigma) * (p_sigma_norm / state.chi_n - 1.0)).exp())
        .clamp(1e-20, 1e10);

        state.eigen = None;
        state.mean = new_mean;
        state.generation += 1;

        // Telemetry over the generation that just closed.
        let completed = state
            .members
            .iter()
            .filter(|m| {
                trials
                    .get(m.number)
                    .map(|t| t.state() == TrialState::Complete)
                    .unwrap_or(false)
            })
            .count();
        let best_fitness = direction.orient(order[0].0);
        Self::ensure_eigen(state);
        let (_, d) = state.eigen.as_ref().expect("unreachable");
        let d_max = d.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let d_min = d.iter().copied().fold(f64::INFINITY, f64::min);
        let metrics = CmaesMetrics {
            generation: state.generation,
            sigma: state.sigma,
            condition_number: d_max / d_min,
            best_fitness,
            completed_trials: completed,
        };
        log::debug!(
            "cma-es update: generation={} sigma={:.3e} condition={:.3e} best={:.6e} completed={}",
            metrics.generation,
            metrics.sigma,
            metrics.condition_number,
            metrics.best_fitness,
            metrics.completed_trials
        );
        state.metrics = Some(metrics);

        state.members.clear();
        state.population.clear();
        state.next_candidate = 0;
        Ok(())
    }

    /// Turn a transformed-space vector into a parameter assignment,
    /// drawing categorical coordinates uniformly.
    fn emit(
        state: &CmaesState,
        rng: &mut StdRng,
        space: &SearchSpace,
        x: &Array1<f64>,
    ) -> ParamAssignment {
        let mut params = ParamAssignment::new();
        let mut ci = 0;
        for range in space {
            match range {
                ParameterRange::Categorical { name, choices } => {
                    let pick = rng.random_range(0..choices.len());
                    params.insert(name.clone(), ParamValue::Categorical(choices[pick].clone()));
                }
                _ => {
                    let dim = &state.dims[ci];
                    let v = x[ci];
                    ci += 1;
                    let value = match dim.kind {
                        DimKind::Float { log } => {
                            ParamValue::Float(if log { v.exp() } else { v })
                        }
                        DimKind::Int { low, high, step } => {
                            let k_max = (high - low) / step;
                            let k = (((v - low as f64) / step as f64).round() as i64)
                                .clamp(0, k_max);
                            ParamValue::Int(low + k * step)
                        }
                    };
                    params.insert(dim.name.clone(), value);
                }
            }
        }
        params
    }
}

/// Mirror `x` into `[low, high]`; hard clamp after ten reflections.
///
/// Reflection preserves the density shape near the boundary, unlike
/// clipping, which piles mass onto the bound itself.
fn reflect_into(mut x: f64, low: f64, high: f64) -> f64 {
    for _ in 0..10 {
        if x < low {
            x = low + (low - x);
        } else if x > high {
            x = high - (x - high);
        } else {
            return x;
        }
    }
    x.clamp(low, high)
}

impl Sampler for CmaesSampler {
    fn sample(
        &mut self,
        trials: &[Arc<Trial>],
        directions: &[Direction],
        space: &SearchSpace,
    ) -> Result<ParamAssignment, SamplerError> {
        let direction = directions.first().copied().unwrap_or(Direction::Minimize);

        if self.state.is_none() {
            self.state = Some(Self::init_state(&self.config, space)?);
        }
        let Self {
            rng,
            backend,
            state,
            ..
        } = self;
        let state = state.as_mut().expect("unreachable");

        // Close the previous generation once every member has been told.
        if state.members.len() == state.lambda && Self::generation_closed(state, trials) {
            Self::update(state, backend.as_mut(), direction, trials)?;
        }
        if state.next_candidate >= state.population.len() {
            // Either a fresh generation, or extra draws from the current
            // distribution while the open generation waits on tells.
            Self::generate_population(state, rng, backend.as_mut())?;
        }

        let x = state.population[state.next_candidate].clone();
        state.next_candidate += 1;
        if state.members.len() < state.lambda {
            state.members.push(GenerationMember {
                number: trials.len(),
                x: x.clone(),
            });
        }
        Ok(Self::emit(state, rng, space, &x))
    }

    fn dispose(&mut self) {
        self.backend.dispose();
    }

    fn name(&self) -> &'static str {
        "cmaes"
    }
}
