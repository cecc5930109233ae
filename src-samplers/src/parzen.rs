//! Continuous Parzen estimator: truncated-Gaussian mixture plus a uniform
//! prior over the interval.
//!
//! One kernel per observation, bandwidth set from neighbor distances, and a
//! uniform prior component that keeps the density strictly positive on the
//! whole interval so density ratios against a second estimator stay finite.

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::numerics::{log_sum_exp, truncated_normal_log_pdf, truncated_normal_sample};

/// Mixture density over `[low, high]` fitted from a set of observations.
///
/// Observations are taken in transformed space: callers handle log scaling
/// (and integer rounding) outside the estimator.
#[derive(Debug, Clone)]
pub struct ParzenEstimator {
    low: f64,
    high: f64,
    mus: Vec<f64>,
    sigmas: Vec<f64>,
    /// Per-component weights; the last entry is the uniform prior.
    weights: Vec<f64>,
    cumulative: Vec<f64>,
}

impl ParzenEstimator {
    /// Fit the mixture.
    ///
    /// Bandwidths are the larger of the distances to the two neighbors
    /// (interval edges stand in at the ends); a single observation spans the
    /// whole interval. With `magic_clip`, every bandwidth is floored at
    /// `(high - low) / min(100, 1 + n)` so duplicate observations cannot
    /// collapse a kernel.
    pub fn new(
        observations: &[f64],
        low: f64,
        high: f64,
        prior_weight: f64,
        magic_clip: bool,
    ) -> Self {
        let mut mus: Vec<f64> = observations.to_vec();
        mus.sort_by_key(|&m| OrderedFloat(m));
        let n = mus.len();

        let mut sigmas = Vec::with_capacity(n);
        for i in 0..n {
            let mut sigma = if n == 1 {
                high - low
            } else {
                let left = if i == 0 { low } else { mus[i - 1] };
                let right = if i + 1 == n { high } else { mus[i + 1] };
                (mus[i] - left).max(right - mus[i])
            };
            if magic_clip {
                sigma = sigma.max((high - low) / 100.0_f64.min(1.0 + n as f64));
            }
            sigmas.push(sigma.max(1e-12));
        }

        let prior_weight = prior_weight.max(0.0);
        let total = n as f64 + prior_weight;
        let weights = if total > 0.0 {
            let mut w = vec![1.0 / total; n];
            w.push(prior_weight / total);
            w
        } else {
            // No observations and no prior mass: degenerate to pure uniform.
            vec![1.0]
        };

        let mut cumulative = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        for &w in &weights {
            acc += w;
            cumulative.push(acc);
        }

        Self {
            low,
            high,
            mus,
            sigmas,
            weights,
            cumulative,
        }
    }

    /// Number of observation kernels (excluding the prior component).
    pub fn n_observations(&self) -> usize {
        self.mus.len()
    }

    /// One draw: pick a component by cumulative weight, then sample it.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let total = self.cumulative.last().copied().unwrap_or(1.0);
        let u = rng.random::<f64>() * total;
        let idx = self
            .cumulative
            .iter()
            .position(|&c| u < c)
            .unwrap_or(self.cumulative.len() - 1);
        if idx < self.mus.len() {
            truncated_normal_sample(rng, self.mus[idx], self.sigmas[idx], self.low, self.high)
        } else {
            self.low + rng.random::<f64>() * (self.high - self.low)
        }
    }

    /// Draw `count` samples.
    pub fn sample_many<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.sample(rng)).collect()
    }

    /// Mixture log-density at `x`; negative infinity outside the interval,
    /// finite everywhere inside whenever the prior weight is positive.
    pub fn log_pdf(&self, x: f64) -> f64 {
        if x < self.low || x > self.high {
            return f64::NEG_INFINITY;
        }
        let mut terms = Vec::with_capacity(self.mus.len() + 1);
        for i in 0..self.mus.len() {
            terms.push(
                self.weights[i].ln()
                    + truncated_normal_log_pdf(x, self.mus[i], self.sigmas[i], self.low, self.high),
            );
        }
        let prior = self.weights[self.mus.len()];
        if prior > 0.0 {
            terms.push(prior.ln() - (self.high - self.low).ln());
        }
        log_sum_exp(&terms)
    }
}
