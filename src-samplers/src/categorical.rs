//! Categorical estimator: a smoothed frequency model over choice indices.

use rand::Rng;

/// Frequency model over `{0, .., cardinality - 1}` with additive
/// `prior_weight / cardinality` smoothing, so no category ever has zero
/// probability. Log-weights and cumulative weights are precomputed.
#[derive(Debug, Clone)]
pub struct CategoricalEstimator {
    log_weights: Vec<f64>,
    cumulative: Vec<f64>,
}

impl CategoricalEstimator {
    /// Fit from observed choice indices; out-of-range indices are ignored.
    pub fn new(observations: &[usize], cardinality: usize, prior_weight: f64) -> Self {
        let smoothing = prior_weight.max(0.0) / cardinality as f64;
        let mut counts = vec![smoothing; cardinality];
        for &k in observations {
            if k < cardinality {
                counts[k] += 1.0;
            }
        }
        let total: f64 = counts.iter().sum();

        let mut log_weights = Vec::with_capacity(cardinality);
        let mut cumulative = Vec::with_capacity(cardinality);
        let mut acc = 0.0;
        for &c in &counts {
            let w = c / total;
            log_weights.push(w.ln());
            acc += w;
            cumulative.push(acc);
        }
        Self {
            log_weights,
            cumulative,
        }
    }

    pub fn cardinality(&self) -> usize {
        self.log_weights.len()
    }

    /// Inverse-CDF lookup over the cumulative weights.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total = self.cumulative.last().copied().unwrap_or(1.0);
        let u = rng.random::<f64>() * total;
        self.cumulative
            .iter()
            .position(|&c| u < c)
            .unwrap_or(self.cumulative.len() - 1)
    }

    /// Precomputed log-probability of category `index`.
    pub fn log_pdf(&self, index: usize) -> f64 {
        self.log_weights
            .get(index)
            .copied()
            .unwrap_or(f64::NEG_INFINITY)
    }
}
