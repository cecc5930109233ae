//! Numerics primitives for the density estimators and CMA-ES.
//!
//! Truncated-normal machinery, log-sum-exp and the symmetric
//! eigendecomposition. Everything except the eigendecomposition is on the
//! sampling hot path and stays allocation-free.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;
use statrs::function::erf::{erf, erf_inv};

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Standard normal inverse CDF. `p` must lie in (0, 1).
pub fn normal_inverse_cdf(p: f64) -> f64 {
    std::f64::consts::SQRT_2 * erf_inv(2.0 * p - 1.0)
}

/// Standard normal log-density.
pub fn normal_log_pdf(z: f64) -> f64 {
    -0.5 * z * z - LN_SQRT_2PI
}

/// One standard-normal draw.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(StandardNormal)
}

/// Log-density at `x` of a normal(mu, sigma) truncated to `[low, high]`.
///
/// The normalizer is clamped away from zero so components far outside the
/// interval yield a large-but-finite log instead of NaN.
pub fn truncated_normal_log_pdf(x: f64, mu: f64, sigma: f64, low: f64, high: f64) -> f64 {
    if x < low || x > high {
        return f64::NEG_INFINITY;
    }
    let z = (x - mu) / sigma;
    let normalizer =
        (normal_cdf((high - mu) / sigma) - normal_cdf((low - mu) / sigma)).max(f64::EPSILON);
    normal_log_pdf(z) - sigma.ln() - normalizer.ln()
}

/// Inverse-CDF draw from a normal(mu, sigma) truncated to `[low, high]`.
///
/// Falls back to the interval midpoint when the CDF mass on the interval is
/// numerically zero.
pub fn truncated_normal_sample<R: Rng + ?Sized>(
    rng: &mut R,
    mu: f64,
    sigma: f64,
    low: f64,
    high: f64,
) -> f64 {
    let cdf_low = normal_cdf((low - mu) / sigma);
    let cdf_high = normal_cdf((high - mu) / sigma);
    let span = cdf_high - cdf_low;
    if span <= 0.0 {
        return 0.5 * (low + high);
    }
    let u: f64 = rng.random();
    let p = (cdf_low + u * span).clamp(1e-15, 1.0 - 1e-15);
    (mu + sigma * normal_inverse_cdf(p)).clamp(low, high)
}

/// Log of the sum of exponentials of `values`; negative infinity for an
/// all-negative-infinity (or empty) slice.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns `(vectors, values)` with orthonormal eigenvectors in the columns
/// of `vectors`, ordered to match `values`. Only the symmetric part of the
/// input matters; CMA-ES symmetrizes its covariance before calling in.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> (Array2<f64>, Array1<f64>) {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    for i in 0..n {
        for j in (i + 1)..n {
            let m = 0.5 * (a[(i, j)] + a[(j, i)]);
            a[(i, j)] = m;
            a[(j, i)] = m;
        }
    }
    let mut v = Array2::eye(n);

    let frobenius = a.iter().map(|x| x * x).sum::<f64>().sqrt().max(1e-300);
    for _sweep in 0..64 {
        let mut off = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                off += a[(i, j)] * a[(i, j)];
            }
        }
        if off.sqrt() <= 1e-14 * frobenius {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[(p, q)];
                if apq.abs() <= 1e-300 {
                    continue;
                }
                // Rotation angle choosing the smaller-magnitude tangent root.
                let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                let app = a[(p, p)];
                let aqq = a[(q, q)];
                a[(p, p)] = c * c * app - 2.0 * s * c * apq + s * s * aqq;
                a[(q, q)] = s * s * app + 2.0 * s * c * apq + c * c * aqq;
                a[(p, q)] = 0.0;
                a[(q, p)] = 0.0;
                for k in 0..n {
                    if k == p || k == q {
                        continue;
                    }
                    let akp = a[(k, p)];
                    let akq = a[(k, q)];
                    a[(k, p)] = c * akp - s * akq;
                    a[(p, k)] = a[(k, p)];
                    a[(k, q)] = s * akp + c * akq;
                    a[(q, k)] = a[(k, q)];
                }
                for k in 0..n {
                    let vkp = v[(k, p)];
                    let vkq = v[(k, q)];
                    v[(k, p)] = c * vkp - s * vkq;
                    v[(k, q)] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = Array1::from_iter((0..n).map(|i| a[(i, i)]));
    (v, values)
}
