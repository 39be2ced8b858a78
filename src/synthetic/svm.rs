//! Binary RBF support vector machine trained with SMO
//!
//! Only what SVM-SMOTE needs: which rows end up as support vectors, plus a
//! decision function for checking the fit.

use crate::error::{ResampleError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Largest sample count whose full kernel matrix is built;
/// bigger inputs are rejected with a computation error.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// RBF width; `None` uses 1 / (n_features * var(X))
    pub gamma: Option<f64>,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of passes over the data
    pub max_iter: usize,
    /// Random seed for the second-multiplier choice
    pub random_state: u64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            tol: 1e-3,
            max_iter: 1000,
            random_state: 42,
        }
    }
}

/// Fitted binary SVM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinarySvm {
    support_indices: Vec<usize>,
    support_vectors: Array2<f64>,
    /// alpha_i * y_i for each support vector
    dual_coef: Array1<f64>,
    bias: f64,
    gamma: f64,
}

impl BinarySvm {
    /// Fit on `x` with labels in {-1, +1}
    pub fn fit(config: &SvmConfig, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(ResampleError::InvalidParameter {
                name: "n_samples".to_string(),
                value: n.to_string(),
                reason: format!(
                    "exceeds the maximum {} for the SVM kernel matrix; subsample first",
                    MAX_KERNEL_MATRIX_SAMPLES
                ),
            });
        }
        if y.iter().any(|&v| v != 1.0 && v != -1.0) {
            return Err(ResampleError::ValidationError(
                "SVM labels must be -1 or +1".to_string(),
            ));
        }

        let gamma = config.gamma.unwrap_or_else(|| scale_gamma(x));
        let kernel_matrix = compute_kernel_matrix(x, gamma);
        let (alphas, bias) = smo_train(config, &kernel_matrix, y);

        // Nonzero multipliers mark the support vectors
        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        let support_vectors = x.select(ndarray::Axis(0), &support_indices);
        let dual_coef = support_indices.iter().map(|&i| alphas[i] * y[i]).collect();

        Ok(Self {
            support_indices,
            support_vectors,
            dual_coef,
            bias,
            gamma,
        })
    }

    /// Training rows that became support vectors, ascending
    pub fn support_indices(&self) -> &[usize] {
        &self.support_indices
    }

    /// Signed distance-like score; positive means the +1 class
    pub fn decision_function(&self, x: &Array2<f64>) -> Array1<f64> {
        x.rows()
            .into_iter()
            .map(|row| {
                self.support_vectors
                    .rows()
                    .into_iter()
                    .zip(self.dual_coef.iter())
                    .map(|(sv, &coef)| coef * rbf(row, sv, self.gamma))
                    .sum::<f64>()
                    + self.bias
            })
            .collect()
    }
}

fn rbf(a: ArrayView1<f64>, b: ArrayView1<f64>, gamma: f64) -> f64 {
    let norm_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
    (-gamma * norm_sq).exp()
}

/// 1 / (n_features * variance of all feature values)
fn scale_gamma(x: &Array2<f64>) -> f64 {
    let n = x.len() as f64;
    let mean = x.sum() / n;
    let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if var > 0.0 {
        1.0 / (x.ncols() as f64 * var)
    } else {
        1.0
    }
}

/// Full RBF kernel matrix, rows computed in parallel once `n` reaches 100
fn compute_kernel_matrix(x: &Array2<f64>, gamma: f64) -> Array2<f64> {
    let n = x.nrows();

    // Thread overhead dominates below 100 rows
    if n < 100 {
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let val = rbf(x.row(i), x.row(j), gamma);
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        return k;
    }

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| (i..n).map(|j| rbf(x.row(i), x.row(j), gamma)).collect())
        .collect();

    let mut k = Array2::zeros((n, n));
    for (i, row_vals) in rows.into_iter().enumerate() {
        for (offset, val) in row_vals.into_iter().enumerate() {
            k[[i, i + offset]] = val;
            k[[i + offset, i]] = val;
        }
    }
    k
}

/// Decision value of training row `idx` from the cached kernel
fn decision_cached(k: &Array2<f64>, alphas: &Array1<f64>, y: &Array1<f64>, bias: f64, idx: usize) -> f64 {
    let mut sum = 0.0;
    for i in 0..alphas.len() {
        if alphas[i] != 0.0 {
            sum += alphas[i] * y[i] * k[[i, idx]];
        }
    }
    sum + bias
}

/// Simplified SMO
fn smo_train(config: &SvmConfig, kernel_matrix: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, f64) {
    let n = y.len();
    let c = config.c;
    let mut alphas = Array1::zeros(n);
    let mut bias = 0.0;

    if n <= 1 {
        return (alphas, bias);
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.random_state);
    let mut passes = 0;
    let max_passes = 5;
    let mut total_iter = 0;

    while passes < max_passes && total_iter < config.max_iter {
        let mut num_changed = 0;

        for i in 0..n {
            let e_i = decision_cached(kernel_matrix, &alphas, y, bias, i) - y[i];

            // Check KKT conditions
            if (y[i] * e_i < -config.tol && alphas[i] < c) || (y[i] * e_i > config.tol && alphas[i] > 0.0) {
                let j = loop {
                    let j = rng.gen_range(0..n);
                    if j != i {
                        break j;
                    }
                };

                let e_j = decision_cached(kernel_matrix, &alphas, y, bias, j) - y[j];
                let alpha_i_old = alphas[i];
                let alpha_j_old = alphas[j];

                let (l, h) = if y[i] != y[j] {
                    ((alphas[j] - alphas[i]).max(0.0), (c + alphas[j] - alphas[i]).min(c))
                } else {
                    ((alphas[i] + alphas[j] - c).max(0.0), (alphas[i] + alphas[j]).min(c))
                };
                if (l - h).abs() < 1e-10 {
                    continue;
                }

                let eta = 2.0 * kernel_matrix[[i, j]] - kernel_matrix[[i, i]] - kernel_matrix[[j, j]];
                if eta >= 0.0 {
                    continue;
                }

                alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).clamp(l, h);
                if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                    continue;
                }
                alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                let b1 = bias
                    - e_i
                    - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                    - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                let b2 = bias
                    - e_j
                    - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                    - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                bias = if alphas[i] > 0.0 && alphas[i] < c {
                    b1
                } else if alphas[j] > 0.0 && alphas[j] < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                num_changed += 1;
            }
        }

        total_iter += 1;
        if num_changed == 0 {
            passes += 1;
        } else {
            passes = 0;
        }
    }

    (alphas, bias)
}
