//! G-SMOTE: geometric oversampling
//!
//! New rows lie on the line through a minority seed and one of its neighbors,
//! `seed + alpha * (neighbor - seed)` with `alpha` drawn from [-1, 1) and
//! clamped to the truncation factor. Negative coefficients extrapolate past
//! the seed, away from the neighbor.

use crate::error::{ResampleError, Result};
use crate::synthetic::{
    seeded_rng, validate_input, BinaryPartition, ClassRole, NearestNeighborIndex, ResampleResult,
    Sampler, SyntheticBatch,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Which neighbors of a seed may serve as interpolation partner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Same-class neighbors only
    Minority,
    /// Opposite-class neighbors only
    Majority,
    /// Any neighbor
    #[default]
    Combined,
}

impl SelectionStrategy {
    fn admits(self, role: ClassRole) -> bool {
        match self {
            SelectionStrategy::Minority => role == ClassRole::Minority,
            SelectionStrategy::Majority => role == ClassRole::Majority,
            SelectionStrategy::Combined => true,
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionStrategy::Minority => "minority",
            SelectionStrategy::Majority => "majority",
            SelectionStrategy::Combined => "combined",
        };
        f.write_str(s)
    }
}

impl FromStr for SelectionStrategy {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "minority" => Ok(SelectionStrategy::Minority),
            "majority" => Ok(SelectionStrategy::Majority),
            "combined" => Ok(SelectionStrategy::Combined),
            other => Err(ResampleError::InvalidParameter {
                name: "selection_strategy".to_string(),
                value: other.to_string(),
                reason: "expected one of minority, majority, combined".to_string(),
            }),
        }
    }
}

/// Geometric oversampler (G-SMOTE)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometricOversampler {
    k_neighbors: usize,
    selection_strategy: SelectionStrategy,
    /// Largest allowed |alpha|
    truncation_factor: f64,
    seed: u64,
}

impl GeometricOversampler {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            selection_strategy: SelectionStrategy::Combined,
            truncation_factor: 1.0,
            seed: 42,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_selection_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.selection_strategy = strategy;
        self
    }

    /// Must be positive; checked when resampling
    pub fn with_truncation_factor(mut self, factor: f64) -> Self {
        self.truncation_factor = factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn truncation_factor(&self) -> f64 {
        self.truncation_factor
    }

    fn validate(&self) -> Result<()> {
        if !(self.truncation_factor > 0.0 && self.truncation_factor.is_finite()) {
            return Err(ResampleError::InvalidParameter {
                name: "truncation_factor".to_string(),
                value: self.truncation_factor.to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for GeometricOversampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for GeometricOversampler {
    fn name(&self) -> &'static str {
        "g_smote"
    }

    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.validate()?;
        validate_input(x, y)?;
        let partition = BinaryPartition::from_labels(y)?;
        let n_samples = partition.deficit();
        if n_samples == 0 {
            return Ok(ResampleResult::unchanged(x, y));
        }

        let index = NearestNeighborIndex::build(x);
        let table = index.kneighbors(&partition.minority, self.k_neighbors, true)?;
        let n_minority = partition.minority.len();

        let mut rng = seeded_rng(self.seed);
        let mut batch = SyntheticBatch::new(n_samples);

        for _ in 0..n_samples {
            let pos = rng.gen_range(0..n_minority);
            let pool: Vec<usize> = table[pos][1..]
                .iter()
                .map(|n| n.index)
                .filter(|&i| self.selection_strategy.admits(partition.role(y[i])))
                .collect();

            let Some(&neighbor) = pool.choose(&mut rng) else {
                continue;
            };
            let alpha = rng
                .gen_range(-1.0..1.0_f64)
                .clamp(-self.truncation_factor, self.truncation_factor);
            batch.push(x, partition.minority[pos], neighbor, alpha);
        }

        let generated = batch.len();
        if generated < n_samples {
            warn!(
                variant = self.name(),
                strategy = %self.selection_strategy,
                dropped = n_samples - generated,
                "Some draws had no eligible neighbor or overflowed"
            );
        }
        info!(variant = self.name(), generated, attempted = n_samples, "Resampling complete");
        Ok(batch.finish(x, y, partition.minority_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (Array2<f64>, Array1<i64>) {
        let x = Array2::from_shape_vec(
            (9, 1),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 10.5, 11.0],
        )
        .unwrap();
        let y = Array1::from_vec(vec![0, 0, 0, 0, 0, 0, 1, 1, 1]);
        (x, y)
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Minority".parse::<SelectionStrategy>().unwrap(), SelectionStrategy::Minority);
        assert_eq!("COMBINED".parse::<SelectionStrategy>().unwrap(), SelectionStrategy::Combined);
        assert!("closest".parse::<SelectionStrategy>().is_err());
        assert_eq!(SelectionStrategy::Majority.to_string(), "majority");
    }

    #[test]
    fn test_alpha_within_truncation() {
        let (x, y) = data();
        let sampler = GeometricOversampler::new()
            .with_k_neighbors(2)
            .with_truncation_factor(0.25)
            .with_seed(9);
        let result = sampler.fit_resample(&x, &y).unwrap();

        assert_eq!(result.n_synthetic, 3);
        for origin in &result.origins {
            assert!(origin.alpha.abs() <= 0.25);
        }
    }

    #[test]
    fn test_minority_strategy_keeps_partners_in_class() {
        let (x, y) = data();
        let sampler = GeometricOversampler::new()
            .with_k_neighbors(2)
            .with_selection_strategy(SelectionStrategy::Minority);
        let result = sampler.fit_resample(&x, &y).unwrap();
        for origin in &result.origins {
            assert_eq!(y[origin.neighbor], 1);
        }
    }

    #[test]
    fn test_majority_strategy_without_candidates_drops_all() {
        // With k = 2 every minority row only sees minority neighbors
        let (x, y) = data();
        let sampler = GeometricOversampler::new()
            .with_k_neighbors(2)
            .with_selection_strategy(SelectionStrategy::Majority);
        let result = sampler.fit_resample(&x, &y).unwrap();
        assert_eq!(result.n_attempted, 3);
        assert_eq!(result.n_synthetic, 0);
        assert_eq!(result.x, x);
    }

    #[test]
    fn test_overflowing_extrapolation_is_dropped() {
        let x = Array2::from_shape_vec((5, 1), vec![1e308, 0.9e308, 0.8e308, -1e308, -0.9e308]).unwrap();
        let y = Array1::from_vec(vec![0, 0, 0, 1, 1]);

        for seed in 0..10 {
            let result = GeometricOversampler::new()
                .with_k_neighbors(2)
                .with_selection_strategy(SelectionStrategy::Majority)
                .with_seed(seed)
                .fit_resample(&x, &y)
                .unwrap();
            assert!(result.x.iter().all(|v| v.is_finite()));
            assert_eq!(result.n_attempted, 1);
            assert_eq!(result.x.nrows(), 5 + result.n_synthetic);
        }
    }

    #[test]
    fn test_non_positive_truncation_rejected() {
        let (x, y) = data();
        for bad in [0.0, -1.0, f64::NAN] {
            let err = GeometricOversampler::new()
                .with_k_neighbors(2)
                .with_truncation_factor(bad)
                .fit_resample(&x, &y)
                .unwrap_err();
            assert!(matches!(err, ResampleError::InvalidParameter { .. }));
        }
    }
}
