//! SMOBD: borderline-density weighted oversampling
//!
//! Minority samples whose neighborhood is dominated by the majority class sit
//! near the decision boundary. New rows are seeded only from those samples,
//! and denser borderline samples (smaller mean neighbor distance) are drawn
//! more often. When no sample is borderline the call falls back to plain SMOTE.

use crate::error::{ResampleError, Result};
use crate::synthetic::{
    seeded_rng, validate_input, BinaryPartition, ClassRole, NearestNeighborIndex, Neighbor,
    ResampleResult, Sampler, Smote, SyntheticBatch,
};
use ndarray::{Array1, Array2};
use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Added to the mean neighbor distance so duplicates do not divide by zero
const DENSITY_EPSILON: f64 = 1e-10;

/// A borderline minority sample and its neighborhood
#[derive(Debug, Clone)]
pub struct BorderlineSample {
    /// Row index in the input matrix
    pub row: usize,
    /// The k nearest rows of the whole dataset, self excluded
    pub neighbors: Vec<Neighbor>,
    /// Draw probability, sums to 1 over all borderline samples
    pub probability: f64,
}

/// Borderline-density oversampler (SMOBD)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderlineDensityOversampler {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Random seed
    seed: u64,
}

impl BorderlineDensityOversampler {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rows of the minority samples that count as borderline
    pub fn borderline_rows(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<Vec<usize>> {
        validate_input(x, y)?;
        let partition = BinaryPartition::from_labels(y)?;
        Ok(self
            .borderline_samples(x, y, &partition)?
            .into_iter()
            .map(|s| s.row)
            .collect())
    }

    /// Borderline samples with density-based draw probabilities.
    ///
    /// A sample is borderline when strictly more than `k / 2` of its `k`
    /// neighbors belong to the majority class.
    fn borderline_samples(
        &self,
        x: &Array2<f64>,
        y: &Array1<i64>,
        partition: &BinaryPartition,
    ) -> Result<Vec<BorderlineSample>> {
        let index = NearestNeighborIndex::build(x);
        let table = index.kneighbors(&partition.minority, self.k_neighbors, true)?;
        let half = self.k_neighbors as f64 / 2.0;

        let mut samples: Vec<BorderlineSample> = partition
            .minority
            .iter()
            .zip(table)
            .filter_map(|(&row, mut nn)| {
                // First entry is the query row itself
                nn.remove(0);
                let n_majority = nn
                    .iter()
                    .filter(|n| partition.role(y[n.index]) == ClassRole::Majority)
                    .count();
                ((n_majority as f64) > half).then(|| BorderlineSample {
                    row,
                    neighbors: nn,
                    probability: 0.0,
                })
            })
            .collect();

        let densities: Vec<f64> = samples
            .iter()
            .map(|s| {
                let mean = s.neighbors.iter().map(|n| n.distance).sum::<f64>() / s.neighbors.len() as f64;
                1.0 / (mean + DENSITY_EPSILON)
            })
            .collect();

        let total: f64 = densities.iter().sum();
        let n = samples.len() as f64;
        for (sample, density) in samples.iter_mut().zip(densities) {
            sample.probability = if total > 0.0 && total.is_finite() {
                density / total
            } else {
                1.0 / n
            };
        }

        Ok(samples)
    }
}

impl Default for BorderlineDensityOversampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for BorderlineDensityOversampler {
    fn name(&self) -> &'static str {
        "smobd_smote"
    }

    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        validate_input(x, y)?;
        let partition = BinaryPartition::from_labels(y)?;
        let n_samples = partition.deficit();
        if n_samples == 0 {
            debug!(variant = self.name(), "Classes already balanced");
            return Ok(ResampleResult::unchanged(x, y));
        }

        let borderline = self.borderline_samples(x, y, &partition)?;
        debug!(
            borderline = borderline.len(),
            minority = partition.minority.len(),
            majority = partition.majority.len(),
            "SMOBD borderline detection"
        );

        if borderline.is_empty() {
            warn!(variant = self.name(), "No borderline minority sample, falling back to plain SMOTE");
            return Smote::new()
                .with_k_neighbors(self.k_neighbors)
                .with_seed(self.seed)
                .fit_resample(x, y);
        }

        let weights: Vec<f64> = borderline.iter().map(|s| s.probability).collect();
        let picker = WeightedIndex::new(&weights)
            .map_err(|e| ResampleError::ComputationError(format!("Invalid density weights: {}", e)))?;

        let mut rng = seeded_rng(self.seed);
        let mut batch = SyntheticBatch::new(n_samples);

        for _ in 0..n_samples {
            let sample = &borderline[picker.sample(&mut rng)];
            let candidates: Vec<usize> = sample
                .neighbors
                .iter()
                .filter(|n| y[n.index] == partition.minority_label)
                .map(|n| n.index)
                .collect();

            let Some(&neighbor) = candidates.choose(&mut rng) else {
                continue;
            };
            let alpha: f64 = rng.gen();
            batch.push(x, sample.row, neighbor, alpha);
        }

        let generated = batch.len();
        if generated < n_samples {
            warn!(
                variant = self.name(),
                dropped = n_samples - generated,
                "Some draws had no minority neighbor or overflowed"
            );
        }
        info!(variant = self.name(), generated, attempted = n_samples, "Resampling complete");
        Ok(batch.finish(x, y, partition.minority_label))
    }
}
