//! ADASYN (Adaptive Synthetic Sampling)

use crate::error::{ResampleError, Result};
use crate::synthetic::smote::MinorityNeighbors;
use crate::synthetic::{
    seeded_rng, validate_input, BinaryPartition, NearestNeighborIndex, ResampleResult, Sampler,
    SyntheticBatch,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// ADASYN adaptive synthetic sampling
///
/// Minority samples surrounded by more majority neighbors receive a larger
/// share of the synthetic rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adasyn {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Random seed
    seed: u64,
}

impl Adasyn {
    /// Create new ADASYN sampler
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rows to generate from each minority sample
    fn quotas(&self, x: &Array2<f64>, y: &Array1<i64>, partition: &BinaryPartition) -> Result<Vec<usize>> {
        let index = NearestNeighborIndex::build(x);
        let table = index.kneighbors(&partition.minority, self.k_neighbors, false)?;
        let k = self.k_neighbors as f64;

        let ratios: Vec<f64> = table
            .iter()
            .map(|nn| {
                let n_majority = nn.iter().filter(|n| y[n.index] != partition.minority_label).count();
                n_majority as f64 / k
            })
            .collect();

        let sum_ratios: f64 = ratios.iter().sum();
        if sum_ratios <= 0.0 {
            return Err(ResampleError::ComputationError(
                "No minority sample has a majority-class neighbor; ADASYN cannot weight the minority class"
                    .to_string(),
            ));
        }

        let n_samples = partition.deficit() as f64;
        Ok(ratios
            .iter()
            .map(|&r| (r / sum_ratios * n_samples).round() as usize)
            .collect())
    }
}

impl Default for Adasyn {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for Adasyn {
    fn name(&self) -> &'static str {
        "adasyn"
    }

    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        validate_input(x, y)?;
        let partition = BinaryPartition::from_labels(y)?;
        if partition.is_balanced() {
            return Ok(ResampleResult::unchanged(x, y));
        }

        let quotas = self.quotas(x, y, &partition)?;
        let attempted: usize = quotas.iter().sum();
        debug!(?quotas, "ADASYN per-sample quotas");

        let neighbors = MinorityNeighbors::build(x, &partition.minority, self.k_neighbors)?;
        let mut rng = seeded_rng(self.seed);
        let mut batch = SyntheticBatch::new(attempted);

        for (pos, &quota) in quotas.iter().enumerate() {
            for _ in 0..quota {
                if let Some(partner) = neighbors.random_partner(pos, &mut rng) {
                    let gap: f64 = rng.gen();
                    batch.push(x, neighbors.row(pos), partner, gap);
                }
            }
        }

        info!(variant = self.name(), generated = batch.len(), attempted, "Resampling complete");
        Ok(batch.finish(x, y, partition.minority_label))
    }
}
