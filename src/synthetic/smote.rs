//! SMOTE and Borderline-SMOTE

use crate::error::{ResampleError, Result};
use crate::synthetic::{
    seeded_rng, validate_input, BinaryPartition, NearestNeighborIndex, Neighbor, ResampleResult,
    Sampler, SyntheticBatch,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// k nearest minority neighbors of every minority row
pub(crate) struct MinorityNeighbors {
    rows: Vec<usize>,
    table: Vec<Vec<Neighbor>>,
}

impl MinorityNeighbors {
    pub(crate) fn build(x: &Array2<f64>, minority: &[usize], k: usize) -> Result<Self> {
        let index = NearestNeighborIndex::build_from_rows(x, minority);
        let positions: Vec<usize> = (0..minority.len()).collect();
        let table = index.kneighbors(&positions, k, false)?;
        Ok(Self { rows: minority.to_vec(), table })
    }

    /// Global row index of the minority sample at `pos`
    pub(crate) fn row(&self, pos: usize) -> usize {
        self.rows[pos]
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Global row index of a uniformly chosen neighbor of `pos`
    pub(crate) fn random_partner<R: Rng>(&self, pos: usize, rng: &mut R) -> Option<usize> {
        self.table[pos]
            .choose(rng)
            .map(|n| self.rows[n.index])
    }
}

/// Position of each global row inside the minority list
pub(crate) fn minority_positions(partition: &BinaryPartition, rows: &[usize]) -> Vec<usize> {
    rows.iter()
        .filter_map(|r| partition.minority.binary_search(r).ok())
        .collect()
}

/// SMOTE (Synthetic Minority Over-sampling Technique)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Random seed
    seed: u64,
}

impl Smote {
    /// Create new SMOTE sampler
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

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for Smote {
    fn name(&self) -> &'static str {
        "smote"
    }

    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        validate_input(x, y)?;
        let partition = BinaryPartition::from_labels(y)?;
        let n_samples = partition.deficit();
        if n_samples == 0 {
            return Ok(ResampleResult::unchanged(x, y));
        }

        let neighbors = MinorityNeighbors::build(x, &partition.minority, self.k_neighbors)?;
        let mut rng = seeded_rng(self.seed);
        let mut batch = SyntheticBatch::new(n_samples);

        for _ in 0..n_samples {
            let pos = rng.gen_range(0..neighbors.len());
            if let Some(partner) = neighbors.random_partner(pos, &mut rng) {
                let gap: f64 = rng.gen();
                batch.push(x, neighbors.row(pos), partner, gap);
            }
        }

        info!(variant = self.name(), generated = batch.len(), attempted = n_samples, "Resampling complete");
        Ok(batch.finish(x, y, partition.minority_label))
    }
}

/// Borderline SMOTE (type 1)
///
/// Only minority samples in danger, i.e. with at least half but not all of
/// their `m` neighbors in the majority class, seed new rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderlineSmote {
    /// Base SMOTE
    smote: Smote,
    /// Number of neighbors for borderline detection
    m_neighbors: usize,
}

impl BorderlineSmote {
    /// Create new Borderline SMOTE
    pub fn new() -> Self {
        Self {
            smote: Smote::new(),
            m_neighbors: 10,
        }
    }

    /// Set k neighbors for SMOTE
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.smote = self.smote.with_k_neighbors(k);
        self
    }

    /// Set m neighbors for borderline detection
    pub fn with_m_neighbors(mut self, m: usize) -> Self {
        self.m_neighbors = m.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.smote = self.smote.with_seed(seed);
        self
    }

    /// Minority rows in danger
    fn danger_rows(&self, x: &Array2<f64>, y: &Array1<i64>, partition: &BinaryPartition) -> Result<Vec<usize>> {
        let index = NearestNeighborIndex::build(x);
        let table = index.kneighbors(&partition.minority, self.m_neighbors, false)?;
        let m = self.m_neighbors as f64;

        let danger = partition
            .minority
            .iter()
            .zip(table.iter())
            .filter(|(_, nn)| {
                let n_majority = nn.iter().filter(|n| y[n.index] != partition.minority_label).count() as f64;
                n_majority >= m / 2.0 && n_majority < m
            })
            .map(|(&row, _)| row)
            .collect();
        Ok(danger)
    }
}

impl Default for BorderlineSmote {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for BorderlineSmote {
    fn name(&self) -> &'static str {
        "borderline_smote"
    }

    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        validate_input(x, y)?;
        let partition = BinaryPartition::from_labels(y)?;
        let n_samples = partition.deficit();
        if n_samples == 0 {
            return Ok(ResampleResult::unchanged(x, y));
        }

        let danger = self.danger_rows(x, y, &partition)?;
        debug!(danger = danger.len(), minority = partition.minority.len(), "Borderline detection");
        if danger.is_empty() {
            warn!(variant = self.name(), "No minority sample in danger, returning input unchanged");
            return Ok(ResampleResult::unchanged(x, y));
        }

        let neighbors = MinorityNeighbors::build(x, &partition.minority, self.smote.k_neighbors)?;
        let seeds = minority_positions(&partition, &danger);
        if seeds.is_empty() {
            return Err(ResampleError::ComputationError(
                "Danger samples are not part of the minority class".to_string(),
            ));
        }

        let mut rng = seeded_rng(self.smote.seed);
        let mut batch = SyntheticBatch::new(n_samples);

        for _ in 0..n_samples {
            let pos = seeds[rng.gen_range(0..seeds.len())];
            if let Some(partner) = neighbors.random_partner(pos, &mut rng) {
                let gap: f64 = rng.gen();
                batch.push(x, neighbors.row(pos), partner, gap);
            }
        }

        info!(variant = self.name(), generated = batch.len(), attempted = n_samples, "Resampling complete");
        Ok(batch.finish(x, y, partition.minority_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::class_counts;

    fn create_imbalanced_data() -> (Array2<f64>, Array1<i64>) {
        // Create imbalanced dataset: 20 majority, 5 minority
        let mut data = Vec::new();
        let mut labels = Vec::new();

        // Majority class (0) around (0, 0)
        for i in 0..20 {
            data.push((i % 5) as f64);
            data.push((i / 5) as f64);
            labels.push(0i64);
        }

        // Minority class (1) around (10, 10)
        for i in 0..5 {
            data.push(10.0 + (i % 3) as f64);
            data.push(10.0 + (i / 3) as f64);
            labels.push(1i64);
        }

        let x = Array2::from_shape_vec((25, 2), data).unwrap();
        let y = Array1::from_vec(labels);

        (x, y)
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = create_imbalanced_data();

        let smote = Smote::new().with_k_neighbors(3).with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        let new_counts = class_counts(&result.y);
        assert_eq!(new_counts[&0], 20);
        assert_eq!(new_counts[&1], 20);
        assert_eq!(result.n_synthetic, 15);
        assert_eq!(result.n_dropped(), 0);
    }

    #[test]
    fn test_smote_preserves_original() {
        let (x, y) = create_imbalanced_data();
        let original_rows = x.nrows();

        let smote = Smote::new().with_k_neighbors(3).with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        // First rows should be original data
        for i in 0..original_rows {
            for j in 0..x.ncols() {
                assert_eq!(result.x[[i, j]], x[[i, j]]);
            }
            assert_eq!(result.y[i], y[i]);
        }
    }

    #[test]
    fn test_smote_partners_are_minority() {
        let (x, y) = create_imbalanced_data();
        let result = Smote::new().with_k_neighbors(3).fit_resample(&x, &y).unwrap();

        for origin in &result.origins {
            assert_eq!(y[origin.seed], 1);
            assert_eq!(y[origin.neighbor], 1);
            assert!((0.0..1.0).contains(&origin.alpha));
        }
    }

    #[test]
    fn test_smote_k_not_below_minority_count_fails() {
        let (x, y) = create_imbalanced_data();
        let err = Smote::new().with_k_neighbors(5).fit_resample(&x, &y).unwrap_err();
        assert!(matches!(err, ResampleError::NeighborCount { .. }));
    }

    #[test]
    fn test_borderline_smote_without_danger_is_noop() {
        // Clusters are far apart: no minority sample has majority neighbors
        let (x, y) = create_imbalanced_data();

        let bsmote = BorderlineSmote::new()
            .with_k_neighbors(3)
            .with_m_neighbors(4)
            .with_seed(42);

        let result = bsmote.fit_resample(&x, &y).unwrap();
        assert_eq!(result.x, x);
        assert_eq!(result.n_synthetic, 0);
    }

    #[test]
    fn test_borderline_smote_seeds_from_danger() {
        let x = Array2::from_shape_vec(
            (9, 1),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 4.5, 5.5, 20.0],
        )
        .unwrap();
        let y = Array1::from_vec(vec![0, 0, 0, 0, 0, 0, 1, 1, 1]);

        let bsmote = BorderlineSmote::new()
            .with_k_neighbors(1)
            .with_m_neighbors(3)
            .with_seed(7);
        let result = bsmote.fit_resample(&x, &y).unwrap();

        assert_eq!(result.n_attempted, 3);
        for origin in &result.origins {
            // Row 8 sits far from the boundary and is not in danger
            assert_ne!(origin.seed, 8);
        }
    }
}
