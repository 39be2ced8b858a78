//! SVM-SMOTE: oversampling around the SVM margin

use crate::error::Result;
use crate::synthetic::smote::{minority_positions, MinorityNeighbors};
use crate::synthetic::{
    seeded_rng, validate_input, BinaryPartition, BinarySvm, NearestNeighborIndex, ResampleResult,
    Sampler, SvmConfig, SyntheticBatch,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// SVM-SMOTE
///
/// Minority support vectors seed new rows. Vectors in danger interpolate
/// toward a minority neighbor; safe vectors extrapolate away from it by at
/// most `out_step`. Vectors whose `m` neighbors are all majority are noise and
/// are skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmSmote {
    k_neighbors: usize,
    m_neighbors: usize,
    out_step: f64,
    svm: SvmConfig,
    seed: u64,
}

impl SvmSmote {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            m_neighbors: 10,
            out_step: 0.5,
            svm: SvmConfig::default(),
            seed: 42,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_m_neighbors(mut self, m: usize) -> Self {
        self.m_neighbors = m.max(1);
        self
    }

    /// Extrapolation step for safe support vectors
    pub fn with_out_step(mut self, step: f64) -> Self {
        self.out_step = step.max(0.0);
        self
    }

    pub fn with_svm_config(mut self, config: SvmConfig) -> Self {
        self.svm = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.svm.random_state = seed;
        self
    }
}

impl Default for SvmSmote {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SvmSmote {
    fn name(&self) -> &'static str {
        "svm_smote"
    }

    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        validate_input(x, y)?;
        let partition = BinaryPartition::from_labels(y)?;
        let n_samples = partition.deficit();
        if n_samples == 0 {
            return Ok(ResampleResult::unchanged(x, y));
        }

        let signed: Array1<f64> = y.mapv(|l| if l == partition.minority_label { 1.0 } else { -1.0 });
        let svm = BinarySvm::fit(&self.svm, x, &signed)?;
        let support: Vec<usize> = svm
            .support_indices()
            .iter()
            .copied()
            .filter(|&i| y[i] == partition.minority_label)
            .collect();

        let index = NearestNeighborIndex::build(x);
        let table = index.kneighbors(&support, self.m_neighbors, false)?;
        let m = self.m_neighbors as f64;

        let mut danger = Vec::new();
        let mut safe = Vec::new();
        for (&row, nn) in support.iter().zip(table.iter()) {
            let n_majority = nn.iter().filter(|n| y[n.index] != partition.minority_label).count() as f64;
            if n_majority >= m {
                continue;
            }
            if n_majority >= m / 2.0 {
                danger.push(row);
            } else {
                safe.push(row);
            }
        }
        debug!(
            support = support.len(),
            danger = danger.len(),
            safe = safe.len(),
            "SVM-SMOTE support vector split"
        );

        if danger.is_empty() && safe.is_empty() {
            warn!(variant = self.name(), "No usable minority support vector, returning input unchanged");
            return Ok(ResampleResult::unchanged(x, y));
        }

        let n_danger = (n_samples as f64 * danger.len() as f64 / (danger.len() + safe.len()) as f64).round() as usize;
        let n_safe = n_samples - n_danger;

        let neighbors = MinorityNeighbors::build(x, &partition.minority, self.k_neighbors)?;
        let mut rng = seeded_rng(self.seed);
        let mut batch = SyntheticBatch::new(n_samples);

        let groups = [
            (minority_positions(&partition, &danger), n_danger, 1.0),
            (minority_positions(&partition, &safe), n_safe, -self.out_step),
        ];
        for (seeds, count, step) in groups.iter() {
            if seeds.is_empty() {
                continue;
            }
            for _ in 0..*count {
                let pos = seeds[rng.gen_range(0..seeds.len())];
                if let Some(partner) = neighbors.random_partner(pos, &mut rng) {
                    let alpha = step * rng.gen::<f64>();
                    batch.push(x, neighbors.row(pos), partner, alpha);
                }
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

    fn overlapping() -> (Array2<f64>, Array1<i64>) {
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..16 {
            data.push((i % 4) as f64);
            data.push((i / 4) as f64);
            labels.push(0);
        }
        for (a, b) in [(3.5, 3.5), (4.0, 3.0), (4.5, 4.0), (5.0, 5.0), (4.0, 4.5), (5.5, 4.5)] {
            data.push(a);
            data.push(b);
            labels.push(1);
        }
        (Array2::from_shape_vec((22, 2), data).unwrap(), Array1::from_vec(labels))
    }

    #[test]
    fn test_svm_smote_generates_minority_rows() {
        let (x, y) = overlapping();
        let sampler = SvmSmote::new().with_k_neighbors(3).with_m_neighbors(5).with_seed(3);
        let result = sampler.fit_resample(&x, &y).unwrap();

        assert_eq!(result.n_attempted, 10);
        for (i, origin) in result.origins.iter().enumerate() {
            assert_eq!(y[origin.seed], 1);
            assert_eq!(y[origin.neighbor], 1);
            assert!(origin.alpha > -0.5 && origin.alpha < 1.0);
            assert_eq!(result.y[x.nrows() + i], 1);
        }
        let counts = class_counts(&result.y);
        assert_eq!(counts[&1], 6 + result.n_synthetic);
    }

    #[test]
    fn test_svm_smote_balanced_is_noop() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let y = Array1::from_vec(vec![0, 1, 0, 1]);
        let result = SvmSmote::new().fit_resample(&x, &y).unwrap();
        assert_eq!(result.x, x);
        assert_eq!(result.y, y);
    }
}
