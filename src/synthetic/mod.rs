//! Minority-class oversampling
//!
//! Rebalances a binary (fraudulent / legitimate) training set before the
//! classifier is fit:
//! - SMOBD: borderline samples weighted by local density
//! - G-SMOTE: truncated geometric interpolation / extrapolation
//! - SMOTE, Borderline-SMOTE, SVM-SMOTE, ADASYN, SMOTE+Tomek
//!
//! Every sampler is reached by name through [`VariantRegistry`].

mod neighbors;
mod smote;
mod adasyn;
mod svm;
mod svm_smote;
mod tomek;
mod smobd;
mod gsmote;
mod registry;

pub use neighbors::{Neighbor, NearestNeighborIndex};
pub use smote::{Smote, BorderlineSmote};
pub use adasyn::Adasyn;
pub use svm::{BinarySvm, SvmConfig};
pub use svm_smote::SvmSmote;
pub use tomek::{TomekLinks, SmoteTomek};
pub use smobd::BorderlineDensityOversampler;
pub use gsmote::{GeometricOversampler, SelectionStrategy};
pub use registry::{Variant, VariantRegistry};

use crate::error::{ResampleError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a synthetic row came from: `x[seed] + alpha * (x[neighbor] - x[seed])`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleOrigin {
    /// Row index of the seed in the input matrix
    pub seed: usize,
    /// Row index of the interpolation partner in the input matrix
    pub neighbor: usize,
    /// Interpolation coefficient
    pub alpha: f64,
}

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features (originals first, then synthetic rows)
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Number of synthetic rows appended
    pub n_synthetic: usize,
    /// Number of synthesis draws attempted
    pub n_attempted: usize,
    /// One entry per synthetic row, in generation order
    pub origins: Vec<SampleOrigin>,
}

impl ResampleResult {
    /// Input returned as-is
    pub fn unchanged(x: &Array2<f64>, y: &Array1<i64>) -> Self {
        Self {
            x: x.clone(),
            y: y.clone(),
            n_synthetic: 0,
            n_attempted: 0,
            origins: Vec::new(),
        }
    }

    /// Draws that produced no row
    pub fn n_dropped(&self) -> usize {
        self.n_attempted.saturating_sub(self.n_synthetic)
    }
}

/// Trait for samplers
///
/// Calls are independent: each one seeds its own generator and builds its own
/// neighbor index, so a sampler can be shared across threads. Neighbor tables
/// are computed on the global rayon pool; their order does not depend on
/// scheduling, so results stay deterministic.
///
/// A synthetic row that overflows to a non-finite value (extreme but finite
/// inputs) is dropped and counted as a lost draw.
pub trait Sampler: Send + Sync {
    /// Registry name of the algorithm
    fn name(&self) -> &'static str;

    /// Rebalance `(x, y)`, returning a new dataset
    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;
}

/// Get class distribution
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

/// Role of a label within one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassRole {
    Minority,
    Majority,
}

/// Minority / majority split of a two-class label vector.
///
/// When both classes have the same count the lower label is the minority.
#[derive(Debug, Clone)]
pub struct BinaryPartition {
    pub minority_label: i64,
    pub majority_label: i64,
    pub minority: Vec<usize>,
    pub majority: Vec<usize>,
}

impl BinaryPartition {
    pub fn from_labels(y: &Array1<i64>) -> Result<Self> {
        let mut indices = class_indices(y);
        if indices.len() != 2 {
            return Err(ResampleError::ClassCount { found: indices.len() });
        }

        // BTreeMap iterates in ascending label order
        let (low, low_idx) = indices.pop_first().ok_or(ResampleError::ClassCount { found: 0 })?;
        let (high, high_idx) = indices.pop_first().ok_or(ResampleError::ClassCount { found: 1 })?;

        let partition = if high_idx.len() < low_idx.len() {
            Self {
                minority_label: high,
                majority_label: low,
                minority: high_idx,
                majority: low_idx,
            }
        } else {
            Self {
                minority_label: low,
                majority_label: high,
                minority: low_idx,
                majority: high_idx,
            }
        };
        Ok(partition)
    }

    pub fn role(&self, label: i64) -> ClassRole {
        if label == self.minority_label {
            ClassRole::Minority
        } else {
            ClassRole::Majority
        }
    }

    /// Rows needed to bring the minority up to the majority count
    pub fn deficit(&self) -> usize {
        self.majority.len().saturating_sub(self.minority.len())
    }

    pub fn is_balanced(&self) -> bool {
        self.deficit() == 0
    }
}

/// Check that `x` and `y` describe the same non-empty, finite dataset
pub fn validate_input(x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ResampleError::ShapeError {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ResampleError::ValidationError(
            "Cannot resample an empty feature matrix".to_string(),
        ));
    }
    if let Some(pos) = x.iter().position(|v| !v.is_finite()) {
        return Err(ResampleError::ValidationError(format!(
            "Non-finite feature value in row {}",
            pos / x.ncols()
        )));
    }
    Ok(())
}

/// Per-call generator, never shared between calls
pub(crate) fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `seed + alpha * (neighbor - seed)`
pub(crate) fn interpolate(seed: ArrayView1<f64>, neighbor: ArrayView1<f64>, alpha: f64) -> Vec<f64> {
    seed.iter()
        .zip(neighbor.iter())
        .map(|(&s, &n)| s + alpha * (n - s))
        .collect()
}

/// Accumulates synthetic rows for one call
pub(crate) struct SyntheticBatch {
    rows: Vec<Vec<f64>>,
    origins: Vec<SampleOrigin>,
    attempted: usize,
}

impl SyntheticBatch {
    pub(crate) fn new(attempted: usize) -> Self {
        Self {
            rows: Vec::with_capacity(attempted),
            origins: Vec::with_capacity(attempted),
            attempted,
        }
    }

    /// Interpolate between two input rows and record the origin.
    /// Returns false, keeping nothing, when the row overflows.
    pub(crate) fn push(&mut self, x: &Array2<f64>, seed: usize, neighbor: usize, alpha: f64) -> bool {
        let row = interpolate(x.row(seed), x.row(neighbor), alpha);
        if row.iter().any(|v| !v.is_finite()) {
            return false;
        }
        self.rows.push(row);
        self.origins.push(SampleOrigin { seed, neighbor, alpha });
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Originals followed by the synthetic rows, all labelled `label`
    pub(crate) fn finish(self, x: &Array2<f64>, y: &Array1<i64>, label: i64) -> ResampleResult {
        let n_original = x.nrows();
        let n_total = n_original + self.rows.len();
        let rows = &self.rows;
        let result_x = Array2::from_shape_fn((n_total, x.ncols()), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                rows[i - n_original][j]
            }
        });

        let mut all_y: Vec<i64> = y.iter().copied().collect();
        all_y.extend(std::iter::repeat(label).take(self.rows.len()));

        ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic: self.rows.len(),
            n_attempted: self.attempted,
            origins: self.origins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_partition_picks_smaller_class() {
        let y = array![0, 0, 0, 1, 1];
        let p = BinaryPartition::from_labels(&y).unwrap();
        assert_eq!(p.minority_label, 1);
        assert_eq!(p.majority_label, 0);
        assert_eq!(p.minority, vec![3, 4]);
        assert_eq!(p.deficit(), 1);
        assert_eq!(p.role(0), ClassRole::Majority);
    }

    #[test]
    fn test_partition_tie_lower_label_is_minority() {
        let y = array![7, 3, 7, 3];
        let p = BinaryPartition::from_labels(&y).unwrap();
        assert_eq!(p.minority_label, 3);
        assert_eq!(p.majority_label, 7);
        assert!(p.is_balanced());
    }

    #[test]
    fn test_partition_rejects_three_classes() {
        let y = array![0, 1, 2, 1];
        let err = BinaryPartition::from_labels(&y).unwrap_err();
        assert!(matches!(err, ResampleError::ClassCount { found: 3 }));
    }

    #[test]
    fn test_partition_rejects_single_class() {
        let y = array![1, 1, 1];
        assert!(BinaryPartition::from_labels(&y).is_err());
    }

    #[test]
    fn test_validate_input_shape_mismatch() {
        let x = Array2::<f64>::zeros((3, 2));
        let y = array![0, 1];
        assert!(matches!(validate_input(&x, &y), Err(ResampleError::ShapeError { .. })));
    }

    #[test]
    fn test_validate_input_non_finite() {
        let x = array![[0.0, 1.0], [f64::NAN, 2.0]];
        let y = array![0, 1];
        assert!(validate_input(&x, &y).is_err());
    }

    #[test]
    fn test_batch_appends_after_originals() {
        let x = array![[0.0, 0.0], [2.0, 4.0]];
        let y = array![0, 1];
        let mut batch = SyntheticBatch::new(2);
        batch.push(&x, 0, 1, 0.5);
        let result = batch.finish(&x, &y, 1);

        assert_eq!(result.x.nrows(), 3);
        assert_eq!(result.x.row(2).to_vec(), vec![1.0, 2.0]);
        assert_eq!(result.y.to_vec(), vec![0, 1, 1]);
        assert_eq!(result.n_synthetic, 1);
        assert_eq!(result.n_dropped(), 1);
    }

    #[test]
    fn test_batch_drops_overflowing_rows() {
        let x = array![[f64::MAX], [-f64::MAX]];
        let y = array![0, 1];
        let mut batch = SyntheticBatch::new(1);
        assert!(!batch.push(&x, 0, 1, 0.5));
        let result = batch.finish(&x, &y, 1);

        assert_eq!(result.x, x);
        assert_eq!(result.n_synthetic, 0);
        assert_eq!(result.n_dropped(), 1);
        assert!(result.origins.is_empty());
    }
}
