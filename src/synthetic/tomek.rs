//! Tomek link cleaning and SMOTE + Tomek

use crate::error::Result;
use crate::synthetic::{validate_input, NearestNeighborIndex, ResampleResult, Sampler, Smote};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Removes Tomek links: pairs of rows from different classes that are each
/// other's nearest neighbor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomekLinks {
    /// Drop only the majority member of each link instead of both
    majority_only: bool,
}

impl TomekLinks {
    /// Remove both members of each link
    pub fn new() -> Self {
        Self { majority_only: false }
    }

    pub fn majority_only(mut self, yes: bool) -> Self {
        self.majority_only = yes;
        self
    }

    /// All links as (lower row, higher row)
    pub fn links(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<Vec<(usize, usize)>> {
        let index = NearestNeighborIndex::build(x);
        let rows: Vec<usize> = (0..x.nrows()).collect();
        let nearest: Vec<usize> = index
            .kneighbors(&rows, 1, false)?
            .into_iter()
            .map(|nn| nn[0].index)
            .collect();

        Ok(nearest
            .iter()
            .enumerate()
            .filter(|&(i, &j)| i < j && nearest[j] == i && y[i] != y[j])
            .map(|(i, &j)| (i, j))
            .collect())
    }

    /// Drop linked rows, keeping the survivors in their original order.
    /// Returns the cleaned data and the removed row indices.
    pub fn clean(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<(Array2<f64>, Array1<i64>, Vec<usize>)> {
        validate_input(x, y)?;
        let links = self.links(x, y)?;

        let majority_label = {
            let counts = crate::synthetic::class_counts(y);
            counts.iter().max_by_key(|(&label, &c)| (c, label)).map(|(&label, _)| label)
        };

        let mut removed: Vec<usize> = Vec::with_capacity(links.len() * 2);
        for (a, b) in links {
            for row in [a, b] {
                if !self.majority_only || Some(y[row]) == majority_label {
                    removed.push(row);
                }
            }
        }
        removed.sort_unstable();
        removed.dedup();

        let keep: Vec<usize> = (0..x.nrows()).filter(|i| removed.binary_search(i).is_err()).collect();
        debug!(removed = removed.len(), kept = keep.len(), "Tomek link cleaning");

        let y_kept: Array1<i64> = keep.iter().map(|&i| y[i]).collect();
        Ok((x.select(Axis(0), &keep), y_kept, removed))
    }
}

impl Default for TomekLinks {
    fn default() -> Self {
        Self::new()
    }
}

/// SMOTE oversampling followed by Tomek link removal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoteTomek {
    smote: Smote,
    tomek: TomekLinks,
}

impl SmoteTomek {
    pub fn new() -> Self {
        Self {
            smote: Smote::new(),
            tomek: TomekLinks::new(),
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.smote = self.smote.with_k_neighbors(k);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.smote = self.smote.with_seed(seed);
        self
    }
}

impl Default for SmoteTomek {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SmoteTomek {
    fn name(&self) -> &'static str {
        "smote_tomek"
    }

    /// Row positions shift after cleaning, so `origins` is left empty
    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let oversampled = self.smote.fit_resample(x, y)?;
        let (x_clean, y_clean, removed) = self.tomek.clean(&oversampled.x, &oversampled.y)?;

        info!(
            variant = self.name(),
            generated = oversampled.n_synthetic,
            removed = removed.len(),
            "Resampling complete"
        );
        Ok(ResampleResult {
            x: x_clean,
            y: y_clean,
            n_synthetic: oversampled.n_synthetic,
            n_attempted: oversampled.n_attempted,
            origins: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_links_found() {
        let x = array![[0.0], [1.0], [1.2], [5.0], [9.0], [9.1]];
        let y = array![0, 0, 1, 0, 1, 1];
        let links = TomekLinks::new().links(&x, &y).unwrap();
        assert_eq!(links, vec![(1, 2)]);
    }

    #[test]
    fn test_clean_removes_both_members() {
        let x = array![[0.0], [1.0], [1.2], [5.0], [9.0], [9.1]];
        let y = array![0, 0, 1, 0, 1, 1];
        let (xc, yc, removed) = TomekLinks::new().clean(&x, &y).unwrap();
        assert_eq!(removed, vec![1, 2]);
        assert_eq!(xc.column(0).to_vec(), vec![0.0, 5.0, 9.0, 9.1]);
        assert_eq!(yc.to_vec(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_clean_majority_only() {
        let x = array![[0.0], [1.0], [1.2], [5.0], [9.0], [9.1], [20.0]];
        let y = array![0, 0, 1, 0, 1, 1, 0];
        let (_, yc, removed) = TomekLinks::new().majority_only(true).clean(&x, &y).unwrap();
        assert_eq!(removed, vec![1]);
        assert_eq!(yc.len(), 6);
    }

    #[test]
    fn test_smote_tomek_runs() {
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            data.push(i as f64);
            labels.push(0);
        }
        for v in [11.5, 12.5, 13.0, 14.0, 15.0, 16.0] {
            data.push(v);
            labels.push(1);
        }
        let x = Array2::from_shape_vec((18, 1), data).unwrap();
        let y = Array1::from_vec(labels);

        let result = SmoteTomek::new().with_k_neighbors(2).with_seed(1).fit_resample(&x, &y).unwrap();
        assert_eq!(result.n_synthetic, 6);
        assert!(result.x.nrows() <= 24);
        assert_eq!(result.x.nrows(), result.y.len());
        assert!(result.origins.is_empty());
    }
}
