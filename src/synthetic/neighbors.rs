//! Exact Euclidean nearest-neighbor index

use crate::error::{ResampleError, Result};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Ordered (distance, index) pair for BinaryHeap-based partial sort.
/// Ties on distance fall back to the index so results are reproducible.
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then(self.1.cmp(&other.1))
    }
}

/// One entry of a neighbor query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f64,
    /// Row index in the indexed matrix
    pub index: usize,
}

/// Brute-force k-NN index over a fixed set of rows. Read-only once built.
#[derive(Debug, Clone)]
pub struct NearestNeighborIndex {
    data: Array2<f64>,
}

impl NearestNeighborIndex {
    /// Index a copy of `vectors`
    pub fn build(vectors: &Array2<f64>) -> Self {
        Self { data: vectors.to_owned() }
    }

    /// Index a subset of rows; neighbor indices refer to positions in `rows`
    pub fn build_from_rows(vectors: &Array2<f64>, rows: &[usize]) -> Self {
        Self { data: vectors.select(ndarray::Axis(0), rows) }
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Euclidean distance
    pub fn distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(ai, bi)| (ai - bi).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// `k` closest indexed rows to an arbitrary point
    pub fn query_point(&self, point: ArrayView1<f64>, k: usize) -> Result<Vec<Neighbor>> {
        self.check_dim(point.len())?;
        self.check_k(k, k, self.len())?;
        Ok(self.nearest(point, k, None))
    }

    /// Neighbors of an indexed row. With `include_self` the row itself is
    /// returned first at distance 0, followed by its `k` nearest other rows.
    pub fn query_row(&self, row: usize, k: usize, include_self: bool) -> Result<Vec<Neighbor>> {
        if row >= self.len() {
            return Err(ResampleError::InvalidParameter {
                name: "row".to_string(),
                value: row.to_string(),
                reason: format!("index holds {} rows", self.len()),
            });
        }
        self.check_k(k, k + 1, self.len())?;
        Ok(self.row_neighbors(row, k, include_self))
    }

    /// Neighbor table for many indexed rows, computed in parallel and
    /// returned in the order of `rows`
    pub fn kneighbors(&self, rows: &[usize], k: usize, include_self: bool) -> Result<Vec<Vec<Neighbor>>> {
        self.check_k(k, k + 1, self.len())?;
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.len()) {
            return Err(ResampleError::InvalidParameter {
                name: "row".to_string(),
                value: bad.to_string(),
                reason: format!("index holds {} rows", self.len()),
            });
        }

        let table = rows
            .par_iter()
            .map(|&row| self.row_neighbors(row, k, include_self))
            .collect();
        Ok(table)
    }

    fn row_neighbors(&self, row: usize, k: usize, include_self: bool) -> Vec<Neighbor> {
        let others = self.nearest(self.data.row(row), k, Some(row));
        if include_self {
            let mut out = Vec::with_capacity(k + 1);
            out.push(Neighbor { distance: 0.0, index: row });
            out.extend(others);
            out
        } else {
            others
        }
    }

    /// Partial sort with a max-heap of size k: O(n log k)
    fn nearest(&self, point: ArrayView1<f64>, k: usize, skip: Option<usize>) -> Vec<Neighbor> {
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, candidate) in self.data.rows().into_iter().enumerate() {
            if Some(i) == skip {
                continue;
            }
            let entry = DistIdx(Self::distance(point, candidate), i);
            if heap.len() < k {
                heap.push(entry);
            } else if let Some(top) = heap.peek() {
                if entry < *top {
                    heap.pop();
                    heap.push(entry);
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|DistIdx(distance, index)| Neighbor { distance, index })
            .collect()
    }

    /// `needed` counts the query row itself for row queries
    fn check_k(&self, k: usize, needed: usize, available: usize) -> Result<()> {
        if k == 0 {
            return Err(ResampleError::InvalidParameter {
                name: "n_neighbors".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if needed > available {
            return Err(ResampleError::NeighborCount { requested: needed, available });
        }
        Ok(())
    }

    fn check_dim(&self, dim: usize) -> Result<()> {
        if dim != self.data.ncols() {
            return Err(ResampleError::ShapeError {
                expected: format!("{} features", self.data.ncols()),
                actual: format!("{} features", dim),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn line() -> Array2<f64> {
        array![[0.0], [1.0], [3.0], [6.0], [10.0]]
    }

    #[test]
    fn test_query_row_includes_self_first() {
        let index = NearestNeighborIndex::build(&line());
        let nn = index.query_row(2, 2, true).unwrap();

        assert_eq!(nn.len(), 3);
        assert_eq!(nn[0], Neighbor { distance: 0.0, index: 2 });
        assert_eq!(nn[1].index, 1);
        // Rows 0 and 3 are both 3.0 away; the lower index wins
        assert_eq!(nn[2].index, 0);
        assert_relative_eq!(nn[2].distance, 3.0);
    }

    #[test]
    fn test_query_row_excludes_self() {
        let index = NearestNeighborIndex::build(&line());
        let nn = index.query_row(0, 2, false).unwrap();
        let ids: Vec<usize> = nn.iter().map(|n| n.index).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_rows_keep_self_first() {
        let x = array![[1.0, 1.0], [1.0, 1.0], [5.0, 5.0]];
        let index = NearestNeighborIndex::build(&x);
        let nn = index.query_row(1, 1, true).unwrap();
        assert_eq!(nn[0].index, 1);
        assert_eq!(nn[1].index, 0);
    }

    #[test]
    fn test_ties_break_by_index() {
        let x = array![[0.0], [-1.0], [1.0]];
        let index = NearestNeighborIndex::build(&x);
        let nn = index.query_row(0, 2, false).unwrap();
        assert_eq!(nn[0].index, 1);
        assert_eq!(nn[1].index, 2);
    }

    #[test]
    fn test_k_too_large_is_error() {
        let index = NearestNeighborIndex::build(&line());
        let err = index.query_row(0, 5, true).unwrap_err();
        assert!(matches!(err, ResampleError::NeighborCount { requested: 6, available: 5 }));
        assert!(index.kneighbors(&[0, 1], 5, false).is_err());
        assert!(index.query_row(0, 4, true).is_ok());
    }

    #[test]
    fn test_query_point_dimension_checked() {
        let index = NearestNeighborIndex::build(&line());
        let p = array![1.0, 2.0];
        assert!(index.query_point(p.view(), 1).is_err());
    }

    #[test]
    fn test_query_point_sorted() {
        let index = NearestNeighborIndex::build(&line());
        let p = array![5.0];
        let nn = index.query_point(p.view(), 3).unwrap();
        let ids: Vec<usize> = nn.iter().map(|n| n.index).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_kneighbors_matches_query_row() {
        let index = NearestNeighborIndex::build(&line());
        let table = index.kneighbors(&[4, 0, 2], 2, true).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0], index.query_row(4, 2, true).unwrap());
        assert_eq!(table[2], index.query_row(2, 2, true).unwrap());
    }

    #[test]
    fn test_build_from_rows_reindexes() {
        let index = NearestNeighborIndex::build_from_rows(&line(), &[1, 3, 4]);
        assert_eq!(index.len(), 3);
        let nn = index.query_row(0, 1, false).unwrap();
        assert_eq!(nn[0].index, 1);
        assert_relative_eq!(nn[0].distance, 5.0);
    }
}
