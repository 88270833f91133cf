//! Compressed sparse row storage for TF-IDF features.
//!
//! Rows are kept sorted by column index so two rows can be compared and
//! dotted without hashing.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolaceError};

/// A sparse feature vector of fixed dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Build a vector from `(index, value)` pairs.
    ///
    /// Pairs are sorted, duplicate indices are summed and explicit zeros are
    /// dropped. Any index `>= dim` is rejected.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, f64)>) -> Result<Self> {
        pairs.sort_by_key(|&(idx, _)| idx);

        let mut indices = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            if idx >= dim {
                return Err(SolaceError::schema_mismatch(format!(
                    "feature index {idx} out of range for dimension {dim}"
                )));
            }
            if indices.last() == Some(&idx) {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                indices.push(idx);
                values.push(value);
            }
        }

        let (indices, values): (Vec<usize>, Vec<f64>) = indices
            .into_iter()
            .zip(values)
            .filter(|&(_, v)| v != 0.0)
            .unzip();

        Ok(SparseVector {
            dim,
            indices,
            values,
        })
    }

    /// An all-zero vector.
    pub fn zeros(dim: usize) -> Self {
        SparseVector {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// The dimension of the feature space.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Iterate over `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index`, zero when absent.
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Euclidean norm.
    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale every value so the vector has unit L2 norm. Zero vectors stay zero.
    pub fn normalize(&mut self) {
        let norm = self.l2_norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }

    /// Dot product against a dense weight slice of the same dimension.
    pub fn dot_dense(&self, weights: &[f64]) -> f64 {
        self.iter().map(|(idx, value)| weights[idx] * value).sum()
    }

    /// Expand into a dense vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (idx, value) in self.iter() {
            dense[idx] = value;
        }
        dense
    }
}

/// A row-major sparse matrix (CSR layout) with a fixed column count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// An empty matrix with zero rows.
    pub fn new(n_cols: usize) -> Self {
        SparseMatrix {
            n_cols,
            indptr: vec![0],
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Stack rows into a matrix. Every row must have dimension `n_cols`.
    pub fn from_rows(n_cols: usize, rows: Vec<SparseVector>) -> Result<Self> {
        let mut matrix = Self::new(n_cols);
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// Append one row.
    pub fn push_row(&mut self, row: SparseVector) -> Result<()> {
        if row.dim != self.n_cols {
            return Err(SolaceError::schema_mismatch(format!(
                "row has dimension {}, matrix has {} columns",
                row.dim, self.n_cols
            )));
        }
        self.indices.extend(row.indices);
        self.values.extend(row.values);
        self.indptr.push(self.indices.len());
        Ok(())
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Number of columns (the feature dimension).
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Total number of stored entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Borrow row `i` as `(index, value)` pairs.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.indptr[i];
        let end = self.indptr[i + 1];
        self.indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// Copy row `i` out as a [`SparseVector`].
    pub fn row_vector(&self, i: usize) -> SparseVector {
        let start = self.indptr[i];
        let end = self.indptr[i + 1];
        SparseVector {
            dim: self.n_cols,
            indices: self.indices[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }

    /// Dot product of row `i` with a dense weight slice.
    pub fn row_dot(&self, i: usize, weights: &[f64]) -> f64 {
        self.row(i).map(|(idx, value)| weights[idx] * value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = SparseVector::from_pairs(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (4, 0.0)]).unwrap();

        assert_eq!(v.dim(), 5);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(1, 2.0), (3, 1.5)]);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(0), 0.0);
        assert_eq!(v.to_dense(), vec![0.0, 2.0, 0.0, 1.5, 0.0]);
    }

    #[test]
    fn test_from_pairs_rejects_out_of_range() {
        let err = SparseVector::from_pairs(2, vec![(2, 1.0)]).unwrap_err();
        assert!(matches!(err, SolaceError::SchemaMismatch(_)));
    }

    #[test]
    fn test_normalize() {
        let mut v = SparseVector::from_pairs(3, vec![(0, 3.0), (2, 4.0)]).unwrap();
        v.normalize();
        assert!((v.l2_norm() - 1.0).abs() < 1e-12);
        assert!((v.get(0) - 0.6).abs() < 1e-12);

        let mut zero = SparseVector::zeros(3);
        zero.normalize();
        assert_eq!(zero.nnz(), 0);
    }

    #[test]
    fn test_matrix_rows() {
        let rows = vec![
            SparseVector::from_pairs(3, vec![(0, 1.0)]).unwrap(),
            SparseVector::zeros(3),
            SparseVector::from_pairs(3, vec![(1, 2.0), (2, 3.0)]).unwrap(),
        ];
        let matrix = SparseMatrix::from_rows(3, rows).unwrap();

        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.n_cols(), 3);
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.row(1).count(), 0);
        assert_eq!(matrix.row_dot(2, &[1.0, 1.0, 2.0]), 8.0);
        assert_eq!(matrix.row_vector(2).get(2), 3.0);
    }

    #[test]
    fn test_matrix_rejects_wrong_dimension() {
        let mut matrix = SparseMatrix::new(3);
        let err = matrix.push_row(SparseVector::zeros(4)).unwrap_err();
        assert!(matches!(err, SolaceError::SchemaMismatch(_)));
        assert_eq!(matrix.n_rows(), 0);
    }
}
