//! Sparse (compressed-row) weight encoding.
//!
//! Layout:
//! - `values[k]` - k-th nonzero weight in vertex-major scan order
//! - `influence_indices[k]` - column of `values[k]`
//! - `row_offsets[v]..row_offsets[v + 1]` - range of row `v`
//!
//! `row_offsets` has `V + 1` entries, starts at 0, never decreases and ends
//! at `values.len()`.

use super::DenseWeightMatrix;
use crate::util::{Error, Result};

/// Nonzero weights of a dense matrix plus the index data to rebuild it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseWeights {
    values: Vec<f64>,
    influence_indices: Vec<usize>,
    row_offsets: Vec<usize>,
}

impl SparseWeights {
    /// Build from raw parallel arrays, rejecting anything that breaks the layout.
    pub fn new(values: Vec<f64>, influence_indices: Vec<usize>, row_offsets: Vec<usize>) -> Result<Self> {
        let weights = Self { values, influence_indices, row_offsets };
        weights.validate()?;
        Ok(weights)
    }

    fn validate(&self) -> Result<()> {
        if self.values.len() != self.influence_indices.len() {
            return Err(Error::malformed(format!(
                "{} weights but {} influence indices",
                self.values.len(),
                self.influence_indices.len()
            )));
        }
        match self.row_offsets.first() {
            Some(0) => {}
            Some(first) => {
                return Err(Error::malformed(format!("row offsets start at {first}, expected 0")));
            }
            None => return Err(Error::malformed("row offsets are empty")),
        }
        if let Some(v) = self.row_offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::malformed(format!(
                "row offsets decrease at vertex {}: {} -> {}",
                v,
                self.row_offsets[v],
                self.row_offsets[v + 1]
            )));
        }
        let last = self.row_offsets[self.row_offsets.len() - 1];
        if last != self.values.len() {
            return Err(Error::malformed(format!(
                "final row offset {} does not match {} stored weights",
                last,
                self.values.len()
            )));
        }
        Ok(())
    }

    /// Reject any influence index `>= influence_count`.
    pub fn check_influence_count(&self, influence_count: usize) -> Result<()> {
        match self.influence_indices.iter().copied().max() {
            Some(max) if max >= influence_count => Err(Error::malformed(format!(
                "influence index {max} out of range for {influence_count} influences"
            ))),
            _ => Ok(()),
        }
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn influence_indices(&self) -> &[usize] {
        &self.influence_indices
    }

    #[inline]
    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    /// Number of encoded vertices (`row_offsets.len() - 1`).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.row_offsets.len() - 1
    }

    /// Number of stored nonzero cells.
    #[inline]
    pub fn nonzero_count(&self) -> usize {
        self.values.len()
    }

    /// `(influence, weight)` pairs of one vertex.
    pub fn row(&self, vertex: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_offsets[vertex]..self.row_offsets[vertex + 1];
        self.influence_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }
}

/// Encode a dense matrix.
///
/// Cells equal to exactly `0.0` are dropped; there is no epsilon. Anything
/// else, including denormals and negative values, is kept so reference
/// encodings match bit for bit.
pub fn compress(dense: &DenseWeightMatrix) -> SparseWeights {
    let mut values = Vec::new();
    let mut influence_indices = Vec::new();
    let mut row_offsets = Vec::with_capacity(dense.vertex_count() + 1);
    row_offsets.push(0);

    for row in dense.rows() {
        for (influence, &w) in row.iter().enumerate() {
            if w != 0.0 {
                values.push(w);
                influence_indices.push(influence);
            }
        }
        row_offsets.push(values.len());
    }

    SparseWeights { values, influence_indices, row_offsets }
}

/// Rebuild the `V x influence_count` dense matrix. Uncovered cells stay `0.0`
/// and rows are not renormalized.
pub fn decompress(sparse: &SparseWeights, influence_count: usize) -> Result<DenseWeightMatrix> {
    sparse.check_influence_count(influence_count)?;

    let mut dense = DenseWeightMatrix::zeros(sparse.vertex_count(), influence_count);
    for vertex in 0..sparse.vertex_count() {
        for (influence, w) in sparse.row(vertex) {
            dense.set(vertex, influence, w);
        }
    }
    Ok(dense)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_reference_layout() {
        let dense = DenseWeightMatrix::from_rows(&[[0.0, 1.0, 0.0], [0.5, 0.5, 0.0]], 3).unwrap();
        let sparse = compress(&dense);

        assert_eq!(sparse.values(), &[1.0, 0.5, 0.5]);
        assert_eq!(sparse.influence_indices(), &[1, 0, 1]);
        assert_eq!(sparse.row_offsets(), &[0, 1, 3]);
        assert_eq!(sparse.vertex_count(), 2);
    }

    #[test]
    fn test_roundtrip_restores_dense() {
        let rows = [
            [0.2, 0.0, 0.8, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.1, 0.2, 0.3, 0.4],
        ];
        let dense = DenseWeightMatrix::from_rows(&rows, 4).unwrap();
        let sparse = compress(&dense);
        assert_eq!(sparse.row_offsets(), &[0, 2, 2, 3, 7]);

        let back = decompress(&sparse, 4).unwrap();
        assert_eq!(back, dense);
    }

    #[test]
    fn test_exact_zero_cut() {
        // Tiny nonzero values survive, negative zero is dropped.
        let dense = DenseWeightMatrix::new(1, 3, vec![1e-300, -0.0, f64::MIN_POSITIVE]).unwrap();
        let sparse = compress(&dense);
        assert_eq!(sparse.influence_indices(), &[0, 2]);
        assert_eq!(sparse.values()[0].to_bits(), 1e-300f64.to_bits());
    }

    #[test]
    fn test_empty_matrix() {
        let sparse = compress(&DenseWeightMatrix::zeros(0, 5));
        assert_eq!(sparse.row_offsets(), &[0]);
        assert_eq!(decompress(&sparse, 5).unwrap().vertex_count(), 0);
    }

    #[test]
    fn test_malformed_offsets() {
        let err = SparseWeights::new(vec![1.0, 1.0], vec![0, 1], vec![0, 2, 1]).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));

        let err = SparseWeights::new(vec![1.0], vec![0], vec![1, 1]).unwrap_err();
        assert!(err.to_string().contains("start at 1"));

        let err = SparseWeights::new(vec![1.0, 0.5], vec![0, 1], vec![0, 1]).unwrap_err();
        assert!(err.to_string().contains("final row offset"));

        let err = SparseWeights::new(vec![1.0], vec![0, 1], vec![0, 1]).unwrap_err();
        assert!(err.to_string().contains("influence indices"));

        assert!(SparseWeights::new(vec![], vec![], vec![]).is_err());
    }

    #[test]
    fn test_influence_out_of_range() {
        let sparse = SparseWeights::new(vec![1.0], vec![3], vec![0, 1]).unwrap();
        assert!(decompress(&sparse, 4).is_ok());
        let err = decompress(&sparse, 3).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));
    }
}
