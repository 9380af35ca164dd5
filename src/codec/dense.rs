//! Dense vertex x influence weight grid.

use crate::util::{Error, Result};

/// Full `V x I` weight grid, stored vertex-major, influence-minor.
///
/// This is the layout the scene provider hands over and the codec scans;
/// the iteration order is part of the contract. Rows are not normalized here.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseWeightMatrix {
    vertex_count: usize,
    influence_count: usize,
    values: Vec<f64>,
}

impl DenseWeightMatrix {
    /// Wrap a flat row-major buffer. `values.len()` must be `vertex_count * influence_count`.
    pub fn new(vertex_count: usize, influence_count: usize, values: Vec<f64>) -> Result<Self> {
        let expected = vertex_count
            .checked_mul(influence_count)
            .ok_or_else(|| Error::malformed("dense matrix dimensions overflow"))?;
        if values.len() != expected {
            return Err(Error::malformed(format!(
                "dense matrix has {} cells, expected {}x{}={}",
                values.len(),
                vertex_count,
                influence_count,
                expected
            )));
        }
        Ok(Self { vertex_count, influence_count, values })
    }

    /// All-zero matrix.
    pub fn zeros(vertex_count: usize, influence_count: usize) -> Self {
        Self {
            vertex_count,
            influence_count,
            values: vec![0.0; vertex_count * influence_count],
        }
    }

    /// Build from per-vertex rows. Every row must have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R], influence_count: usize) -> Result<Self> {
        let mut values = Vec::with_capacity(rows.len() * influence_count);
        for (v, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != influence_count {
                return Err(Error::malformed(format!(
                    "row {} has {} weights, expected {}",
                    v,
                    row.len(),
                    influence_count
                )));
            }
            values.extend_from_slice(row);
        }
        Ok(Self { vertex_count: rows.len(), influence_count, values })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub fn influence_count(&self) -> usize {
        self.influence_count
    }

    /// Flat row-major cell buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Weight of `influence` on `vertex`, or `None` when out of range.
    pub fn get(&self, vertex: usize, influence: usize) -> Option<f64> {
        if vertex >= self.vertex_count || influence >= self.influence_count {
            return None;
        }
        Some(self.values[vertex * self.influence_count + influence])
    }

    pub(crate) fn set(&mut self, vertex: usize, influence: usize, value: f64) {
        self.values[vertex * self.influence_count + influence] = value;
    }

    /// Weights of one vertex across all influences.
    pub fn row(&self, vertex: usize) -> &[f64] {
        let start = vertex * self.influence_count;
        &self.values[start..start + self.influence_count]
    }

    /// Iterate rows in vertex order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.vertex_count).map(move |v| self.row(v))
    }
}
