//! The persisted skin record.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::format::DEFAULT_DEFORMER_TYPE;
use crate::codec::{self, DenseWeightMatrix, SparseWeights};
use crate::util::{Error, Result};

/// Scalar deformer attributes, passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinAttributes {
    pub envelope: f64,
    pub skinning_method: i64,
    pub use_components: bool,
    pub normalize_weights: i64,
    pub deform_user_normals: bool,
}

impl Default for SkinAttributes {
    fn default() -> Self {
        Self {
            envelope: 1.0,
            skinning_method: 1,
            use_components: false,
            normalize_weights: 1,
            deform_user_normals: true,
        }
    }
}

/// Sparse weights of one skinned object plus everything needed to rebind it.
///
/// Built only through [`SkinRecord::new`], which checks:
/// - `vertex_count == row_offsets.len() - 1`
/// - every influence index `< influences.len()`
/// - influence names are unique
#[derive(Debug, Clone, PartialEq)]
pub struct SkinRecord {
    name: String,
    geometry: String,
    deformer_type: String,
    vertex_count: usize,
    influences: Vec<String>,
    weights: SparseWeights,
    secondary_weights: Vec<f64>,
    attributes: SkinAttributes,
}

impl SkinRecord {
    pub fn new(
        name: impl Into<String>,
        geometry: impl Into<String>,
        influences: Vec<String>,
        weights: SparseWeights,
        vertex_count: usize,
    ) -> Result<Self> {
        if weights.vertex_count() != vertex_count {
            return Err(Error::malformed(format!(
                "vertex count {} does not match {} encoded rows",
                vertex_count,
                weights.vertex_count()
            )));
        }
        weights.check_influence_count(influences.len())?;

        let mut seen = HashSet::with_capacity(influences.len());
        if let Some(dup) = influences.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(Error::malformed(format!("duplicate influence '{dup}'")));
        }

        Ok(Self {
            name: name.into(),
            geometry: geometry.into(),
            deformer_type: DEFAULT_DEFORMER_TYPE.to_string(),
            vertex_count,
            influences,
            weights,
            secondary_weights: Vec::new(),
            attributes: SkinAttributes::default(),
        })
    }

    /// Compress `dense` and build a record; the column order of `dense` must match `influences`.
    pub fn from_dense(
        name: impl Into<String>,
        geometry: impl Into<String>,
        influences: Vec<String>,
        dense: &DenseWeightMatrix,
    ) -> Result<Self> {
        if dense.influence_count() != influences.len() {
            return Err(Error::malformed(format!(
                "{} weight columns for {} influences",
                dense.influence_count(),
                influences.len()
            )));
        }
        Self::new(name, geometry, influences, codec::compress(dense), dense.vertex_count())
    }

    pub fn with_secondary_weights(mut self, secondary_weights: Vec<f64>) -> Self {
        self.secondary_weights = secondary_weights;
        self
    }

    pub fn with_attributes(mut self, attributes: SkinAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_deformer_type(mut self, deformer_type: impl Into<String>) -> Self {
        self.deformer_type = deformer_type.into();
        self
    }

    /// Deformer node name at export time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the skinned geometry.
    pub fn geometry(&self) -> &str {
        &self.geometry
    }

    pub fn deformer_type(&self) -> &str {
        &self.deformer_type
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Influence names; position is the column index.
    pub fn influences(&self) -> &[String] {
        &self.influences
    }

    pub fn weights(&self) -> &SparseWeights {
        &self.weights
    }

    pub fn secondary_weights(&self) -> &[f64] {
        &self.secondary_weights
    }

    pub fn attributes(&self) -> &SkinAttributes {
        &self.attributes
    }

    /// Expand the stored weights to the full vertex x influence grid.
    pub fn dense_weights(&self) -> Result<DenseWeightMatrix> {
        codec::decompress(&self.weights, self.influences.len())
    }
}
