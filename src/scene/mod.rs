//! Scene provider interface and record capture/restore.
//!
//! The host application owns the scene: object lookup, deformer binding and
//! weight application all go through [`SceneProvider`]. [`MemoryScene`] is a
//! JSON-backed implementation used by the CLI and the tests.

mod memory;
mod resolve;
mod transfer;

pub use memory::{MemoryScene, SceneObject, SkinBinding};
pub use resolve::{resolve_target, ResolveStrategy};
pub use transfer::{capture_record, filter_secondary_weights, restore_onto, restore_record, RestoreOptions, MISSING_INFLUENCE_GROUP};

use crate::codec::DenseWeightMatrix;
use crate::record::SkinAttributes;
use crate::util::Result;

/// Access to deformable objects and their skin bindings.
///
/// Getters describe an existing binding; the `bind`/`apply_*` calls rebuild one.
/// Influence order returned by [`SceneProvider::influences`] is the column
/// order of [`SceneProvider::dense_weights`].
pub trait SceneProvider {
    /// Names of all deformable objects.
    fn objects(&self) -> Vec<String>;

    fn object_exists(&self, object: &str) -> bool;

    /// Whether `object` already has a skin binding.
    fn is_skinned(&self, object: &str) -> bool;

    fn vertex_count(&self, object: &str) -> Result<usize>;

    /// Name of the deformer bound to `object`.
    fn deformer_name(&self, object: &str) -> Result<String>;

    fn influences(&self, object: &str) -> Result<Vec<String>>;

    fn dense_weights(&self, object: &str) -> Result<DenseWeightMatrix>;

    /// Per-vertex blend weights as stored on the deformer.
    fn secondary_weights(&self, object: &str) -> Result<Vec<f64>>;

    fn scalar_attrs(&self, object: &str) -> Result<SkinAttributes>;

    fn influence_exists(&self, influence: &str) -> bool;

    /// Create a placeholder influence under `group`.
    fn create_influence(&mut self, influence: &str, group: &str) -> Result<()>;

    /// Replace any existing binding on `object` with one driven by `influences`.
    /// Returns the new deformer name.
    fn bind(&mut self, object: &str, influences: &[String]) -> Result<String>;

    /// Set weights; columns follow the order passed to [`SceneProvider::bind`].
    fn apply_dense_weights(&mut self, object: &str, weights: &DenseWeightMatrix) -> Result<()>;

    fn apply_secondary_weights(&mut self, object: &str, weights: &[f64]) -> Result<()>;

    fn apply_scalar_attrs(&mut self, object: &str, attrs: &SkinAttributes) -> Result<()>;
}
