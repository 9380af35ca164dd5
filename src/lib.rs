//! # skinio
//!
//! Persisting and restoring skin weights, with numbered version history.
//!
//! A skinned object's dense vertex x influence weight grid is packed into a
//! sparse [`codec::SparseWeights`], wrapped into a [`record::SkinRecord`] with
//! its influence names and deformer attributes, and written as a small
//! field-tagged binary file. Every write can first snapshot the previous file
//! into a `_versions` folder, and old versions can be archived with the rest
//! renumbered.
//!
//! ## Modules
//!
//! - [`util`] - Errors and object name helpers
//! - [`codec`] - Dense/sparse weight conversion
//! - [`record`] - Skin records and their on-disk format
//! - [`versioning`] - Version folders, snapshots and archives
//! - [`pack`] - Manifests for batches exported together
//! - [`scene`] - Scene provider interface, capture and restore
//! - [`ops`] - Batch export/import
//! - [`config`] - Settings passed to the above
//!
//! ## Example
//!
//! ```ignore
//! use skinio::prelude::*;
//!
//! let scene = MemoryScene::load("scene.json")?;
//! let record = capture_record(&scene, "body")?;
//! RecordStore::new().write("skins/body.skinrecord", &record)?;
//!
//! let versions = VersionStore::new();
//! versions.snapshot("skins/body.skinrecord", 0)?;
//! ```

pub mod util;
pub mod codec;
pub mod record;
pub mod versioning;
pub mod pack;
pub mod scene;
pub mod ops;
pub mod config;

// Re-export commonly used types
pub use util::{Error, Result};
pub use config::Config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::codec::{compress, decompress, DenseWeightMatrix, SparseWeights};
    pub use crate::record::{RecordStore, SkinAttributes, SkinRecord};
    pub use crate::versioning::{VersionEntry, VersionStore};
    pub use crate::pack::PackManifest;
    pub use crate::scene::{capture_record, restore_record, MemoryScene, RestoreOptions, SceneProvider};
    pub use crate::ops::{BatchReport, SkipReason};
    pub use crate::config::{Config, MissingInfluencePolicy};
}
