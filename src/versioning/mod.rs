//! Versioned snapshots of artifact files.
//!
//! - [`ArtifactPath`] - canonical path, version folder and version file names
//! - [`VersionStore`] - listing, snapshots and archiving
//! - [`ArchivePlan`] / [`ArchiveReport`] - staged renumbering after an archive

mod archive;
mod naming;
mod store;

pub use archive::{timestamp, ArchivePlan, ArchiveReport};
pub use naming::{ArtifactPath, ARCHIVE_DIR, VERSIONS_DIR, VERSION_FOLDER_SUFFIX};
pub use store::{VersionEntry, VersionLocation, VersionStore};
