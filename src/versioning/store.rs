//! Version listing and snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::archive::{self, ArchiveReport};
use super::naming::ArtifactPath;
use crate::util::{Error, Result};

/// Where a version lives on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLocation {
    /// Inside the artifact's version folder.
    Folder,
    /// At the artifact's canonical path (the latest version).
    Canonical,
}

/// One version of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub number: u32,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub location: VersionLocation,
}

impl VersionEntry {
    fn at(number: u32, path: PathBuf, location: VersionLocation) -> Self {
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self { number, path, modified, location }
    }

    pub fn is_latest(&self) -> bool {
        self.location == VersionLocation::Canonical
    }
}

/// Numbered snapshots of artifacts in `_versions` folders.
///
/// Older versions `1..N-1` live in the version folder and the canonical file is
/// version `N`. Every operation keeps the numbers contiguous from 1. Callers
/// serialize access to a given artifact; there is no cross-process locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionStore;

impl VersionStore {
    pub fn new() -> Self {
        Self
    }

    /// Numbered files in the version folder, sorted by number.
    fn folder_versions(&self, artifact: &ArtifactPath) -> Result<Vec<(u32, PathBuf)>> {
        let folder = artifact.version_folder();
        if !folder.is_dir() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(&folder)? {
            let entry = entry?;
            let name = entry.file_name();
            match name.to_str().and_then(|n| artifact.parse_version(n)) {
                Some(n) => found.push((n, entry.path())),
                None => tracing::debug!(file = ?name, "ignoring non-version file in version folder"),
            }
        }
        found.sort_by_key(|(n, _)| *n);
        Ok(found)
    }

    /// Number and target path for the next snapshot of `path`.
    pub fn next_version(&self, path: impl AsRef<Path>) -> Result<(u32, PathBuf)> {
        let artifact = ArtifactPath::resolve(path)?;
        let next = self
            .folder_versions(&artifact)?
            .last()
            .map_or(1, |(n, _)| n + 1);
        Ok((next, artifact.version_file(next)))
    }

    /// All versions, oldest first; the canonical file (if present) is last.
    pub fn versions(&self, path: impl AsRef<Path>) -> Result<Vec<VersionEntry>> {
        let artifact = ArtifactPath::resolve(path)?;
        let mut entries: Vec<VersionEntry> = self
            .folder_versions(&artifact)?
            .into_iter()
            .map(|(n, p)| VersionEntry::at(n, p, VersionLocation::Folder))
            .collect();

        let canonical = artifact.path();
        if canonical.is_file() {
            let number = entries.last().map_or(1, |e| e.number + 1);
            entries.push(VersionEntry::at(number, canonical, VersionLocation::Canonical));
        }
        Ok(entries)
    }

    /// Highest version number, 0 when the artifact has no versions.
    pub fn current_version(&self, path: impl AsRef<Path>) -> Result<u32> {
        Ok(self.versions(path)?.last().map_or(0, |e| e.number))
    }

    /// File holding `version` of the artifact.
    pub fn version_path(&self, path: impl AsRef<Path>, version: u32) -> Result<PathBuf> {
        let path = path.as_ref();
        self.versions(path)?
            .into_iter()
            .find(|e| e.number == version)
            .map(|e| e.path)
            .ok_or_else(|| Error::VersionNotFound { path: path.to_path_buf(), version })
    }

    /// Copy the current artifact into its version folder.
    ///
    /// Returns `None` when the artifact does not exist yet. With `keep > 0`,
    /// the oldest folder versions are archived so at most `keep` remain.
    pub fn snapshot(&self, path: impl AsRef<Path>, keep: usize) -> Result<Option<VersionEntry>> {
        let artifact = ArtifactPath::resolve(path)?;
        let canonical = artifact.path();
        if !canonical.is_file() {
            tracing::info!(path = %canonical.display(), "nothing to snapshot, artifact does not exist");
            return Ok(None);
        }

        fs::create_dir_all(artifact.version_folder())?;
        let (version, target) = self.next_version(&canonical)?;
        fs::copy(&canonical, &target)?;
        tracing::info!(version, target = %target.display(), "snapshot created");

        if keep > 0 {
            let folder = self.folder_versions(&artifact)?;
            if folder.len() <= keep {
                return Ok(Some(VersionEntry::at(version, target, VersionLocation::Folder)));
            }
            let oldest: Vec<u32> = folder[..folder.len() - keep].iter().map(|(n, _)| *n).collect();
            self.archive(&canonical, &oldest)?;
            let kept = keep as u32;
            return Ok(Some(VersionEntry::at(kept, artifact.version_file(kept), VersionLocation::Folder)));
        }
        Ok(Some(VersionEntry::at(version, target, VersionLocation::Folder)))
    }

    /// Move the `selected` versions into a timestamped archive directory and
    /// renumber the rest to `1..=remaining`.
    pub fn archive(&self, path: impl AsRef<Path>, selected: &[u32]) -> Result<ArchiveReport> {
        self.archive_with_stamp(path, selected, &archive::timestamp())
    }

    /// [`VersionStore::archive`] with an explicit archive directory name.
    pub fn archive_with_stamp(&self, path: impl AsRef<Path>, selected: &[u32], stamp: &str) -> Result<ArchiveReport> {
        let artifact = ArtifactPath::resolve(path)?;
        let entries = self.versions(artifact.path())?;
        let plan = archive::ArchivePlan::build(&artifact, &entries, selected, stamp)?;
        plan.apply()?;

        let folder = artifact.version_folder();
        if folder.is_dir() && fs::read_dir(&folder)?.next().is_none() {
            fs::remove_dir(&folder)?;
            tracing::debug!(folder = %folder.display(), "removed empty version folder");
        }
        Ok(plan.into_report())
    }
}
