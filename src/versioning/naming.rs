//! Version folder layout and file naming.
//!
//! ```text
//! <dir>/<name><ext>                                          latest
//! <dir>/_versions/<name><ext>.versions/<name>.v0001<ext>     older versions
//! <dir>/_versions/_archive/<timestamp>/<name>.v0001<ext>     archived versions
//! ```

use std::path::{Path, PathBuf};

use crate::util::{Error, Result};

/// Name of the directory holding all version folders of a directory.
pub const VERSIONS_DIR: &str = "_versions";

/// Name of the archive directory inside [`VERSIONS_DIR`].
pub const ARCHIVE_DIR: &str = "_archive";

/// Suffix of a per-artifact version folder.
pub const VERSION_FOLDER_SUFFIX: &str = ".versions";

/// An artifact's canonical path split into the parts version names are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPath {
    dir: PathBuf,
    file_name: String,
    stem: String,
    ext: String,
}

impl ArtifactPath {
    /// Split a canonical artifact path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::PathNotFound(path.to_path_buf()))?
            .to_string();
        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
            _ => (file_name.clone(), String::new()),
        };
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self { dir, file_name, stem, ext })
    }

    /// Like [`ArtifactPath::new`], but a path to one of the artifact's own
    /// version files is mapped back to the canonical artifact.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let candidate = Self::new(path)?;
        let Some(folder) = path.parent() else {
            return Ok(candidate);
        };
        let folder_name = folder.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let Some(artifact_name) = folder_name.strip_suffix(VERSION_FOLDER_SUFFIX) else {
            return Ok(candidate);
        };
        let Some(versions_root) = folder.parent() else {
            return Ok(candidate);
        };
        if versions_root.file_name().and_then(|n| n.to_str()) != Some(VERSIONS_DIR) {
            return Ok(candidate);
        }

        let base_dir = versions_root.parent().map(Path::to_path_buf).unwrap_or_default();
        let artifact = Self::new(base_dir.join(artifact_name))?;
        if artifact.parse_version(&candidate.file_name).is_some() {
            Ok(artifact)
        } else {
            Ok(candidate)
        }
    }

    /// Canonical (latest) path.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `<dir>/_versions`
    pub fn versions_root(&self) -> PathBuf {
        self.dir.join(VERSIONS_DIR)
    }

    /// `<dir>/_versions/<name><ext>.versions`
    pub fn version_folder(&self) -> PathBuf {
        self.versions_root()
            .join(format!("{}{}", self.file_name, VERSION_FOLDER_SUFFIX))
    }

    /// `<dir>/_versions/_archive`
    pub fn archive_root(&self) -> PathBuf {
        self.versions_root().join(ARCHIVE_DIR)
    }

    /// `<name>.v0007<ext>`
    pub fn version_file_name(&self, version: u32) -> String {
        format!("{}.v{:04}{}", self.stem, version, self.ext)
    }

    /// Path of `version` inside the version folder.
    pub fn version_file(&self, version: u32) -> PathBuf {
        self.version_folder().join(self.version_file_name(version))
    }

    /// Version number encoded in `file_name`, if it names a version of this artifact.
    pub fn parse_version(&self, file_name: &str) -> Option<u32> {
        let digits = file_name
            .strip_prefix(self.stem.as_str())?
            .strip_prefix(".v")?
            .strip_suffix(self.ext.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().filter(|&n| n > 0)
    }
}
