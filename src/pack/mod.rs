//! Pack manifests: the index of a batch of skin records exported together.
//!
//! A manifest is a small JSON file next to its member records:
//!
//! ```json
//! {
//!     "packFiles": [
//!         "body.skinrecord",
//!         "head.skinrecord"
//!     ],
//!     "rootPath": "/shots/010/skins"
//! }
//! ```
//!
//! With versioning on, [`PackManifest::export`] only snapshots the previous
//! manifest when the member list or root actually changed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::{strip_namespace, Error, Result};
use crate::versioning::VersionStore;

/// Root directory plus the ordered, duplicate-free member file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackManifest {
    #[serde(rename = "packFiles")]
    members: Vec<String>,
    #[serde(rename = "rootPath")]
    root_path: PathBuf,
}

impl PackManifest {
    /// Members keep their first-seen order; repeats are dropped.
    pub fn new<I, S>(root_path: impl Into<PathBuf>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for member in members {
            let member = member.into();
            if !unique.contains(&member) {
                unique.push(member);
            }
        }
        Self { members: unique, root_path: root_path.into() }
    }

    /// Manifest rooted at the directory containing `pack_path`.
    pub fn for_pack<I, S>(pack_path: impl AsRef<Path>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = pack_path.as_ref().parent().map(Path::to_path_buf).unwrap_or_default();
        Self::new(root, members)
    }

    /// File name of the record written for `object`: namespace stripped, `ext` appended.
    pub fn member_name(object: &str, ext: &str) -> String {
        format!("{}{}", strip_namespace(object), ext)
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Absolute paths of every member record.
    pub fn member_paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| self.root_path.join(m)).collect()
    }

    /// Canonical text: sorted keys, 4-space indent, trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(String::from_utf8(buf)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;
        Self::from_json(&text)
    }

    /// Write the manifest to `path`.
    ///
    /// Returns `false` and writes nothing when there are no members. With
    /// `versioning`, an existing manifest is snapshotted first unless it is
    /// identical to this one (or could not be read, which counts as changed).
    pub fn export(&self, path: impl AsRef<Path>, versioning: bool, versions: &VersionStore, keep: usize) -> Result<bool> {
        let path = path.as_ref();
        if self.is_empty() {
            tracing::warn!(pack = %path.display(), "no members to export, pack manifest not written");
            return Ok(false);
        }

        if versioning && path.is_file() {
            match Self::load(path) {
                Ok(previous) if previous == *self => {
                    tracing::debug!(pack = %path.display(), "pack unchanged, no new version");
                }
                Ok(_) => {
                    tracing::info!(pack = %path.display(), "pack change detected, versioning");
                    versions.snapshot(path, keep)?;
                }
                Err(err) => {
                    tracing::warn!(pack = %path.display(), error = %err, "previous pack unreadable, versioning");
                    versions.snapshot(path, keep)?;
                }
            }
        }

        fs::write(path, self.to_json()?)?;
        tracing::info!(pack = %path.display(), members = self.members.len(), "pack exported");
        Ok(true)
    }
}
