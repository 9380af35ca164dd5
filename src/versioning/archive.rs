//! Archiving versions and renumbering what remains.
//!
//! Removing an interior version shifts every higher version down by one, and
//! each shifted name collides with its neighbour's old name. The plan is built
//! and validated up front, then applied in two passes through staging names so
//! no rename can overwrite a file that has not moved yet. If a rename fails
//! the moves already made are undone in reverse order.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::naming::ArtifactPath;
use super::store::{VersionEntry, VersionLocation};
use crate::util::{Error, Result};

/// Suffix of the temporary names used while renumbering.
const STAGING_SUFFIX: &str = ".staging";

/// Local time formatted as an archive directory name (`2024-03-09-174501`).
pub fn timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    time::format_description::parse_borrowed::<2>("[year]-[month]-[day]-[hour][minute][second]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_else(|| now.unix_timestamp().to_string())
}

/// Outcome of an archive operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Directory the archived versions were moved into (`None` if nothing was archived).
    pub archive_dir: Option<PathBuf>,
    /// Archived files at their new location.
    pub archived: Vec<PathBuf>,
    /// `(old, new)` paths of renumbered versions.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Number of versions left.
    pub remaining: u32,
}

#[derive(Debug, Clone)]
struct Move {
    from: PathBuf,
    staging: PathBuf,
    to: PathBuf,
    archived: bool,
}

/// Fully computed and validated set of moves for one archive call.
#[derive(Debug)]
pub struct ArchivePlan {
    archive_dir: Option<PathBuf>,
    moves: Vec<Move>,
    remaining: u32,
}

impl ArchivePlan {
    /// Compute every source and target for archiving `selected` out of `entries`.
    pub fn build(artifact: &ArtifactPath, entries: &[VersionEntry], selected: &[u32], stamp: &str) -> Result<Self> {
        let mut selected: Vec<u32> = selected.to_vec();
        selected.sort_unstable();
        selected.dedup();

        if let Some(&missing) = selected.iter().find(|n| !entries.iter().any(|e| e.number == **n)) {
            return Err(Error::VersionNotFound { path: artifact.path(), version: missing });
        }
        if !entries.is_empty() && selected.len() >= entries.len() {
            return Err(Error::CannotArchiveAll { path: artifact.path(), count: entries.len() });
        }
        if selected.is_empty() {
            return Ok(Self { archive_dir: None, moves: Vec::new(), remaining: entries.len() as u32 });
        }

        let archive_dir = unique_dir(&artifact.archive_root().join(stamp));
        let had_canonical = entries.last().is_some_and(VersionEntry::is_latest);
        let folder = artifact.version_folder();

        let mut moves = Vec::new();
        let mut kept = entries.iter().filter(|e| !selected.contains(&e.number)).peekable();
        let mut number = 0u32;
        while let Some(entry) = kept.next() {
            number += 1;
            let to = if kept.peek().is_none() && had_canonical {
                artifact.path()
            } else {
                artifact.version_file(number)
            };
            if to != entry.path {
                moves.push(Move::new(&folder, entry, to, false));
            }
        }
        let remaining = number;

        for entry in entries.iter().filter(|e| selected.contains(&e.number)) {
            let to = archive_dir.join(artifact.version_file_name(entry.number));
            moves.push(Move::new(&folder, entry, to, true));
        }

        let plan = Self { archive_dir: Some(archive_dir), moves, remaining };
        plan.validate()?;
        Ok(plan)
    }

    /// Reject plans whose targets or staging names hit files that are not moving.
    fn validate(&self) -> Result<()> {
        let sources: HashSet<&Path> = self.moves.iter().map(|m| m.from.as_path()).collect();
        let mut targets = HashSet::new();
        for m in &self.moves {
            if !m.from.is_file() {
                return Err(Error::PathNotFound(m.from.clone()));
            }
            if !targets.insert(m.to.as_path()) {
                return Err(collision(&m.to));
            }
            if m.to.exists() && !sources.contains(m.to.as_path()) {
                return Err(collision(&m.to));
            }
            if m.staging.exists() {
                return Err(collision(&m.staging));
            }
        }
        Ok(())
    }

    /// Execute the plan: everything to staging names, then to final names.
    pub fn apply(&self) -> Result<()> {
        if let Some(dir) = &self.archive_dir {
            fs::create_dir_all(dir)?;
            tracing::info!(archive_dir = %dir.display(), "archiving versions");
        }

        let mut journal: Vec<(&Path, &Path)> = Vec::with_capacity(self.moves.len() * 2);
        let result = self.run(&mut journal);
        if let Err(err) = result {
            tracing::error!(error = %err, applied = journal.len(), "archive failed, rolling back");
            for (from, to) in journal.iter().rev() {
                if let Err(e) = fs::rename(to, from) {
                    tracing::error!(from = %to.display(), to = %from.display(), error = %e, "rollback rename failed");
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn run<'a>(&'a self, journal: &mut Vec<(&'a Path, &'a Path)>) -> Result<()> {
        for m in &self.moves {
            fs::rename(&m.from, &m.staging)?;
            journal.push((&m.from, &m.staging));
        }
        for m in &self.moves {
            fs::rename(&m.staging, &m.to)?;
            journal.push((&m.staging, &m.to));
            if m.archived {
                tracing::info!(file = %m.to.display(), "archived");
            } else {
                tracing::debug!(from = %m.from.display(), to = %m.to.display(), "renumbered");
            }
        }
        Ok(())
    }

    pub fn into_report(self) -> ArchiveReport {
        let (archived, renamed): (Vec<Move>, Vec<Move>) = self.moves.into_iter().partition(|m| m.archived);
        ArchiveReport {
            archive_dir: self.archive_dir,
            archived: archived.into_iter().map(|m| m.to).collect(),
            renamed: renamed.into_iter().map(|m| (m.from, m.to)).collect(),
            remaining: self.remaining,
        }
    }
}

impl Move {
    fn new(folder: &Path, entry: &VersionEntry, to: PathBuf, archived: bool) -> Self {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Canonical files are staged as `<name><ext>.latest.staging` so they can
        // never clash with a staged `<name>.vNNNN<ext>`.
        let staging_name = match entry.location {
            VersionLocation::Canonical => format!("{name}.latest{STAGING_SUFFIX}"),
            VersionLocation::Folder => format!("{name}{STAGING_SUFFIX}"),
        };
        Self { from: entry.path.clone(), staging: folder.join(staging_name), to, archived }
    }
}

fn collision(path: &Path) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("archive target already exists: {}", path.display()),
    ))
}

/// `dir`, or `dir-1`, `dir-2`, ... if it already exists.
fn unique_dir(dir: &Path) -> PathBuf {
    if !dir.exists() {
        return dir.to_path_buf();
    }
    let base = dir.as_os_str().to_string_lossy().into_owned();
    (1..)
        .map(|i| PathBuf::from(format!("{base}-{i}")))
        .find(|p| !p.exists())
        .unwrap_or_else(|| dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::VersionStore;

    fn history(dir: &Path, count: u32) -> PathBuf {
        let path = dir.join("body.skinrecord");
        let store = VersionStore::new();
        for n in 1..=count {
            fs::write(&path, format!("v{n}")).unwrap();
            store.snapshot(&path, 0).unwrap();
        }
        fs::write(&path, format!("v{}", count + 1)).unwrap();
        path
    }

    #[test]
    fn test_timestamp_format() {
        let stamp = timestamp();
        assert_eq!(stamp.len(), 17, "{stamp}");
        assert!(stamp.chars().enumerate().all(|(i, c)| match i {
            4 | 7 | 10 => c == '-',
            _ => c.is_ascii_digit(),
        }));
    }

    #[test]
    fn test_plan_moves() {
        let dir = tempfile::tempdir().unwrap();
        let path = history(dir.path(), 2);
        let artifact = ArtifactPath::new(&path).unwrap();
        let entries = VersionStore::new().versions(&path).unwrap();

        let report = ArchivePlan::build(&artifact, &entries, &[1], "stamp").unwrap().into_report();
        assert_eq!(report.remaining, 2);
        assert_eq!(report.renamed, vec![(artifact.version_file(2), artifact.version_file(1))]);
        assert_eq!(report.archived, vec![artifact.archive_root().join("stamp").join("body.v0001.skinrecord")]);
    }

    #[test]
    fn test_failed_rename_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = history(dir.path(), 2);
        let artifact = ArtifactPath::new(&path).unwrap();
        let entries = VersionStore::new().versions(&path).unwrap();
        let plan = ArchivePlan::build(&artifact, &entries, &[1], "stamp").unwrap();

        // A directory at the archive target makes the last rename fail after
        // the renumbering has already happened.
        let blocker = artifact.archive_root().join("stamp").join("body.v0001.skinrecord");
        fs::create_dir_all(blocker.join("occupied")).unwrap();

        assert!(plan.apply().is_err());
        let read = |p: PathBuf| fs::read_to_string(p).unwrap();
        assert_eq!(read(artifact.version_file(1)), "v1");
        assert_eq!(read(artifact.version_file(2)), "v2");
        assert_eq!(read(path.clone()), "v3");
        let staged: Vec<_> = fs::read_dir(artifact.version_folder())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(STAGING_SUFFIX))
            .collect();
        assert!(staged.is_empty());
        assert!(blocker.is_dir());
    }
}
