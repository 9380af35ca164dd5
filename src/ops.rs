//! Batch export and import.
//!
//! Each batch keeps going past per-object problems: objects that do not
//! qualify are recorded as skipped, objects that fail are recorded with their
//! error, and the caller gets a [`BatchReport`] back. Only problems with the
//! batch as a whole (missing directory, unreadable manifest) are returned as
//! `Err`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::pack::PackManifest;
use crate::record::RecordStore;
use crate::scene::{capture_record, resolve_target, restore_onto, restore_record, RestoreOptions, SceneProvider};
use crate::util::{object_name_from_file, short_name, Error, Result};
use crate::versioning::VersionStore;

/// Why an object was left out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotSkinned,
    AlreadySkinned,
    NotInScene,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotSkinned => "no skin deformer",
            Self::AlreadySkinned => "already skinned",
            Self::NotInScene => "not in scene",
        })
    }
}

/// Per-object outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Objects (export) or artifact paths (import) that went through.
    pub succeeded: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    pub failed: Vec<(String, Error)>,
    /// Batch-level notes such as an empty batch.
    pub warnings: Vec<String>,
}

impl BatchReport {
    /// No object failed. Skips do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn skip(&mut self, name: &str, reason: SkipReason) {
        tracing::warn!(object = name, %reason, "skipped");
        self.skipped.push((name.to_string(), reason));
    }

    fn fail(&mut self, name: &str, err: Error) {
        tracing::error!(object = name, error = %err, "failed");
        self.failed.push((name.to_string(), err));
    }

    fn warn(&mut self, msg: String) {
        tracing::warn!("{msg}");
        self.warnings.push(msg);
    }

    fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation,
            succeeded = self.succeeded.len(),
            skipped = self.skipped.len(),
            failed = self.failed.len(),
            "batch done"
        );
    }
}

fn require_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::PathNotFound(dir.to_path_buf()))
    }
}

/// Why `object` cannot be exported, if anything.
fn export_skip<S: SceneProvider + ?Sized>(scene: &S, object: &str) -> Option<SkipReason> {
    if !scene.object_exists(object) {
        Some(SkipReason::NotInScene)
    } else if !scene.is_skinned(object) {
        Some(SkipReason::NotSkinned)
    } else {
        None
    }
}

/// Capture `object` and write it to `path`, snapshotting the previous file first.
fn export_one<S: SceneProvider + ?Sized>(
    scene: &S,
    object: &str,
    path: &Path,
    versioned: bool,
    store: &RecordStore,
    config: &Config,
) -> Result<()> {
    let record = capture_record(scene, object)?;
    if versioned {
        VersionStore::new().snapshot(path, config.keep_versions)?;
    }
    store.write(path, &record)
}

/// Export each object to `<dir>/<short name><file_ext>`.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), count = objects.len()))]
pub fn export_skins<S: SceneProvider + ?Sized>(
    scene: &S,
    dir: &Path,
    objects: &[String],
    versioned: bool,
    config: &Config,
) -> Result<BatchReport> {
    require_dir(dir)?;
    let store = RecordStore::from_config(config);
    let mut report = BatchReport::default();
    if objects.is_empty() {
        report.warn(Error::EmptyBatch.to_string());
        return Ok(report);
    }

    for object in objects {
        if let Some(reason) = export_skip(scene, object) {
            report.skip(object, reason);
            continue;
        }
        let path = dir.join(format!("{}{}", short_name(object), config.file_ext));
        match export_one(scene, object, &path, versioned, &store, config) {
            Ok(()) => {
                tracing::info!(object = %object, path = %path.display(), "skin exported");
                report.succeeded.push(object.clone());
            }
            Err(err) => report.fail(object, err),
        }
    }
    report.log_summary("export");
    Ok(report)
}

/// Record files in `dir` with extension `ext`, sorted by name.
fn record_files(dir: &Path, ext: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.ends_with(ext) && entry.path().is_file() {
            files.push((name, entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Read `path` and restore it onto the object its geometry resolves to.
///
/// `object` names the file in the report. Unresolvable geometry and, with
/// `config.skip_already_skinned`, an already skinned target are skips.
fn import_one<S: SceneProvider + ?Sized>(
    scene: &mut S,
    object: &str,
    path: &Path,
    store: &RecordStore,
    options: &RestoreOptions,
    config: &Config,
    report: &mut BatchReport,
) {
    let record = match store.read(path) {
        Ok(record) => record,
        Err(err) => return report.fail(object, err),
    };
    let Ok(target) = resolve_target(scene, record.geometry(), &options.strategies) else {
        return report.skip(object, SkipReason::NotInScene);
    };
    if config.skip_already_skinned && scene.is_skinned(&target) {
        return report.skip(object, SkipReason::AlreadySkinned);
    }
    match restore_onto(scene, target, &record, options) {
        Ok(_) => report.succeeded.push(path.display().to_string()),
        Err(err) => report.fail(object, err),
    }
}

/// Restore every record in `dir` whose object name is in `filter` (all when empty).
///
/// The object name is the file name up to its first `.`; the scene object is
/// resolved from the geometry stored in the record. Objects that do not
/// resolve in the scene are skipped, as are already-skinned ones when
/// `config.skip_already_skinned` is set.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn import_skins<S: SceneProvider + ?Sized>(
    scene: &mut S,
    dir: &Path,
    filter: &[String],
    config: &Config,
) -> Result<BatchReport> {
    require_dir(dir)?;
    let store = RecordStore::from_config(config);
    let options = RestoreOptions::from(config);
    let mut report = BatchReport::default();

    for (file_name, path) in record_files(dir, &config.file_ext)? {
        let object = object_name_from_file(&file_name);
        if !filter.is_empty() && !filter.iter().any(|f| f == object) {
            continue;
        }
        import_one(scene, object, &path, &store, &options, config, &mut report);
    }

    if report.succeeded.is_empty() && report.skipped.is_empty() && report.failed.is_empty() {
        report.warn(format!("no {} files to import in {}", config.file_ext, dir.display()));
    }
    report.log_summary("import");
    Ok(report)
}

/// Restore a specific version of one artifact, ignoring the skip settings.
///
/// `artifact` may be the canonical file or any of its version files.
/// Returns the new deformer name.
#[tracing::instrument(skip_all, fields(artifact = %artifact.display(), version = version))]
pub fn import_version<S: SceneProvider + ?Sized>(
    scene: &mut S,
    artifact: &Path,
    version: u32,
    config: &Config,
) -> Result<String> {
    let path = VersionStore::new().version_path(artifact, version)?;
    let record = RecordStore::from_config(config).read(&path)?;
    tracing::info!(path = %path.display(), "importing version");
    restore_record(scene, &record, &RestoreOptions::from(config))
}

/// Export each object next to `pack_path` and write the pack manifest.
///
/// Member files are named after the object without its namespace. The
/// manifest lists the members that were written; with none it is not
/// written and the report carries a warning.
#[tracing::instrument(skip_all, fields(pack = %pack_path.display(), count = objects.len()))]
pub fn export_pack<S: SceneProvider + ?Sized>(
    scene: &S,
    pack_path: &Path,
    objects: &[String],
    versioned: bool,
    config: &Config,
) -> Result<BatchReport> {
    let root = pack_path.parent().map(Path::to_path_buf).unwrap_or_default();
    require_dir(if root.as_os_str().is_empty() { Path::new(".") } else { root.as_path() })?;
    let store = RecordStore::from_config(config);
    let mut report = BatchReport::default();
    let mut members = Vec::new();

    for object in objects {
        if let Some(reason) = export_skip(scene, object) {
            report.skip(object, reason);
            continue;
        }
        let member = PackManifest::member_name(object, &config.file_ext);
        let path = root.join(&member);
        match export_one(scene, object, &path, versioned, &store, config) {
            Ok(()) => {
                tracing::info!(object = %object, path = %path.display(), "skin exported");
                report.succeeded.push(object.clone());
                members.push(member);
            }
            Err(err) => report.fail(object, err),
        }
    }

    let manifest = PackManifest::new(root, members);
    if !manifest.export(pack_path, versioned, &VersionStore::new(), config.keep_versions)? {
        report.warn(Error::EmptyBatch.to_string());
    }
    report.log_summary("export-pack");
    Ok(report)
}

/// Restore the members of a pack manifest from its root path.
///
/// Exactly the listed files are read; a listed file that is missing is a
/// failure.
#[tracing::instrument(skip_all, fields(pack = %pack_path.display()))]
pub fn import_pack<S: SceneProvider + ?Sized>(scene: &mut S, pack_path: &Path, config: &Config) -> Result<BatchReport> {
    let manifest = PackManifest::load(pack_path)?;
    let mut report = BatchReport::default();
    if manifest.is_empty() {
        report.warn(Error::EmptyBatch.to_string());
        return Ok(report);
    }

    let store = RecordStore::from_config(config);
    let options = RestoreOptions::from(config);
    for (member, path) in manifest.members().iter().zip(manifest.member_paths()) {
        let object = object_name_from_file(member);
        if !path.is_file() {
            report.fail(object, Error::PathNotFound(path));
            continue;
        }
        import_one(scene, object, &path, &store, &options, config, &mut report);
    }
    report.log_summary("import-pack");
    Ok(report)
}
