//! Integration tests for version folders, snapshots and archives.

use std::fs;
use std::path::{Path, PathBuf};

use skinio::versioning::{VersionLocation, VersionStore};
use skinio::Error;
use tempfile::TempDir;

fn write(path: &Path, text: &str) {
    fs::write(path, text).expect("Failed to write artifact");
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}

fn version_folder(dir: &Path) -> PathBuf {
    dir.join("_versions").join("body.skinrecord.versions")
}

fn numbers(store: &VersionStore, path: &Path) -> Vec<u32> {
    store
        .versions(path)
        .expect("Failed to list versions")
        .iter()
        .map(|e| e.number)
        .collect()
}

/// Canonical file plus `count` snapshots; snapshot `n` holds "v{n}", canonical "v{count+1}".
fn with_history(count: u32) -> (TempDir, PathBuf, VersionStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("body.skinrecord");
    let store = VersionStore::new();
    for n in 1..=count {
        write(&path, &format!("v{n}"));
        store.snapshot(&path, 0).expect("Failed to snapshot");
    }
    write(&path, &format!("v{}", count + 1));
    (dir, path, store)
}

#[test]
fn test_next_version_on_new_artifact() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("body.skinrecord");
    let store = VersionStore::new();

    let (n, target) = store.next_version(&path).unwrap();
    assert_eq!(n, 1);
    assert_eq!(target, version_folder(dir.path()).join("body.v0001.skinrecord"));
    assert_eq!(store.current_version(&path).unwrap(), 0);
    assert!(store.snapshot(&path, 0).unwrap().is_none());
    assert!(!dir.path().join("_versions").exists());
}

#[test]
fn test_snapshot_copies_and_numbers() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("body.skinrecord");
    let store = VersionStore::new();

    write(&path, "first");
    let v1 = store.snapshot(&path, 0).unwrap().expect("snapshot taken");
    assert_eq!(v1.number, 1);
    assert_eq!(v1.path, version_folder(dir.path()).join("body.v0001.skinrecord"));
    assert_eq!(read(&path), "first", "snapshot must copy, not move");

    write(&path, "second");
    let v2 = store.snapshot(&path, 0).unwrap().expect("snapshot taken");
    assert_eq!(v2.number, 2);
    assert_eq!(read(&v2.path), "second");

    let entries = store.versions(&path).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].location, VersionLocation::Canonical);
    assert!(entries[2].is_latest());
    assert!(entries.iter().all(|e| e.modified.is_some()));
}

#[test]
fn test_archive_oldest_renumbers() {
    let (dir, path, store) = with_history(2);

    let report = store.archive_with_stamp(&path, &[1], "2024-01-01-000000").unwrap();
    let archive_dir = dir.path().join("_versions/_archive/2024-01-01-000000");
    assert_eq!(report.archive_dir.as_deref(), Some(archive_dir.as_path()));
    assert_eq!(report.archived, vec![archive_dir.join("body.v0001.skinrecord")]);
    assert_eq!(report.remaining, 2);

    assert_eq!(read(&archive_dir.join("body.v0001.skinrecord")), "v1");
    assert_eq!(read(&version_folder(dir.path()).join("body.v0001.skinrecord")), "v2");
    assert!(!version_folder(dir.path()).join("body.v0002.skinrecord").exists());
    assert_eq!(read(&path), "v3");
    assert_eq!(numbers(&store, &path), vec![1, 2]);
}

#[test]
fn test_archive_latest_promotes_highest() {
    let (dir, path, store) = with_history(2);

    let report = store.archive_with_stamp(&path, &[3], "stamp").unwrap();
    assert_eq!(report.remaining, 2);
    assert_eq!(read(&path), "v2", "highest remaining version becomes the canonical file");
    assert_eq!(read(&dir.path().join("_versions/_archive/stamp/body.v0003.skinrecord")), "v3");
    assert_eq!(numbers(&store, &path), vec![1, 2]);
}

#[test]
fn test_archive_interior_shifts_down() {
    let (dir, path, store) = with_history(4);

    store.archive_with_stamp(&path, &[2], "stamp").unwrap();
    let folder = version_folder(dir.path());
    assert_eq!(read(&folder.join("body.v0001.skinrecord")), "v1");
    assert_eq!(read(&folder.join("body.v0002.skinrecord")), "v3");
    assert_eq!(read(&folder.join("body.v0003.skinrecord")), "v4");
    assert!(!folder.join("body.v0004.skinrecord").exists());
    assert_eq!(read(&path), "v5");
    assert_eq!(numbers(&store, &path), vec![1, 2, 3, 4]);

    let leftovers: Vec<_> = fs::read_dir(&folder)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".staging"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_archive_multiple_keeps_contiguity() {
    let (_dir, path, store) = with_history(5);

    let report = store.archive_with_stamp(&path, &[4, 1, 4, 6], "stamp").unwrap();
    assert_eq!(report.archived.len(), 3);
    assert_eq!(report.remaining, 3);
    assert_eq!(numbers(&store, &path), vec![1, 2, 3]);
    assert_eq!(read(&path), "v5");
}

#[test]
fn test_archive_all_folder_versions_removes_folder() {
    let (dir, path, store) = with_history(2);

    store.archive_with_stamp(&path, &[1, 2], "stamp").unwrap();
    assert!(!version_folder(dir.path()).exists());
    assert_eq!(numbers(&store, &path), vec![1]);
    assert_eq!(read(&path), "v3");
}

#[test]
fn test_cannot_archive_all() {
    let (_dir, path, store) = with_history(2);

    let err = store.archive_with_stamp(&path, &[1, 2, 3], "stamp").unwrap_err();
    assert!(matches!(err, Error::CannotArchiveAll { count: 3, .. }));
    assert_eq!(numbers(&store, &path), vec![1, 2, 3]);
    assert_eq!(read(&path), "v3");
}

#[test]
fn test_archive_unknown_version() {
    let (_dir, path, store) = with_history(1);
    let err = store.archive_with_stamp(&path, &[7], "stamp").unwrap_err();
    assert!(matches!(err, Error::VersionNotFound { version: 7, .. }));
}

#[test]
fn test_archive_dir_gets_suffix_when_taken() {
    let (dir, path, store) = with_history(3);

    store.archive_with_stamp(&path, &[1], "stamp").unwrap();
    let report = store.archive_with_stamp(&path, &[1], "stamp").unwrap();
    assert_eq!(report.archive_dir, Some(dir.path().join("_versions/_archive/stamp-1")));
}

#[test]
fn test_snapshot_retention() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("body.skinrecord");
    let store = VersionStore::new();

    for n in 1..=4 {
        write(&path, &format!("v{n}"));
        let entry = store.snapshot(&path, 2).unwrap().expect("snapshot taken");
        assert_eq!(entry.number, n.min(2));
    }
    let folder = version_folder(dir.path());
    assert_eq!(read(&folder.join("body.v0001.skinrecord")), "v3");
    assert_eq!(read(&folder.join("body.v0002.skinrecord")), "v4");
    assert_eq!(numbers(&store, &path), vec![1, 2, 3]);
}

#[test]
fn test_version_file_resolves_to_artifact() {
    let (dir, path, store) = with_history(2);
    let version_file = version_folder(dir.path()).join("body.v0002.skinrecord");

    assert_eq!(store.versions(&version_file).unwrap(), store.versions(&path).unwrap());
    assert_eq!(store.version_path(&version_file, 3).unwrap(), path);
    assert_eq!(store.version_path(&path, 1).unwrap(), version_folder(dir.path()).join("body.v0001.skinrecord"));
    assert!(matches!(store.version_path(&path, 4), Err(Error::VersionNotFound { .. })));
}

#[test]
fn test_foreign_files_in_folder_ignored() {
    let (dir, path, store) = with_history(1);
    write(&version_folder(dir.path()).join("notes.txt"), "x");
    write(&version_folder(dir.path()).join("body.vXYZ.skinrecord"), "x");
    assert_eq!(numbers(&store, &path), vec![1, 2]);
}

#[test]
fn test_archive_rejects_stale_staging_file() {
    let (dir, path, store) = with_history(3);
    let folder = version_folder(dir.path());
    write(&folder.join("body.v0003.skinrecord.staging"), "stale");

    let err = store.archive_with_stamp(&path, &[1], "stamp").unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists));

    assert_eq!(numbers(&store, &path), vec![1, 2, 3, 4]);
    for n in 1..=3 {
        assert_eq!(read(&folder.join(format!("body.v{n:04}.skinrecord"))), format!("v{n}"));
    }
    assert_eq!(read(&path), "v4");
    assert_eq!(read(&folder.join("body.v0003.skinrecord.staging")), "stale");
    assert!(!dir.path().join("_versions/_archive").exists());
}
