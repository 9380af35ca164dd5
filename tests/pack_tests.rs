//! Integration tests for pack manifests and pack export/import.

use std::fs;

use skinio::ops;
use skinio::pack::PackManifest;
use skinio::scene::{MemoryScene, SceneProvider};
use skinio::versioning::VersionStore;
use skinio::{Config, Error};
use tempfile::TempDir;

fn rig() -> MemoryScene {
    let mut scene = MemoryScene::new();
    scene.add_object("char:body", 3);
    scene.add_object("char:head", 2);
    scene.add_object("char:prop", 1);
    scene
        .set_skin("char:body", &["root", "spine"], vec![vec![1.0, 0.0], vec![0.5, 0.5], vec![0.0, 1.0]])
        .expect("Failed to skin body");
    scene
        .set_skin("char:head", &["neck", "head"], vec![vec![0.2, 0.8], vec![0.0, 1.0]])
        .expect("Failed to skin head");
    scene
}

fn objects(n: &[&str]) -> Vec<String> {
    n.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_unchanged_export_is_not_versioned() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("rig.skinpack");
    let store = VersionStore::new();
    let pack = PackManifest::for_pack(&path, ["body.skinrecord", "head.skinrecord"]);

    assert!(pack.export(&path, true, &store, 0).unwrap());
    assert!(pack.export(&path, true, &store, 0).unwrap());
    assert_eq!(store.versions(&path).unwrap().len(), 1, "identical export must not snapshot");

    let changed = PackManifest::for_pack(&path, ["body.skinrecord"]);
    assert!(changed.export(&path, true, &store, 0).unwrap());
    let versions = store.versions(&path).unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(PackManifest::load(&versions[0].path).unwrap(), pack);
    assert_eq!(PackManifest::load(&path).unwrap(), changed);
}

#[test]
fn test_unreadable_previous_manifest_is_versioned() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("rig.skinpack");
    fs::write(&path, "not json").unwrap();

    let store = VersionStore::new();
    let pack = PackManifest::for_pack(&path, ["body.skinrecord"]);
    assert!(pack.export(&path, true, &store, 0).unwrap());
    assert_eq!(store.current_version(&path).unwrap(), 2);
}

#[test]
fn test_empty_pack_is_noop() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("rig.skinpack");

    let report = ops::export_pack(&rig(), &path, &objects(&["char:prop"]), true, &Config::default()).unwrap();
    assert!(report.succeeded.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(!path.exists());
}

#[test]
fn test_export_and_import_pack() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("rig.skinpack");
    let source = rig();

    let report = ops::export_pack(
        &source,
        &path,
        &objects(&["char:body", "char:head", "char:prop"]),
        false,
        &Config::default(),
    )
    .unwrap();
    assert!(report.is_success());
    assert_eq!(report.skipped.len(), 1);

    let manifest = PackManifest::load(&path).unwrap();
    assert_eq!(manifest.members(), ["body.skinrecord", "head.skinrecord"]);
    assert_eq!(manifest.root_path(), dir.path());
    assert!(manifest.member_paths().iter().all(|p| p.is_file()));

    let mut target = MemoryScene::new();
    target.add_object("body", 3);
    target.add_object("head", 2);
    let report = ops::import_pack(&mut target, &path, &Config::default()).unwrap();
    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 2);

    assert_eq!(target.skin("body").unwrap().weights, source.skin("char:body").unwrap().weights);
    assert_eq!(target.influences("head").unwrap(), objects(&["neck", "head"]));
}

#[test]
fn test_versioned_pack_export_snapshots_members() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("rig.skinpack");
    let scene = rig();
    let config = Config::default();
    let members = objects(&["char:body"]);

    ops::export_pack(&scene, &path, &members, true, &config).unwrap();
    ops::export_pack(&scene, &path, &members, true, &config).unwrap();

    let store = VersionStore::new();
    assert_eq!(store.current_version(dir.path().join("body.skinrecord")).unwrap(), 2);
    assert_eq!(store.current_version(&path).unwrap(), 1);
}

#[test]
fn test_import_pack_reports_missing_member() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("rig.skinpack");
    ops::export_pack(&rig(), &path, &objects(&["char:body", "char:head"]), false, &Config::default()).unwrap();
    fs::remove_file(dir.path().join("head.skinrecord")).expect("Failed to remove member");

    let mut target = MemoryScene::new();
    target.add_object("body", 3);
    target.add_object("head", 2);
    let report = ops::import_pack(&mut target, &path, &Config::default()).unwrap();

    assert!(!report.is_success());
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "head");
    assert!(matches!(report.failed[0].1, Error::PathNotFound(_)));
    assert!(target.is_skinned("body"));
    assert!(!target.is_skinned("head"));
}

#[test]
fn test_import_pack_reads_only_listed_members() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("rig.skinpack");
    let mut source = MemoryScene::new();
    source.add_object("body", 2);
    source
        .set_skin("body", &["root", "spine"], vec![vec![0.5, 0.5], vec![0.5, 0.5]])
        .expect("Failed to skin body");
    let config = Config::default();

    // An unlisted file sharing the member's object prefix.
    ops::export_skins(&source, dir.path(), &objects(&["body"]), false, &config).unwrap();
    fs::rename(dir.path().join("body.skinrecord"), dir.path().join("body.backup.skinrecord")).unwrap();

    source
        .set_skin("body", &["root", "spine"], vec![vec![1.0, 0.0], vec![0.0, 1.0]])
        .expect("Failed to skin body");
    ops::export_pack(&source, &path, &objects(&["body"]), false, &config).unwrap();

    let mut target = MemoryScene::new();
    target.add_object("body", 2);
    let report = ops::import_pack(&mut target, &path, &config).unwrap();

    assert!(report.is_success());
    assert!(report.skipped.is_empty());
    assert_eq!(report.succeeded, vec![dir.path().join("body.skinrecord").display().to_string()]);
    assert_eq!(target.skin("body").unwrap().weights, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}
