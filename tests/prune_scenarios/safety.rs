//! Failure paths: nothing may change unless the whole prune commits.

use crate::common::{forced, BrokenSnapshot, CopyHooks, TestWorld};
use mapprune::{Error, MapDatabase, PruneConfig, Pruner, RunOutcome};
use tempfile::TempDir;

#[test]
fn declined_confirmation_changes_nothing() {
    let world = TestWorld::new();
    let before = world.bytes();

    let mut config = forced("0.0.0");
    config.force = false;
    let mut hooks = CopyHooks::declining();
    let outcome = Pruner::new(&world.path, config).run(&mut hooks).unwrap();

    assert!(matches!(outcome, RunOutcome::Declined(_)));
    assert!(hooks.snapshots.is_empty());
    assert_eq!(world.bytes(), before);
}

#[test]
fn backup_mismatch_blocks_the_prune() {
    let world = TestWorld::new();
    let err = Pruner::new(&world.path, forced("0.0.0"))
        .run(&mut BrokenSnapshot)
        .unwrap_err();

    assert!(matches!(err, Error::BackupFailure { .. }));
    assert_eq!(err.exit_code(), 4);
    assert_eq!(world.open().counts().unwrap().submaps, 3);
}

#[test]
fn missing_database_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = Pruner::new(dir.path().join("map.sqlite3"), forced("0.0.0"))
        .run(&mut CopyHooks::accepting())
        .unwrap_err();
    assert!(matches!(err, Error::MissingFile { .. }));
    assert!(!dir.path().join("map.sqlite3").exists());
}

#[test]
fn non_map_database_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.sqlite3");
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE other (id INTEGER);")
        .unwrap();

    let err = MapDatabase::open(&path).unwrap_err();
    assert!(matches!(err, Error::UnreadableDatabase { .. }));
    assert_eq!(err.exit_code(), 3);

    std::fs::write(&path, b"plain text, not sqlite").unwrap();
    let err = Pruner::new(&path, forced("0.0.0"))
        .run(&mut CopyHooks::accepting())
        .unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn empty_keep_list_is_a_config_error() {
    let world = TestWorld::new();
    let err = Pruner::new(&world.path, PruneConfig::default())
        .run(&mut CopyHooks::accepting())
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn malformed_coordinate_is_a_parse_error() {
    let world = TestWorld::new();
    let before = world.bytes();
    let err = Pruner::new(&world.path, forced("0.0.0, 1.x.2"))
        .run(&mut CopyHooks::accepting())
        .unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert_eq!(world.bytes(), before);
}

#[test]
fn invalid_span_is_a_config_error() {
    let world = TestWorld::new();
    let mut config = forced("0.0.0");
    config.span = -180;
    let err = Pruner::new(&world.path, config)
        .run(&mut CopyHooks::accepting())
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}
