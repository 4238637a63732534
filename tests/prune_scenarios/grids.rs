//! Grid handling across whole runs.

use crate::common::{forced, overmap_body, CopyHooks, TestWorld};
use mapprune::{Coordinate, Error, MapDatabase, OvermapKey, Pruner, RunOutcome};
use mapprune_storage::codec::GRID_FIELDS;
use mapprune_storage::testing::FixtureBuilder;
use serde_json::json;
use tempfile::TempDir;

/// Every absolute coordinate a grid field of `key` mentions
fn referenced(body: &serde_json::Value, key: OvermapKey) -> Vec<Coordinate> {
    let origin = (key.ox * 180, key.oy * 180);
    let mut out = Vec::new();
    for field in GRID_FIELDS {
        for entry in body[field].as_array().into_iter().flatten() {
            let items = entry.as_array().unwrap();
            let pos = items[0].as_array().unwrap();
            let (x, y, z) = (
                pos[0].as_i64().unwrap() as i32 + origin.0,
                pos[1].as_i64().unwrap() as i32 + origin.1,
                pos[2].as_i64().unwrap() as i32,
            );
            out.push(Coordinate::new(x, y, z));
            if field != "fluid_grid_storage" {
                for offset in &items[1..] {
                    let d = offset.as_array().unwrap();
                    out.push(Coordinate::new(
                        x + d[0].as_i64().unwrap() as i32,
                        y + d[1].as_i64().unwrap() as i32,
                        z + d[2].as_i64().unwrap() as i32,
                    ));
                }
            }
        }
    }
    out
}

#[test]
fn surviving_grid_references_no_deleted_coordinate() {
    let world = TestWorld::new();
    Pruner::new(&world.path, forced("0.0.0"))
        .run(&mut CopyHooks::accepting())
        .unwrap();

    let db = world.open();
    let survivors: Vec<Coordinate> = db.submaps().unwrap().into_iter().map(|e| e.coord).collect();
    let body = overmap_body(&db, OvermapKey::new(0, 0)).unwrap();
    for coord in referenced(&body, OvermapKey::new(0, 0)) {
        assert!(survivors.contains(&coord), "{} is referenced but deleted", coord);
    }
    // unrelated fields pass through untouched
    assert_eq!(body["layers"], json!([{"terrain": "field"}]));
    assert_eq!(body["fluid_grid_storage"], json!([]));
}

#[test]
fn links_between_kept_submaps_survive_partial_loss() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.sqlite3");
    FixtureBuilder::create(&path)
        .unwrap()
        .submap(Coordinate::new(10, 10, 0), b"a")
        .submap(Coordinate::new(11, 10, 0), b"b")
        .submap(Coordinate::new(12, 10, 0), b"c")
        .overmap(
            OvermapKey::new(0, 0),
            None,
            json!({"electric_grid_connections": [
                [[10, 10, 0], [1, 0, 0]],
                [[11, 10, 0], [-1, 0, 0], [1, 0, 0]],
                [[12, 10, 0], [-1, 0, 0]]
            ]}),
        );

    let outcome = Pruner::new(&path, forced("10.10.0, 11.10.0"))
        .run(&mut CopyHooks::accepting())
        .unwrap();
    let RunOutcome::Pruned(report) = outcome else {
        panic!("expected a committed prune");
    };
    assert_eq!(report.stats.overmaps_rewritten, 1);

    let db = MapDatabase::open_read_only(&path).unwrap();
    let body = overmap_body(&db, OvermapKey::new(0, 0)).unwrap();
    assert_eq!(
        body["electric_grid_connections"],
        json!([[[10, 10, 0], [1, 0, 0]], [[11, 10, 0], [-1, 0, 0]]])
    );
}

#[test]
fn link_across_overmap_border_is_cut() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.sqlite3");
    FixtureBuilder::create(&path)
        .unwrap()
        .submap(Coordinate::new(179, 0, 0), b"west edge")
        .submap(Coordinate::new(180, 0, 0), b"east edge")
        .overmap(
            OvermapKey::new(0, 0),
            None,
            json!({"electric_grid_connections": [[[179, 0, 0], [1, 0, 0]]]}),
        )
        .overmap(
            OvermapKey::new(1, 0),
            None,
            json!({"electric_grid_connections": [[[0, 0, 0], [-1, 0, 0]]]}),
        );

    let RunOutcome::Pruned(report) = Pruner::new(&path, forced("179.0.0"))
        .run(&mut CopyHooks::accepting())
        .unwrap()
    else {
        panic!("expected a committed prune");
    };
    assert_eq!(report.stats.submaps_deleted, 1);
    assert_eq!(report.stats.overmaps_rewritten, 1);

    let db = MapDatabase::open_read_only(&path).unwrap();
    let survivors: Vec<Coordinate> = db.submaps().unwrap().into_iter().map(|e| e.coord).collect();
    assert_eq!(survivors, vec![Coordinate::new(179, 0, 0)]);
    let body = overmap_body(&db, OvermapKey::new(0, 0)).unwrap();
    assert_eq!(body["electric_grid_connections"], json!([]));
    for coord in referenced(&body, OvermapKey::new(0, 0)) {
        assert!(survivors.contains(&coord), "{} is referenced but deleted", coord);
    }
    drop(db);

    // the cut grid is stable: a second run changes nothing
    let RunOutcome::Pruned(again) = Pruner::new(&path, forced("179.0.0"))
        .run(&mut CopyHooks::accepting())
        .unwrap()
    else {
        panic!("expected a committed prune");
    };
    assert_eq!(again.stats.overmaps_rewritten, 0);
}

#[test]
fn out_of_range_grid_position_aborts_dry_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.sqlite3");
    FixtureBuilder::create(&path)
        .unwrap()
        .submap(Coordinate::new(i32::MAX, 0, 0), b"edge of the world")
        .overmap(
            OvermapKey::new(11930464, 0),
            None,
            json!({"electric_grid_connections": [[[127, 0, 0], [1, 0, 0]]]}),
        );

    let mut config = forced(&format!("{}.0.0", i32::MAX));
    config.dry_run = true;
    let err = Pruner::new(&path, config)
        .run(&mut CopyHooks::accepting())
        .unwrap_err();
    assert!(matches!(err, Error::GridCorruption { key, .. } if key == OvermapKey::new(11930464, 0)));
}

#[test]
fn remove_grid_clears_every_surviving_overmap() {
    let world = TestWorld::new();
    let mut config = forced("0.0.0, 200.0.0");
    config.remove_grid = true;
    Pruner::new(&world.path, config)
        .run(&mut CopyHooks::accepting())
        .unwrap();

    let db = world.open();
    for key in [OvermapKey::new(0, 0), OvermapKey::new(1, 0)] {
        let body = overmap_body(&db, key).unwrap();
        for field in GRID_FIELDS {
            if let Some(entries) = body.get(field) {
                assert_eq!(entries, &json!([]), "{} of {} not cleared", field, key);
            }
        }
    }
}

#[test]
fn remove_grid_run_skips_edge_verification() {
    let world = TestWorld::new();
    std::fs::copy(&world.path, world.dir.path().join("original.sqlite3")).unwrap();

    let mut config = forced("0.0.0, 0.0.1");
    config.remove_grid = true;
    config.verify_against = Some(world.dir.path().join("original.sqlite3"));
    let RunOutcome::Pruned(report) = Pruner::new(&world.path, config)
        .run(&mut CopyHooks::accepting())
        .unwrap()
    else {
        panic!("expected a committed prune");
    };

    let verification = report.verification.as_ref().unwrap();
    assert!(verification.edges.is_none());
    assert!(verification.is_consistent());
}

#[test]
fn corrupt_grid_aborts_without_mutation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.sqlite3");
    FixtureBuilder::create(&path)
        .unwrap()
        .submap(Coordinate::new(0, 0, 0), b"a")
        .submap(Coordinate::new(0, 0, 1), b"b")
        .raw("o.0.0", Some("zlib"), b"definitely not zlib");
    let before = std::fs::read(&path).unwrap();

    let mut hooks = CopyHooks::accepting();
    let err = Pruner::new(&path, forced("0.0.0")).run(&mut hooks).unwrap_err();
    assert!(matches!(err, Error::GridCorruption { key, .. } if key == OvermapKey::new(0, 0)));
    assert_eq!(err.exit_code(), 5);
    assert!(hooks.snapshots.is_empty());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn malformed_grid_entry_aborts_remove_mode_too() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.sqlite3");
    FixtureBuilder::create(&path)
        .unwrap()
        .submap(Coordinate::new(0, 0, 0), b"a")
        .overmap(
            OvermapKey::new(0, 0),
            None,
            json!({"electric_grid_connections": [[[0, 0], [1, 0, 0]]]}),
        );

    let mut config = forced("0.0.0");
    config.remove_grid = true;
    let err = Pruner::new(&path, config)
        .run(&mut CopyHooks::accepting())
        .unwrap_err();
    assert_eq!(err.exit_code(), 5);
    assert_eq!(MapDatabase::open_read_only(&path).unwrap().counts().unwrap().submaps, 1);
}
