//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mapprune::{Coordinate, MapDatabase, OvermapKey, PruneConfig, PruneHooks, PrunePlan, Result};
use mapprune_storage::codec::OvermapBlob;
use mapprune_storage::testing::FixtureBuilder;
use serde_json::{json, Value};
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

/// O1 = (0,0) owns (0,0,0) and (0,0,1); O2 = (1,0) owns (200,0,0).
///
/// O1 carries an electric link between its two submaps and fluid storage on
/// the one that will be deleted.
pub fn two_overmap_world(path: &Path) {
    FixtureBuilder::create(path)
        .unwrap()
        .submap(Coordinate::new(0, 0, 0), b"kept ground")
        .submap(Coordinate::new(0, 0, 1), b"upper floor")
        .submap(Coordinate::new(200, 0, 0), b"far away")
        .overmap(
            OvermapKey::new(0, 0),
            Some("zlib"),
            json!({
                "layers": [{"terrain": "field"}],
                "electric_grid_connections": [
                    [[0, 0, 0], [0, 0, 1]],
                    [[0, 0, 1], [0, 0, -1]]
                ],
                "fluid_grid_connections": [],
                "fluid_grid_storage": [[[0, 0, 1], {"water": 120}]]
            }),
        )
        .overmap(
            OvermapKey::new(1, 0),
            Some("zlib"),
            json!({"electric_grid_connections": [[[20, 0, 0], [1, 0, 0]], [[21, 0, 0], [-1, 0, 0]]]}),
        );
}

/// Temporary directory holding a fresh copy of [`two_overmap_world`]
pub struct TestWorld {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestWorld {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.sqlite3");
        two_overmap_world(&path);
        TestWorld { dir, path }
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.path().join("map.sqlite3.bak")
    }

    pub fn open(&self) -> MapDatabase {
        MapDatabase::open_read_only(&self.path).unwrap()
    }

    pub fn bytes(&self) -> Vec<u8> {
        std::fs::read(&self.path).unwrap()
    }
}

/// Config that keeps `keep` and skips the prompt
pub fn forced(keep: &str) -> PruneConfig {
    PruneConfig {
        keep: vec![keep.to_string()],
        force: true,
        ..PruneConfig::default()
    }
}

/// Decoded JSON body of an overmap record
pub fn overmap_body(db: &MapDatabase, key: OvermapKey) -> Option<Value> {
    let stored = db.read_record(&key.to_string()).unwrap()?;
    let blob = OvermapBlob::decode(stored.compression.as_deref(), &stored.data).unwrap();
    Some(Value::Object(blob.body().clone()))
}

// ============================================================================
// Hooks
// ============================================================================

/// Copies the database to `<db>.bak`, `<db>.bak1`, ... and answers a fixed
/// confirmation.
pub struct CopyHooks {
    pub answer: bool,
    pub snapshots: Vec<PathBuf>,
}

impl CopyHooks {
    pub fn accepting() -> Self {
        CopyHooks {
            answer: true,
            snapshots: Vec::new(),
        }
    }

    pub fn declining() -> Self {
        CopyHooks {
            answer: false,
            snapshots: Vec::new(),
        }
    }
}

impl PruneHooks for CopyHooks {
    fn confirm(&mut self, _plan: &PrunePlan) -> Result<bool> {
        Ok(self.answer)
    }

    fn snapshot(&mut self, database: &Path) -> Result<PathBuf> {
        let suffix = match self.snapshots.len() {
            0 => ".bak".to_string(),
            n => format!(".bak{}", n),
        };
        let mut name = database.as_os_str().to_owned();
        name.push(suffix);
        let target = PathBuf::from(name);
        std::fs::copy(database, &target)?;
        self.snapshots.push(target.clone());
        Ok(target)
    }
}

/// Returns a snapshot path that is not a copy of the database
pub struct BrokenSnapshot;

impl PruneHooks for BrokenSnapshot {
    fn confirm(&mut self, _plan: &PrunePlan) -> Result<bool> {
        Ok(true)
    }

    fn snapshot(&mut self, database: &Path) -> Result<PathBuf> {
        let target = database.with_extension("truncated");
        let bytes = std::fs::read(database)?;
        std::fs::write(&target, &bytes[..bytes.len() / 2])?;
        Ok(target)
    }
}
