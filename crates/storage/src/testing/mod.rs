//! Testing utilities for map databases
//!
//! Builds small `map.sqlite3` saves with the upstream `files` schema so
//! tests can prune and verify real files.
//!
//! # Example
//!
//! ```ignore
//! use mapprune_storage::testing::FixtureBuilder;
//!
//! FixtureBuilder::create(&path)?
//!     .submap(Coordinate::new(0, 0, 0), b"ground")
//!     .overmap(OvermapKey::new(0, 0), Some("zlib"), json!({"electric_grid_connections": []}));
//! ```

use std::path::Path;

use mapprune_core::{Coordinate, OvermapKey};
use rusqlite::{params, Connection};
use serde_json::Value;

use crate::codec::get_codec;

/// Schema of the upstream `files` table
pub const FILES_SCHEMA: &str = "CREATE TABLE files (
    path TEXT PRIMARY KEY NOT NULL,
    parent TEXT NOT NULL,
    compression TEXT DEFAULT NULL,
    timestamp INTEGER DEFAULT 0,
    data BLOB NOT NULL
);";

/// Version line written in front of fixture overmap bodies
pub const FIXTURE_VERSION_LINE: &str = "# version 30";

/// Path under which the game stores a submap
///
/// Submaps are bucketed into directories of 32 × 32 submaps per level.
pub fn submap_path(coord: Coordinate) -> String {
    format!(
        "maps/{}.{}.{}/{}.{}.{}.map",
        coord.x.div_euclid(32),
        coord.y.div_euclid(32),
        coord.z,
        coord.x,
        coord.y,
        coord.z
    )
}

/// Builder for fixture saves
///
/// Insert helpers panic on failure; they are meant for tests only.
pub struct FixtureBuilder {
    conn: Connection,
}

impl FixtureBuilder {
    /// Create a new save file with an empty `files` table
    pub fn create(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA synchronous = OFF;")?;
        conn.execute_batch(FILES_SCHEMA)?;
        Ok(FixtureBuilder { conn })
    }

    /// Insert a submap record with a raw payload
    pub fn submap(self, coord: Coordinate, payload: &[u8]) -> Self {
        self.raw(&submap_path(coord), None, payload)
    }

    /// Insert an overmap record from a JSON body, encoded like the game does
    ///
    /// # Panics
    ///
    /// Panics on an unknown compression name.
    pub fn overmap(self, key: OvermapKey, compression: Option<&str>, body: Value) -> Self {
        let text = format!("{}\n{}", FIXTURE_VERSION_LINE, body);
        let data = get_codec(compression)
            .and_then(|codec| codec.encode(text.as_bytes()))
            .expect("fixture overmap encodes");
        self.raw(&key.to_string(), compression, &data)
    }

    /// Insert an overmap record with raw bytes and no compression
    pub fn raw_overmap(self, key: OvermapKey, data: &[u8]) -> Self {
        self.raw(&key.to_string(), None, data)
    }

    /// Insert any record
    ///
    /// # Panics
    ///
    /// Panics if the insert fails (e.g. duplicate path).
    pub fn raw(self, path: &str, compression: Option<&str>, data: &[u8]) -> Self {
        let parent = path.rsplit_once('/').map_or("", |(parent, _)| parent);
        self.conn
            .execute(
                "INSERT INTO files (path, parent, compression, data) VALUES (?1, ?2, ?3, ?4)",
                params![path, parent, compression, data],
            )
            .expect("fixture insert succeeds");
        self
    }
}
