//! Grid preservation
//!
//! Electric and fluid networks are stored inside overmap records and name
//! submaps as graph nodes. Deleting submaps would leave those nodes dangling,
//! so before any deletion the preserver computes one action per affected
//! overmap:
//!
//! - **Rewrite**: a surviving overmap whose grid names a submap that will
//!   be gone gets its grid filtered down to nodes and links whose submaps
//!   survive. Links may cross into a neighbouring overmap, so every
//!   surviving overmap is checked, not only those losing their own submaps.
//! - **Clear** (`--remove-grid`): a surviving overmap gets every grid field
//!   emptied
//! - **Drop**: a removed overmap's grid leaves together with its record
//!
//! All decoding happens here, before the write transaction opens. If any
//! affected payload cannot be decoded, planning fails with
//! `Error::GridCorruption` and nothing is mutated.

use std::collections::BTreeSet;

use mapprune_core::{Coordinate, Error, OvermapKey, Result, Span};
use mapprune_storage::codec::{CodecError, OvermapBlob};
use mapprune_storage::{MapDatabase, OvermapEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How grids of surviving overmaps are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridMode {
    /// Filter grids down to surviving submaps
    #[default]
    Preserve,
    /// Empty every grid, including those of surviving overmaps
    Remove,
}

impl GridMode {
    /// Get the name of this mode for logging
    pub fn name(&self) -> &'static str {
        match self {
            GridMode::Preserve => "preserve",
            GridMode::Remove => "remove",
        }
    }
}

impl std::fmt::Display for GridMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Kind of grid action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridActionKind {
    /// Replace the overmap payload with a filtered grid
    Rewrite,
    /// Replace the overmap payload with emptied grid fields
    Clear,
    /// Grid leaves with the overmap record
    Drop,
}

/// One planned change to an overmap's grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridAction {
    /// Affected overmap
    pub key: OvermapKey,
    /// Record path of the overmap
    pub path: String,
    /// What happens to the grid
    pub kind: GridActionKind,
    /// Grid nodes removed
    pub entries_removed: usize,
    /// Links removed from surviving nodes
    pub links_removed: usize,
    /// Re-encoded payload for `Rewrite` and `Clear`
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
}

/// Computes grid actions for a prune
#[derive(Debug, Clone, Copy)]
pub struct GridPreserver {
    mode: GridMode,
    span: Span,
}

impl GridPreserver {
    /// Create a preserver
    pub fn new(mode: GridMode, span: Span) -> Self {
        GridPreserver { mode, span }
    }

    /// Grid handling mode
    pub fn mode(&self) -> GridMode {
        self.mode
    }

    /// Plan grid actions
    ///
    /// - `kept`: overmaps that survive
    /// - `deleted`: overmaps removed entirely
    /// - `survivors`: submaps present after the prune
    pub fn plan(
        &self,
        db: &MapDatabase,
        kept: &[OvermapEntry],
        deleted: &[OvermapEntry],
        survivors: &BTreeSet<Coordinate>,
    ) -> Result<Vec<GridAction>> {
        let mut actions = Vec::new();

        for entry in kept {
            let action = match self.mode {
                GridMode::Preserve => self.filter(db, entry, survivors)?,
                GridMode::Remove => self.clear(db, entry)?,
            };
            actions.extend(action);
        }

        actions.extend(deleted.iter().map(|entry| GridAction {
            key: entry.key,
            path: entry.path.clone(),
            kind: GridActionKind::Drop,
            entries_removed: 0,
            links_removed: 0,
            data: None,
        }));

        debug!(mode = %self.mode, actions = actions.len(), "grid actions planned");
        Ok(actions)
    }

    fn filter(
        &self,
        db: &MapDatabase,
        entry: &OvermapEntry,
        survivors: &BTreeSet<Coordinate>,
    ) -> Result<Option<GridAction>> {
        let Some(mut blob) = self.load(db, entry)? else {
            return Ok(None);
        };
        let mut grid = blob.grid().map_err(|e| corrupt(entry.key, e))?;

        let (key, span) = (entry.key, self.span);
        let stats = grid
            .retain(|local| {
                Coordinate::from_local(key, local, span)
                    .map(|coord| survivors.contains(&coord))
                    .ok_or_else(|| CodecError::MalformedGrid {
                        field: "grid",
                        reason: format!("local position {} lies outside the coordinate range", local),
                    })
            })
            .map_err(|e| corrupt(key, e))?;
        if !stats.changed() {
            return Ok(None);
        }

        blob.set_grid(&grid);
        let data = blob.encode().map_err(|e| corrupt(entry.key, e))?;
        debug!(
            overmap = %entry.key,
            entries_removed = stats.entries_removed,
            links_removed = stats.links_removed,
            "grid filtered"
        );
        Ok(Some(GridAction {
            key: entry.key,
            path: entry.path.clone(),
            kind: GridActionKind::Rewrite,
            entries_removed: stats.entries_removed,
            links_removed: stats.links_removed,
            data: Some(data),
        }))
    }

    fn clear(&self, db: &MapDatabase, entry: &OvermapEntry) -> Result<Option<GridAction>> {
        let Some(mut blob) = self.load(db, entry)? else {
            return Ok(None);
        };
        let mut grid = blob.grid().map_err(|e| corrupt(entry.key, e))?;

        let removed = grid.clear();
        if removed == 0 {
            return Ok(None);
        }

        blob.set_grid(&grid);
        let data = blob.encode().map_err(|e| corrupt(entry.key, e))?;
        Ok(Some(GridAction {
            key: entry.key,
            path: entry.path.clone(),
            kind: GridActionKind::Clear,
            entries_removed: removed,
            links_removed: 0,
            data: Some(data),
        }))
    }

    fn load(&self, db: &MapDatabase, entry: &OvermapEntry) -> Result<Option<OvermapBlob>> {
        let Some(stored) = db.read_record(&entry.path)? else {
            warn!(overmap = %entry.key, "overmap vanished while planning");
            return Ok(None);
        };
        OvermapBlob::decode(stored.compression.as_deref(), &stored.data)
            .map(Some)
            .map_err(|e| corrupt(entry.key, e))
    }
}

fn corrupt(key: OvermapKey, err: CodecError) -> Error {
    Error::grid_corruption(key, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapprune_storage::codec::ZlibCodec;
    use mapprune_storage::codec::StorageCodec;
    use mapprune_storage::testing::FixtureBuilder;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn grid_body(db: &MapDatabase, path: &str) -> Value {
        let stored = db.read_record(path).unwrap().unwrap();
        let blob = OvermapBlob::decode(stored.compression.as_deref(), &stored.data).unwrap();
        Value::Object(blob.body().clone())
    }

    fn entry(key: OvermapKey) -> OvermapEntry {
        OvermapEntry {
            key,
            path: key.to_string(),
        }
    }

    #[test]
    fn test_preserve_filters_losing_overmap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.sqlite3");
        FixtureBuilder::create(&path).unwrap().overmap(
            OvermapKey::new(0, 0),
            Some("zlib"),
            json!({
                "layers": [1, 2, 3],
                "electric_grid_connections": [
                    [[0, 0, 0], [0, 0, 1]],
                    [[0, 0, 1], [0, 0, -1]]
                ],
                "fluid_grid_storage": [[[0, 0, 1], {"water": 5}]]
            }),
        );

        let db = MapDatabase::open_read_only(&path).unwrap();
        let preserver = GridPreserver::new(GridMode::Preserve, Span::default());
        let survivors: BTreeSet<Coordinate> = [Coordinate::new(0, 0, 0)].into_iter().collect();
        let actions = preserver
            .plan(&db, &[entry(OvermapKey::new(0, 0))], &[], &survivors)
            .unwrap();
        assert_eq!(actions.len(), 1);
        let action = &actions[0];
        assert_eq!(action.kind, GridActionKind::Rewrite);
        // node (0,0,0) loses its only link and goes; (0,0,1) and its storage go
        assert_eq!(action.entries_removed, 3);

        let text = ZlibCodec.decode(action.data.as_ref().unwrap()).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("# version 30\n"));
        assert!(text.contains("\"layers\":[1,2,3]"));
        assert!(text.contains("\"electric_grid_connections\":[]"));
        assert!(text.contains("\"fluid_grid_storage\":[]"));
    }

    #[test]
    fn test_preserve_skips_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.sqlite3");
        FixtureBuilder::create(&path)
            .unwrap()
            .overmap(
                OvermapKey::new(0, 0),
                None,
                json!({"electric_grid_connections": [[[0, 0, 0], [1, 0, 0]]]}),
            )
            .overmap(OvermapKey::new(1, 0), Some("zlib"), json!({"layers": []}));

        let db = MapDatabase::open_read_only(&path).unwrap();
        let preserver = GridPreserver::new(GridMode::Preserve, Span::default());
        let survivors: BTreeSet<Coordinate> =
            [Coordinate::new(0, 0, 0), Coordinate::new(1, 0, 0)].into_iter().collect();

        let actions = preserver
            .plan(
                &db,
                &[entry(OvermapKey::new(0, 0)), entry(OvermapKey::new(1, 0))],
                &[],
                &survivors,
            )
            .unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn test_preserve_filters_link_into_neighbouring_overmap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.sqlite3");
        FixtureBuilder::create(&path).unwrap().overmap(
            OvermapKey::new(0, 0),
            None,
            json!({"electric_grid_connections": [
                [[178, 0, 0], [1, 0, 0]],
                [[179, 0, 0], [-1, 0, 0], [1, 0, 0]]
            ]}),
        );

        let db = MapDatabase::open_read_only(&path).unwrap();
        let preserver = GridPreserver::new(GridMode::Preserve, Span::default());
        // 180.0.0 belongs to o.1.0 and is deleted; o.0.0 loses none of its own
        let survivors: BTreeSet<Coordinate> =
            [Coordinate::new(178, 0, 0), Coordinate::new(179, 0, 0)].into_iter().collect();

        let actions = preserver
            .plan(&db, &[entry(OvermapKey::new(0, 0))], &[], &survivors)
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, GridActionKind::Rewrite);
        assert_eq!(actions[0].links_removed, 1);
        assert_eq!(actions[0].entries_removed, 0);

        let blob = OvermapBlob::decode(None, actions[0].data.as_ref().unwrap()).unwrap();
        assert_eq!(
            blob.body()["electric_grid_connections"],
            json!([[[178, 0, 0], [1, 0, 0]], [[179, 0, 0], [-1, 0, 0]]])
        );
    }

    #[test]
    fn test_overflowing_position_is_grid_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.sqlite3");
        let key = OvermapKey::new(11930464, 0);
        FixtureBuilder::create(&path).unwrap().overmap(
            key,
            None,
            json!({"electric_grid_connections": [[[127, 0, 0], [1, 0, 0]]]}),
        );

        let db = MapDatabase::open_read_only(&path).unwrap();
        let preserver = GridPreserver::new(GridMode::Preserve, Span::default());
        let survivors: BTreeSet<Coordinate> = [Coordinate::new(i32::MAX, 0, 0)].into_iter().collect();

        let err = preserver.plan(&db, &[entry(key)], &[], &survivors).unwrap_err();
        assert!(matches!(err, Error::GridCorruption { key: k, .. } if k == key));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_corrupt_payload_fails_closed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.sqlite3");
        FixtureBuilder::create(&path)
            .unwrap()
            .raw(&OvermapKey::new(0, 0).to_string(), Some("zlib"), b"not zlib at all");

        let db = MapDatabase::open_read_only(&path).unwrap();
        let preserver = GridPreserver::new(GridMode::Preserve, Span::default());
        let err = preserver
            .plan(&db, &[entry(OvermapKey::new(0, 0))], &[], &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, Error::GridCorruption { key, .. } if key == OvermapKey::new(0, 0)));
    }

    #[test]
    fn test_malformed_grid_fails_closed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.sqlite3");
        FixtureBuilder::create(&path).unwrap().overmap(
            OvermapKey::new(0, 0),
            None,
            json!({"fluid_grid_connections": "nope"}),
        );

        let db = MapDatabase::open_read_only(&path).unwrap();
        let preserver = GridPreserver::new(GridMode::Remove, Span::default());
        let err = preserver
            .plan(&db, &[entry(OvermapKey::new(0, 0))], &[], &BTreeSet::new())
            .unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_remove_clears_kept_and_drops_deleted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.sqlite3");
        FixtureBuilder::create(&path)
            .unwrap()
            .overmap(
                OvermapKey::new(0, 0),
                Some("zlib"),
                json!({"electric_grid_connections": [[[0, 0, 0], [1, 0, 0]]], "fluid_grid_connections": []}),
            )
            .overmap(OvermapKey::new(2, 2), None, json!({"electric_grid_connections": []}))
            .overmap(OvermapKey::new(1, 0), None, json!({}));

        let db = MapDatabase::open(&path).unwrap();
        let preserver = GridPreserver::new(GridMode::Remove, Span::default());
        let actions = preserver
            .plan(
                &db,
                &[entry(OvermapKey::new(0, 0)), entry(OvermapKey::new(2, 2))],
                &[entry(OvermapKey::new(1, 0))],
                &BTreeSet::new(),
            )
            .unwrap();

        let kinds: Vec<(OvermapKey, GridActionKind)> = actions.iter().map(|a| (a.key, a.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (OvermapKey::new(0, 0), GridActionKind::Clear),
                (OvermapKey::new(1, 0), GridActionKind::Drop),
            ]
        );

        let cleared = actions[0].data.as_ref().unwrap();
        let blob = OvermapBlob::decode(Some("zlib"), cleared).unwrap();
        assert!(blob.grid().unwrap().is_empty());
        assert_eq!(grid_body(&db, "o.1.0"), json!({}));
    }

    #[test]
    fn test_grid_mode_serde() {
        assert_eq!(serde_json::to_string(&GridMode::Remove).unwrap(), "\"remove\"");
        assert_eq!(GridMode::default(), GridMode::Preserve);
    }
}
