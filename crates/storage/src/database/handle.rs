//! Map database handle
//!
//! `MapDatabase` is the explicit handle every component receives. It owns one
//! SQLite connection to one save file and exposes only the operations the
//! pruner needs: listing record paths, reading payloads, and opening a scoped
//! write transaction.
//!
//! Opening never creates a file: a missing path is `Error::MissingFile`, and a
//! file without the `files` table is `Error::UnreadableDatabase`.

use std::path::{Path, PathBuf};

use mapprune_core::path::{self as record_path, OVERMAP_LIKE, SUBMAP_LIKE};
use mapprune_core::{Coordinate, Error, OvermapKey, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use tracing::debug;

use super::transaction::MapTransaction;
use super::sql_error;

/// Name of the record table in the upstream schema
pub const FILES_TABLE: &str = "files";

/// A submap record path and the coordinate it encodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubmapEntry {
    /// Submap coordinate
    pub coord: Coordinate,
    /// Value of `files.path`
    pub path: String,
}

/// An overmap record path and the key it encodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OvermapEntry {
    /// Overmap key
    pub key: OvermapKey,
    /// Value of `files.path`
    pub path: String,
}

/// The `compression` and `data` columns of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// `NULL` or a codec name such as `"zlib"`
    pub compression: Option<String>,
    /// Raw column bytes
    pub data: Vec<u8>,
}

/// Record counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntryCounts {
    /// Submap records
    pub submaps: usize,
    /// Overmap records
    pub overmaps: usize,
    /// Every row in `files`
    pub total: usize,
}

/// Handle over one map save file
pub struct MapDatabase {
    conn: Connection,
    path: PathBuf,
    read_only: bool,
}

impl MapDatabase {
    /// Open an existing save for reading and writing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path.as_ref(), OpenFlags::SQLITE_OPEN_READ_WRITE, false)
    }

    /// Open an existing save without write access
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path.as_ref(), OpenFlags::SQLITE_OPEN_READ_ONLY, true)
    }

    fn open_with(path: &Path, flags: OpenFlags, read_only: bool) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingFile {
                path: path.to_path_buf(),
            });
        }

        let unreadable = |reason: String| Error::UnreadableDatabase {
            path: path.to_path_buf(),
            reason,
        };

        let conn = Connection::open_with_flags(path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .map_err(|e| unreadable(e.to_string()))?;

        let has_files: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [FILES_TABLE],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| unreadable(e.to_string()))?;
        if has_files.is_none() {
            return Err(unreadable(format!(
                "no '{}' table (not a map.sqlite3 save?)",
                FILES_TABLE
            )));
        }

        if !read_only {
            conn.execute_batch("PRAGMA foreign_keys = OFF;")
                .map_err(|e| unreadable(e.to_string()))?;
        }

        debug!(path = %path.display(), read_only, "opened map database");
        Ok(MapDatabase {
            conn,
            path: path.to_path_buf(),
            read_only,
        })
    }

    /// Path of the save file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the handle was opened without write access
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether a transaction is currently open on this handle
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Size of the save file on disk
    pub fn file_size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Every submap record, sorted by coordinate
    ///
    /// Paths under `maps/` that do not end in a `x.y.z.map` basename are
    /// not submaps and are omitted.
    pub fn submaps(&self) -> Result<Vec<SubmapEntry>> {
        let mut entries: Vec<SubmapEntry> = self
            .paths_like(SUBMAP_LIKE)?
            .into_iter()
            .filter_map(|path| record_path::submap_coordinate(&path).map(|coord| SubmapEntry { coord, path }))
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Every overmap record, sorted by key
    ///
    /// Paths starting with `o.` that are not exactly `o.<ox>.<oy>` are omitted.
    pub fn overmaps(&self) -> Result<Vec<OvermapEntry>> {
        let mut entries: Vec<OvermapEntry> = self
            .paths_like(OVERMAP_LIKE)?
            .into_iter()
            .filter_map(|path| record_path::overmap_key(&path).map(|key| OvermapEntry { key, path }))
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Read one record's payload
    pub fn read_record(&self, path: &str) -> Result<Option<StoredBlob>> {
        self.conn
            .query_row(
                "SELECT compression, data FROM files WHERE path = ?1",
                [path],
                |row| {
                    Ok(StoredBlob {
                        compression: row.get(0)?,
                        data: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(sql_error)
    }

    /// Record counts by kind
    pub fn counts(&self) -> Result<EntryCounts> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
            .map_err(sql_error)?;
        Ok(EntryCounts {
            submaps: self.submaps()?.len(),
            overmaps: self.overmaps()?.len(),
            total: usize::try_from(total).unwrap_or_default(),
        })
    }

    /// Begin the single write transaction of a prune
    ///
    /// The write lock is taken immediately. Dropping the returned guard
    /// without committing rolls everything back.
    pub fn transaction(&mut self) -> Result<MapTransaction<'_>> {
        if self.read_only {
            return Err(Error::transaction(format!(
                "{} was opened read-only",
                self.path.display()
            )));
        }
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sql_error)?;
        Ok(MapTransaction::new(tx))
    }

    /// Run a statement batch outside any transaction
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(sql_error)
    }

    fn paths_like(&self, pattern: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path FROM files WHERE path LIKE ?1")
            .map_err(sql_error)?;
        let rows = stmt
            .query_map([pattern], |row| row.get::<_, String>(0))
            .map_err(sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_error)
    }
}

impl std::fmt::Debug for MapDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapDatabase")
            .field("path", &self.path)
            .field("read_only", &self.read_only)
            .finish()
    }
}
