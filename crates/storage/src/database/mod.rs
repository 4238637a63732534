//! Map database access
//!
//! This module provides the storage-layer handle over a save file:
//!
//! - `MapDatabase`: explicit handle (open, list, read, begin transaction)
//! - `MapTransaction`: scoped write transaction, rolled back unless committed
//!
//! # Example
//!
//! ```ignore
//! use mapprune_storage::database::MapDatabase;
//!
//! let mut db = MapDatabase::open("map.sqlite3")?;
//! let doomed: Vec<String> = db.submaps()?.into_iter().map(|e| e.path).collect();
//!
//! let mut tx = db.transaction()?;
//! tx.delete_paths(&doomed)?;
//! tx.commit()?;
//! ```

pub mod handle;
pub mod transaction;

pub use handle::{EntryCounts, MapDatabase, OvermapEntry, StoredBlob, SubmapEntry, FILES_TABLE};
pub use transaction::{MapTransaction, DELETE_CHUNK_SIZE};

use mapprune_core::Error;

/// Convert a SQLite failure into the engine's storage error
pub(crate) fn sql_error(err: rusqlite::Error) -> Error {
    Error::transaction(err.to_string())
}
