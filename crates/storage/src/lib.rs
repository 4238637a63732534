//! Storage layer for mapprune
//!
//! This crate owns every byte that crosses the SQLite boundary:
//! - MapDatabase: explicit handle over one `map.sqlite3` save
//! - MapTransaction: scoped write transaction, rolled back unless committed
//! - Codecs: record compression and the overmap / grid payload structure
//! - Snapshot check: byte-identical backup precondition
//! - Compactor: post-commit `VACUUM`
//!
//! The upstream schema is never redefined; records are only read,
//! rewritten, or deleted.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod compaction;
pub mod database;
pub mod snapshot;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use codec::{CodecError, GridSection, OvermapBlob};
pub use compaction::{CompactInfo, CompactMode, Compactor};
pub use database::{EntryCounts, MapDatabase, MapTransaction, OvermapEntry, StoredBlob, SubmapEntry};
pub use snapshot::confirm_identical;
