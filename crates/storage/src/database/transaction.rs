//! Scoped write transaction
//!
//! A prune applies all of its deletes and rewrites inside one
//! `MapTransaction`. Commit is explicit; dropping the guard (error path,
//! panic, cancellation) rolls the file back to its pre-run state.

use mapprune_core::{Error, Result};
use rusqlite::{params, params_from_iter, Transaction};
use tracing::{debug, info};

use super::sql_error;

/// Maximum number of paths bound into one `DELETE ... IN (...)`
///
/// Stays under SQLite's default host-parameter limit.
pub const DELETE_CHUNK_SIZE: usize = 800;

/// Write transaction over a map database
pub struct MapTransaction<'a> {
    tx: Transaction<'a>,
    deleted: usize,
    rewritten: usize,
}

impl<'a> MapTransaction<'a> {
    pub(crate) fn new(tx: Transaction<'a>) -> Self {
        MapTransaction {
            tx,
            deleted: 0,
            rewritten: 0,
        }
    }

    /// Delete records by path, in chunks
    ///
    /// Returns the number of rows actually deleted.
    pub fn delete_paths(&mut self, paths: &[String]) -> Result<usize> {
        let mut deleted = 0;
        for chunk in paths.chunks(DELETE_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!("DELETE FROM files WHERE path IN ({})", placeholders);
            deleted += self
                .tx
                .execute(&sql, params_from_iter(chunk.iter()))
                .map_err(sql_error)?;
        }
        debug!(requested = paths.len(), deleted, "deleted records");
        self.deleted += deleted;
        Ok(deleted)
    }

    /// Replace the payload of an existing record
    ///
    /// The `compression` column is left as is; the caller encodes `data`
    /// with the record's own codec. Fails if the record does not exist.
    pub fn rewrite_data(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let updated = self
            .tx
            .execute("UPDATE files SET data = ?1 WHERE path = ?2", params![data, path])
            .map_err(sql_error)?;
        if updated != 1 {
            return Err(Error::transaction(format!(
                "expected to rewrite 1 record at {}, matched {}",
                path, updated
            )));
        }
        self.rewritten += 1;
        Ok(())
    }

    /// Rows deleted so far
    pub fn deleted(&self) -> usize {
        self.deleted
    }

    /// Records rewritten so far
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }

    /// Commit every change atomically
    pub fn commit(self) -> Result<()> {
        let (deleted, rewritten) = (self.deleted, self.rewritten);
        self.tx.commit().map_err(sql_error)?;
        info!(deleted, rewritten, "transaction committed");
        Ok(())
    }

    /// Discard every change
    pub fn rollback(self) -> Result<()> {
        self.tx.rollback().map_err(sql_error)?;
        info!("transaction rolled back");
        Ok(())
    }
}
