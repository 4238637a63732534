//! Post-prune compaction
//!
//! Deleting records leaves free pages inside the SQLite file; `VACUUM`
//! rebuilds the file to reclaim them. SQLite only allows `VACUUM` outside a
//! transaction, so compaction runs strictly after the prune has committed.
//!
//! # Compaction Modes
//!
//! - **Skip**: leave the file at its current size (faster)
//! - **Vacuum**: rebuild the file and reclaim free pages
//!
//! Compaction never changes retained records, only file size.
//!
//! # Example
//!
//! ```ignore
//! let info = Compactor::new(CompactMode::Vacuum).compact(&db)?;
//! println!("Reclaimed {} bytes", info.reclaimed_bytes);
//! ```

use std::time::Instant;

use mapprune_core::{Error, Result};
use serde::Serialize;
use tracing::info;

use crate::database::MapDatabase;

/// Compaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CompactMode {
    /// Leave the file as is
    Skip,

    /// Rebuild the file with `VACUUM`
    #[default]
    Vacuum,
}

impl CompactMode {
    /// Get the name of this compaction mode for logging
    pub fn name(&self) -> &'static str {
        match self {
            CompactMode::Skip => "skip",
            CompactMode::Vacuum => "vacuum",
        }
    }
}

impl std::fmt::Display for CompactMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of a compaction pass
#[derive(Debug, Clone, Serialize)]
pub struct CompactInfo {
    /// Compaction mode used
    pub mode: CompactMode,

    /// File size before compaction
    pub bytes_before: u64,

    /// File size after compaction
    pub bytes_after: u64,

    /// Bytes reclaimed from disk
    pub reclaimed_bytes: u64,

    /// Duration of compaction in milliseconds
    pub duration_ms: u64,
}

impl CompactInfo {
    /// Create an empty CompactInfo for a given mode
    pub fn new(mode: CompactMode) -> Self {
        CompactInfo {
            mode,
            bytes_before: 0,
            bytes_after: 0,
            reclaimed_bytes: 0,
            duration_ms: 0,
        }
    }

    /// Check if any compaction actually occurred
    pub fn did_compact(&self) -> bool {
        self.mode == CompactMode::Vacuum
    }

    /// Get a summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "mode={}, bytes_before={}, bytes_after={}, bytes_reclaimed={}, duration_ms={}",
            self.mode, self.bytes_before, self.bytes_after, self.reclaimed_bytes, self.duration_ms
        )
    }
}

/// Reclaims free pages after a committed prune
#[derive(Debug, Clone, Copy)]
pub struct Compactor {
    mode: CompactMode,
}

impl Compactor {
    /// Create a compactor
    pub fn new(mode: CompactMode) -> Self {
        Compactor { mode }
    }

    /// Compaction mode
    pub fn mode(&self) -> CompactMode {
        self.mode
    }

    /// Compact the database file
    ///
    /// # Errors
    ///
    /// `Error::Transaction` if a transaction is still open on `db` or
    /// `VACUUM` fails.
    pub fn compact(&self, db: &MapDatabase) -> Result<CompactInfo> {
        let mut compact_info = CompactInfo::new(self.mode);
        if self.mode == CompactMode::Skip {
            info!("compaction skipped");
            return Ok(compact_info);
        }
        if db.in_transaction() {
            return Err(Error::transaction(
                "VACUUM is only valid outside an open transaction",
            ));
        }

        let start = Instant::now();
        compact_info.bytes_before = db.file_size()?;
        db.execute_batch("VACUUM;")?;
        compact_info.bytes_after = db.file_size()?;
        compact_info.reclaimed_bytes = compact_info
            .bytes_before
            .saturating_sub(compact_info.bytes_after);
        compact_info.duration_ms = start.elapsed().as_millis() as u64;

        info!(summary = %compact_info.summary(), "compaction finished");
        Ok(compact_info)
    }
}
