//! Error types for mapprune
//!
//! This module defines all error types surfaced by the pruning engine.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every variant carries enough detail (path, key, coordinate) for the CLI
//! to render a precise message and pick an exit code.

use crate::coordinate::OvermapKey;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mapprune operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the pruning engine
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed coordinate text
    #[error("Invalid coordinate {input:?}: {reason} (expected e.g. 119.183.10)")]
    Parse {
        /// The offending input item
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid span, empty retention set, or bad option combination
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database or verify-against file absent
    #[error("File not found: {}", path.display())]
    MissingFile {
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// File exists but is not a readable map database
    #[error("Unreadable map database {}: {reason}", path.display())]
    UnreadableDatabase {
        /// Database path
        path: PathBuf,
        /// Why it could not be used
        reason: String,
    },

    /// Pre-mutation snapshot could not be confirmed
    #[error("Backup precondition failed for {}: {reason}", snapshot.display())]
    BackupFailure {
        /// Snapshot path that was checked
        snapshot: PathBuf,
        /// Why the snapshot was rejected
        reason: String,
    },

    /// Grid payload of an overmap could not be decoded or re-encoded
    #[error("Grid data of overmap {key} is corrupt: {reason}")]
    GridCorruption {
        /// Overmap whose grid data failed
        key: OvermapKey,
        /// Decoder message
        reason: String,
    },

    /// Storage failure while reading, deleting or rewriting
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Two snapshots differ where they must not
    #[error(
        "Verification failed: {content_mismatches} content mismatch(es), {unexpected_records} unexpected record(s), {lost_records} lost record(s), {missing_edges} missing grid edge(s)"
    )]
    VerificationMismatch {
        /// Records present in both snapshots with differing payloads
        content_mismatches: usize,
        /// Records present only in the second snapshot
        unexpected_records: usize,
        /// Records that should have survived but are absent from the second snapshot
        lost_records: usize,
        /// Grid edges among kept coordinates missing from the second snapshot
        missing_edges: usize,
    },

    /// I/O error (file reads, copies, prompts)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a parse error for one input item
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a transaction error
    pub fn transaction(msg: impl Into<String>) -> Self {
        Error::Transaction(msg.into())
    }

    /// Create a grid corruption error for an overmap
    pub fn grid_corruption(key: OvermapKey, reason: impl Into<String>) -> Self {
        Error::GridCorruption {
            key,
            reason: reason.into(),
        }
    }

    /// Process exit code for this error
    ///
    /// | code | meaning |
    /// |------|---------|
    /// | 1 | verification mismatch |
    /// | 2 | parse / configuration failure |
    /// | 3 | missing or unreadable database |
    /// | 4 | backup precondition not met |
    /// | 5 | grid corruption detected |
    /// | 6 | storage / transaction failure |
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::VerificationMismatch { .. } => 1,
            Error::Parse { .. } | Error::Config(_) => 2,
            Error::MissingFile { .. } | Error::UnreadableDatabase { .. } | Error::Io(_) => 3,
            Error::BackupFailure { .. } => 4,
            Error::GridCorruption { .. } => 5,
            Error::Transaction(_) => 6,
        }
    }
}
