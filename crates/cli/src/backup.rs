//! Pre-prune backup copy.
//!
//! The copy goes next to the database as `<db>.bak`; if that exists,
//! `<db>.bak1`, `<db>.bak2`, ... are tried in order. Existing backups are
//! never overwritten.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mapprune_core::{Error, Result};
use tracing::info;

/// First free backup path for `database`.
pub fn next_backup_path(database: &Path) -> PathBuf {
    let candidate = |suffix: &str| {
        let mut name = OsString::from(database.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };

    let first = candidate(".bak");
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|i| candidate(&format!(".bak{}", i)))
        .find(|path| !path.exists())
        .unwrap_or(first)
}

/// Copy `database` to its next free backup path.
///
/// # Errors
///
/// `Error::BackupFailure` if the copy cannot be written.
pub fn create_backup(database: &Path) -> Result<PathBuf> {
    let target = next_backup_path(database);
    std::fs::copy(database, &target).map_err(|e| Error::BackupFailure {
        snapshot: target.clone(),
        reason: e.to_string(),
    })?;
    info!(backup = %target.display(), "backup created");
    Ok(target)
}
