//! Pre-mutation snapshot check
//!
//! A prune may only start once a byte-identical copy of the save exists.
//! How the copy is made is up to the caller; this module only confirms it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use mapprune_core::{Error, Result};
use tracing::debug;

const COMPARE_BUFFER: usize = 64 * 1024;

/// Confirm `snapshot` is a separate, byte-identical copy of `database`
///
/// # Errors
///
/// `Error::BackupFailure` if the snapshot is missing, is the database file
/// itself, or differs in size or content. Failing to read either file while
/// comparing is reported the same way.
pub fn confirm_identical(database: &Path, snapshot: &Path) -> Result<()> {
    let reject = |reason: String| Error::BackupFailure {
        snapshot: snapshot.to_path_buf(),
        reason,
    };

    if !snapshot.is_file() {
        return Err(reject("snapshot file does not exist".into()));
    }

    let db_canonical = database
        .canonicalize()
        .map_err(|e| reject(format!("cannot resolve database path: {}", e)))?;
    let snapshot_canonical = snapshot
        .canonicalize()
        .map_err(|e| reject(format!("cannot resolve path: {}", e)))?;
    if db_canonical == snapshot_canonical {
        return Err(reject("snapshot is the database file itself".into()));
    }

    let db_len = std::fs::metadata(database)
        .map_err(|e| reject(format!("cannot stat database: {}", e)))?
        .len();
    let snapshot_len = std::fs::metadata(snapshot)
        .map_err(|e| reject(e.to_string()))?
        .len();
    if db_len != snapshot_len {
        return Err(reject(format!(
            "size differs: database {} bytes, snapshot {} bytes",
            db_len, snapshot_len
        )));
    }

    let mut db_reader = BufReader::with_capacity(
        COMPARE_BUFFER,
        File::open(database).map_err(|e| reject(format!("cannot open database: {}", e)))?,
    );
    let mut snapshot_reader = BufReader::with_capacity(
        COMPARE_BUFFER,
        File::open(snapshot).map_err(|e| reject(e.to_string()))?,
    );
    let mut db_buf = vec![0u8; COMPARE_BUFFER];
    let mut snapshot_buf = vec![0u8; COMPARE_BUFFER];
    let mut offset = 0u64;

    loop {
        let read = read_full(&mut db_reader, &mut db_buf)
            .map_err(|e| reject(format!("cannot read database: {}", e)))?;
        let snapshot_read = read_full(&mut snapshot_reader, &mut snapshot_buf[..read])
            .map_err(|e| reject(e.to_string()))?;
        if snapshot_read != read || db_buf[..read] != snapshot_buf[..read] {
            return Err(reject(format!("content differs near byte {}", offset)));
        }
        if read == 0 {
            break;
        }
        offset += read as u64;
    }

    debug!(
        database = %database.display(),
        snapshot = %snapshot.display(),
        bytes = offset,
        "snapshot confirmed identical"
    );
    Ok(())
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
