//! Prune executor
//!
//! Applies a `PrunePlan` to the database it was computed against:
//!
//! 1. Show the plan to the caller
//! 2. Ask the caller to confirm (unless confirmation is skipped)
//! 3. Ask the caller for a snapshot and check it is byte-identical
//! 4. Delete submaps, delete overmaps, rewrite grids; all in one transaction
//!
//! Nothing is written before step 4, and step 4 either commits as a whole or
//! leaves the file untouched.

use std::path::{Path, PathBuf};

use mapprune_core::{Error, Result};
use mapprune_storage::{confirm_identical, MapDatabase, MapTransaction};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::plan::PrunePlan;

/// Interaction points a caller supplies to the executor
pub trait PruneHooks {
    /// Called once with the plan about to be applied, confirmed or not
    fn review(&mut self, _plan: &PrunePlan) -> Result<()> {
        Ok(())
    }

    /// Ask whether the plan should be applied
    fn confirm(&mut self, plan: &PrunePlan) -> Result<bool>;

    /// Produce a copy of the database file and return its path
    fn snapshot(&mut self, database: &Path) -> Result<PathBuf>;
}

/// Counts from a committed prune
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    /// Snapshot taken before the transaction
    pub snapshot: PathBuf,
    /// Submap rows deleted
    pub submaps_deleted: usize,
    /// Overmap rows deleted
    pub overmaps_deleted: usize,
    /// Overmap payloads rewritten
    pub overmaps_rewritten: usize,
}

/// What the executor did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Plan applied and committed
    Committed(ExecutionStats),
    /// Caller declined; the file is untouched
    Declined,
}

/// Applies plans to one database
pub struct PruneExecutor<'db> {
    db: &'db mut MapDatabase,
}

impl<'db> PruneExecutor<'db> {
    /// Create an executor over a writable database
    pub fn new(db: &'db mut MapDatabase) -> Self {
        PruneExecutor { db }
    }

    /// Apply `plan`
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the plan belongs to another database
    /// - `Error::BackupFailure` if the snapshot is not an identical copy
    /// - `Error::Transaction` if any write fails; the file is rolled back
    pub fn execute(
        &mut self,
        plan: &PrunePlan,
        skip_confirmation: bool,
        hooks: &mut dyn PruneHooks,
    ) -> Result<ExecutionOutcome> {
        if plan.database != self.db.path() {
            return Err(Error::config(format!(
                "plan was computed for {}, not {}",
                plan.database.display(),
                self.db.path().display()
            )));
        }

        hooks.review(plan)?;
        if !skip_confirmation && !hooks.confirm(plan)? {
            info!("prune declined");
            return Ok(ExecutionOutcome::Declined);
        }

        let snapshot = hooks.snapshot(self.db.path())?;
        confirm_identical(self.db.path(), &snapshot)?;
        info!(snapshot = %snapshot.display(), "snapshot confirmed");

        let mut tx = self.db.transaction()?;
        match apply(&mut tx, plan) {
            Ok((submaps_deleted, overmaps_deleted)) => {
                let overmaps_rewritten = tx.rewritten();
                tx.commit()?;
                Ok(ExecutionOutcome::Committed(ExecutionStats {
                    snapshot,
                    submaps_deleted,
                    overmaps_deleted,
                    overmaps_rewritten,
                }))
            }
            Err(e) => {
                error!(error = %e, "prune failed, rolling back");
                Err(keep_apply_error(e, tx.rollback()))
            }
        }
    }
}

/// The apply failure is what gets reported, even when the rollback fails too
fn keep_apply_error(err: Error, rollback: Result<()>) -> Error {
    if let Err(rollback_err) = rollback {
        warn!(error = %rollback_err, "rollback failed; the transaction is discarded on drop");
    }
    err
}

fn apply(tx: &mut MapTransaction<'_>, plan: &PrunePlan) -> Result<(usize, usize)> {
    let (submap_paths, overmap_paths) = plan.deleted_paths();

    let submaps_deleted = tx.delete_paths(&submap_paths)?;
    expect_count("submap", submap_paths.len(), submaps_deleted)?;

    let overmaps_deleted = tx.delete_paths(&overmap_paths)?;
    expect_count("overmap", overmap_paths.len(), overmaps_deleted)?;

    for action in plan.rewrites() {
        if let Some(data) = &action.data {
            tx.rewrite_data(&action.path, data)?;
        }
    }
    Ok((submaps_deleted, overmaps_deleted))
}

fn expect_count(kind: &str, planned: usize, deleted: usize) -> Result<()> {
    if planned != deleted {
        return Err(Error::transaction(format!(
            "planned to delete {} {} records, deleted {}; database changed since planning",
            planned, kind, deleted
        )));
    }
    Ok(())
}
