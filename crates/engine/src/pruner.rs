//! Run orchestration
//!
//! `Pruner` turns one `PruneConfig` into one run:
//!
//! ```text
//! verify-only:  open A (verify_against) and B (database) -> DiffVerifier
//! dry-run:      RetentionSet -> PrunePlan -> (returned for rendering)
//! live:         RetentionSet -> PrunePlan -> PruneExecutor -> Compactor
//!               -> remaining counts -> optional DiffVerifier
//! ```

use std::path::{Path, PathBuf};

use mapprune_core::{Error, Result};
use mapprune_storage::{CompactInfo, CompactMode, Compactor, EntryCounts, MapDatabase};
use serde::Serialize;
use tracing::info;

use crate::config::PruneConfig;
use crate::executor::{ExecutionOutcome, ExecutionStats, PruneExecutor, PruneHooks};
use crate::grid::GridMode;
use crate::plan::PrunePlan;
use crate::retention::RetentionSet;
use crate::verify::{DiffVerifier, VerificationReport};

/// Everything a committed prune produced
#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    /// The plan that was applied
    pub plan: PrunePlan,
    /// Rows deleted and rewritten
    pub stats: ExecutionStats,
    /// Compaction pass
    pub compaction: CompactInfo,
    /// Records left in the save
    pub remaining: EntryCounts,
    /// Post-prune verification, when `verify_against` was given
    pub verification: Option<VerificationReport>,
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Verify-only run
    Verified(VerificationReport),
    /// Dry run; nothing written
    DryRun(PrunePlan),
    /// Caller declined the plan; nothing written
    Declined(PrunePlan),
    /// Plan committed
    Pruned(Box<PruneReport>),
}

/// Runs one configured prune or verification
#[derive(Debug, Clone)]
pub struct Pruner {
    database: PathBuf,
    config: PruneConfig,
}

impl Pruner {
    /// Create a pruner for one save file
    pub fn new(database: impl Into<PathBuf>, config: PruneConfig) -> Self {
        Pruner {
            database: database.into(),
            config,
        }
    }

    /// Save file this pruner targets
    pub fn database(&self) -> &Path {
        &self.database
    }

    /// Configuration of this run
    pub fn config(&self) -> &PruneConfig {
        &self.config
    }

    /// Execute the run
    ///
    /// `hooks` is only consulted on a live prune.
    pub fn run(&self, hooks: &mut dyn PruneHooks) -> Result<RunOutcome> {
        self.config.validate()?;

        if self.config.verify_only {
            return self.verify_only().map(RunOutcome::Verified);
        }

        let retention = self.retention()?;
        if let Some(other) = &self.config.verify_against {
            if !other.is_file() {
                return Err(Error::MissingFile { path: other.clone() });
            }
        }

        if self.config.dry_run {
            let db = MapDatabase::open_read_only(&self.database)?;
            let plan = PrunePlan::compute(&db, &retention, self.config.grid_mode())?;
            info!("dry run, database left untouched");
            return Ok(RunOutcome::DryRun(plan));
        }

        let mut db = MapDatabase::open(&self.database)?;
        let plan = PrunePlan::compute(&db, &retention, self.config.grid_mode())?;

        let stats = match PruneExecutor::new(&mut db).execute(&plan, self.config.force, hooks)? {
            ExecutionOutcome::Committed(stats) => stats,
            ExecutionOutcome::Declined => return Ok(RunOutcome::Declined(plan)),
        };

        let mode = if self.config.no_vacuum {
            CompactMode::Skip
        } else {
            CompactMode::Vacuum
        };
        let compaction = Compactor::new(mode).compact(&db)?;
        let remaining = db.counts()?;
        info!(
            submaps = remaining.submaps,
            overmaps = remaining.overmaps,
            total = remaining.total,
            "records remaining"
        );

        let verification = match &self.config.verify_against {
            Some(other) => {
                let original = MapDatabase::open_read_only(other)?;
                Some(self.verifier(retention).verify(&original, &db)?)
            }
            None => None,
        };

        Ok(RunOutcome::Pruned(Box::new(PruneReport {
            plan,
            stats,
            compaction,
            remaining,
            verification,
        })))
    }

    fn retention(&self) -> Result<RetentionSet> {
        RetentionSet::build(&self.config.keep_coordinates()?, self.config.span)
    }

    fn verifier(&self, retention: RetentionSet) -> DiffVerifier {
        DiffVerifier::new()
            .with_retention(retention)
            .check_edges(self.config.grid_mode() == GridMode::Preserve)
    }

    fn verify_only(&self) -> Result<VerificationReport> {
        let other = self
            .config
            .verify_against
            .as_ref()
            .ok_or_else(|| Error::config("--verify-only requires --verify-against"))?;
        let original = MapDatabase::open_read_only(other)?;
        let target = MapDatabase::open_read_only(&self.database)?;

        let verifier = if self.config.keep_coordinates()?.is_empty() {
            DiffVerifier::new()
        } else {
            self.verifier(self.retention()?)
        };
        verifier.verify(&original, &target)
    }
}
