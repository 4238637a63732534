//! Prune plan
//!
//! A `PrunePlan` is computed once per run from the database contents and the
//! retention set. The dry-run reporter renders it and the executor applies
//! it; both see the same value, so a dry run reports exactly what a live run
//! would do.

use std::collections::BTreeSet;
use std::path::PathBuf;

use mapprune_core::{Coordinate, OvermapKey, Result};
use mapprune_storage::{MapDatabase, OvermapEntry, SubmapEntry};
use serde::Serialize;
use tracing::{info, warn};

use crate::grid::{GridAction, GridActionKind, GridMode, GridPreserver};
use crate::retention::RetentionSet;

/// Everything a prune will do, decided before anything is written
#[derive(Debug, Clone, Serialize)]
pub struct PrunePlan {
    /// Save file the plan was computed against
    pub database: PathBuf,
    /// Keys guaranteed to survive
    pub retention: RetentionSet,
    /// How grids of surviving overmaps are handled
    pub grid_mode: GridMode,
    /// Submap records that survive
    pub submaps_kept: Vec<SubmapEntry>,
    /// Submap records to delete
    pub submaps_deleted: Vec<SubmapEntry>,
    /// Overmap records that survive
    pub overmaps_kept: Vec<OvermapEntry>,
    /// Overmap records to delete
    pub overmaps_deleted: Vec<OvermapEntry>,
    /// Grid rewrites, clears and drops
    pub grid_actions: Vec<GridAction>,
    /// Kept coordinates with no submap record in the save
    pub missing_submaps: Vec<Coordinate>,
    /// Kept overmap keys with no overmap record in the save
    pub missing_overmaps: Vec<OvermapKey>,
}

/// Counts of a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    /// Submap records that survive
    pub submaps_kept: usize,
    /// Submap records to delete
    pub submaps_deleted: usize,
    /// Overmap records that survive
    pub overmaps_kept: usize,
    /// Overmap records to delete
    pub overmaps_deleted: usize,
    /// Overmaps whose grid is filtered
    pub grid_rewrites: usize,
    /// Overmaps whose grid is emptied
    pub grid_clears: usize,
    /// Grids leaving with their overmap
    pub grid_drops: usize,
}

impl PrunePlan {
    /// Compute the plan for one save
    ///
    /// Reads record paths and the payload of every surviving overmap. Never
    /// writes.
    ///
    /// # Errors
    ///
    /// `Error::GridCorruption` if a surviving overmap cannot be decoded,
    /// `Error::Transaction` on read failures.
    pub fn compute(db: &MapDatabase, retention: &RetentionSet, grid_mode: GridMode) -> Result<Self> {
        let (submaps_kept, submaps_deleted): (Vec<SubmapEntry>, Vec<SubmapEntry>) = db
            .submaps()?
            .into_iter()
            .partition(|entry| retention.keeps_submap(&entry.coord));
        let (overmaps_kept, overmaps_deleted): (Vec<OvermapEntry>, Vec<OvermapEntry>) = db
            .overmaps()?
            .into_iter()
            .partition(|entry| retention.keeps_overmap(&entry.key));

        let span = retention.span();
        let survivors: BTreeSet<Coordinate> = submaps_kept.iter().map(|e| e.coord).collect();

        let missing_submaps: Vec<Coordinate> = retention
            .submaps()
            .iter()
            .filter(|coord| !survivors.contains(coord))
            .copied()
            .collect();
        let present: BTreeSet<OvermapKey> = overmaps_kept.iter().map(|e| e.key).collect();
        let missing_overmaps: Vec<OvermapKey> = retention
            .overmaps()
            .iter()
            .filter(|key| !present.contains(key))
            .copied()
            .collect();
        for coord in &missing_submaps {
            warn!(coord = %coord, "kept coordinate has no submap record");
        }
        for key in &missing_overmaps {
            warn!(overmap = %key, "kept overmap has no record");
        }

        let grid_actions =
            GridPreserver::new(grid_mode, span).plan(db, &overmaps_kept, &overmaps_deleted, &survivors)?;

        let plan = PrunePlan {
            database: db.path().to_path_buf(),
            retention: retention.clone(),
            grid_mode,
            submaps_kept,
            submaps_deleted,
            overmaps_kept,
            overmaps_deleted,
            grid_actions,
            missing_submaps,
            missing_overmaps,
        };
        let summary = plan.summary();
        info!(
            submaps_deleted = summary.submaps_deleted,
            overmaps_deleted = summary.overmaps_deleted,
            grid_rewrites = summary.grid_rewrites,
            grid_clears = summary.grid_clears,
            "prune plan computed"
        );
        Ok(plan)
    }

    /// Counts of this plan
    pub fn summary(&self) -> PlanSummary {
        let count = |kind: GridActionKind| self.grid_actions.iter().filter(|a| a.kind == kind).count();
        PlanSummary {
            submaps_kept: self.submaps_kept.len(),
            submaps_deleted: self.submaps_deleted.len(),
            overmaps_kept: self.overmaps_kept.len(),
            overmaps_deleted: self.overmaps_deleted.len(),
            grid_rewrites: count(GridActionKind::Rewrite),
            grid_clears: count(GridActionKind::Clear),
            grid_drops: count(GridActionKind::Drop),
        }
    }

    /// Paths of every record to delete, submaps first
    pub fn deleted_paths(&self) -> (Vec<String>, Vec<String>) {
        (
            self.submaps_deleted.iter().map(|e| e.path.clone()).collect(),
            self.overmaps_deleted.iter().map(|e| e.path.clone()).collect(),
        )
    }

    /// Grid actions that rewrite a surviving record
    pub fn rewrites(&self) -> impl Iterator<Item = &GridAction> {
        self.grid_actions.iter().filter(|a| a.data.is_some())
    }

    /// Whether applying the plan would change nothing
    pub fn is_noop(&self) -> bool {
        self.submaps_deleted.is_empty() && self.overmaps_deleted.is_empty() && self.rewrites().next().is_none()
    }
}
