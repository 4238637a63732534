//! Pruning engine for mapprune
//!
//! This crate orchestrates the storage layer:
//! - RetentionSet: closed set of keys that survive a prune
//! - GridPreserver: grid filtering / clearing for affected overmaps
//! - PrunePlan: one plan per run, shared by dry-run and live paths
//! - PruneExecutor: confirmation, snapshot check, single write transaction
//! - DiffVerifier: cross-snapshot comparison and grid edge checks
//! - DryRunReporter: plan rendering
//! - Pruner: runs one `PruneConfig` end to end
//!
//! The engine never prompts or copies files itself; callers supply those
//! through `PruneHooks`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod executor;
pub mod grid;
pub mod plan;
pub mod pruner;
pub mod report;
pub mod retention;
pub mod verify;

pub use config::PruneConfig;
pub use executor::{ExecutionOutcome, ExecutionStats, PruneExecutor, PruneHooks};
pub use grid::{GridAction, GridActionKind, GridMode, GridPreserver};
pub use plan::{PlanSummary, PrunePlan};
pub use pruner::{PruneReport, Pruner, RunOutcome};
pub use report::{DryRunReporter, ReportFormat};
pub use retention::{Assignment, RetentionSet, RetentionSetBuilder};
pub use verify::{DiffVerifier, EdgeCheck, EdgeDiff, GridEdge, Partition, VerificationReport};
