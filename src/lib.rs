//! mapprune - prune a Bright Nights `map.sqlite3` save
//!
//! Keeps a list of submap coordinates (and the overmaps that own them) and
//! deletes everything else, while keeping electric and fluid grids inside the
//! surviving overmaps consistent with the submaps that remain.
//!
//! # Quick Start
//!
//! ```ignore
//! use mapprune::{PruneConfig, Pruner, RunOutcome};
//!
//! let config = PruneConfig {
//!     keep: vec!["119.183.10, 119.183.9".into()],
//!     dry_run: true,
//!     ..PruneConfig::default()
//! };
//! if let RunOutcome::DryRun(plan) = Pruner::new("map.sqlite3", config).run(&mut hooks)? {
//!     println!("{} submaps would be deleted", plan.summary().submaps_deleted);
//! }
//! ```
//!
//! # Architecture
//!
//! - `mapprune-core`: coordinates, record paths, errors
//! - `mapprune-storage`: SQLite handle, codecs, snapshot check, compaction
//! - `mapprune-engine`: retention, planning, execution, verification
//!
//! Only the engine API and the core types are re-exported here.

pub use mapprune_core::{Coordinate, Error, OvermapKey, Result, Span};
pub use mapprune_engine::*;
pub use mapprune_storage::{CompactMode, EntryCounts, MapDatabase};
