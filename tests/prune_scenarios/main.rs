//! Integration tests for whole prune runs.
//!
//! Each test builds a real `map.sqlite3` in a temporary directory, runs the
//! `Pruner` end to end and inspects the resulting file.

#[path = "../common/mod.rs"]
mod common;

mod coordinates;
mod grids;
mod safety;
mod scenario;
