//! Core types for mapprune
//!
//! This crate defines the foundational types used throughout the system:
//! - Coordinate: absolute submap position `(x, y, z)`
//! - OvermapKey: owning overmap `(ox, oy)`, derived by floor division
//! - Span: validated submaps-per-overmap-edge
//! - Record paths: mapping `files.path` values to coordinates and keys
//! - Error: error type hierarchy and exit codes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinate;
pub mod error;
pub mod path;

pub use coordinate::{
    parse, parse_list, to_overmap_key, Coordinate, LocalPosition, OvermapKey, Span,
    COMPONENT_DELIMITER, DEFAULT_SPAN, ITEM_DELIMITER,
};
pub use error::{Error, Result};
