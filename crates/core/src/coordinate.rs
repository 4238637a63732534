//! Coordinate and overmap addressing
//!
//! The world is addressed at two levels:
//! - **Coordinate** `(x, y, z)`: absolute submap position, may be negative
//! - **OvermapKey** `(ox, oy)`: the overmap owning a submap, spanning all z-levels
//!
//! An overmap is a square of `span` × `span` submaps. The owning overmap is
//! derived with floor division, so with span 180 the submap at `x = -1`
//! belongs to overmap `ox = -1`, not `ox = 0`.
//!
//! ## Text form
//!
//! Coordinates are written `x.y.z` (e.g. `119.183.10`). Whitespace around the
//! whole item and around each component is tolerated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default overmap span in submaps
pub const DEFAULT_SPAN: i32 = 180;

/// Separator between the components of a coordinate
pub const COMPONENT_DELIMITER: char = '.';

/// Separator between coordinates in a keep list
pub const ITEM_DELIMITER: char = ',';

/// Absolute submap coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    /// East-west submap index
    pub x: i32,
    /// North-south submap index
    pub y: i32,
    /// Vertical level
    pub z: i32,
}

impl Coordinate {
    /// Create a coordinate
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Coordinate { x, y, z }
    }

    /// Parse `x.y.z`
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` when the text does not hold exactly three
    /// integer components.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let parts: Vec<&str> = trimmed.split(COMPONENT_DELIMITER).collect();
        if parts.len() != 3 {
            return Err(Error::parse(
                trimmed,
                format!("expected 3 components, found {}", parts.len()),
            ));
        }

        let mut values = [0i32; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            let part = part.trim();
            *slot = part
                .parse::<i32>()
                .map_err(|_| Error::parse(trimmed, format!("{:?} is not an integer", part)))?;
        }

        Ok(Coordinate::new(values[0], values[1], values[2]))
    }

    /// Owning overmap for this coordinate
    pub fn overmap_key(&self, span: Span) -> OvermapKey {
        OvermapKey::new(
            self.x.div_euclid(span.get()),
            self.y.div_euclid(span.get()),
        )
    }

    /// Position of this coordinate relative to its overmap origin
    pub fn local_in(&self, span: Span) -> LocalPosition {
        LocalPosition::new(
            self.x.rem_euclid(span.get()),
            self.y.rem_euclid(span.get()),
            self.z,
        )
    }

    /// Absolute coordinate of a local position inside `key`
    ///
    /// `None` when the result does not fit in `i32`.
    pub fn from_local(key: OvermapKey, local: LocalPosition, span: Span) -> Option<Self> {
        let (origin_x, origin_y) = key.origin(span)?;
        Some(Coordinate::new(
            origin_x.checked_add(local.x)?,
            origin_y.checked_add(local.y)?,
            local.z,
        ))
    }

    /// Coordinate shifted by a grid offset, `None` on overflow
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Coordinate::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.x, self.y, self.z)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Coordinate::parse(s)
    }
}

/// Position relative to an overmap's origin submap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalPosition {
    /// Offset from the overmap's west edge
    pub x: i32,
    /// Offset from the overmap's north edge
    pub y: i32,
    /// Vertical level
    pub z: i32,
}

impl LocalPosition {
    /// Create a local position
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        LocalPosition { x, y, z }
    }

    /// Position shifted by a grid offset, `None` on overflow
    pub fn offset(&self, [dx, dy, dz]: [i32; 3]) -> Option<Self> {
        Some(LocalPosition::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }
}

impl fmt::Display for LocalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.x, self.y, self.z)
    }
}

/// Overmap identifier
///
/// Not z-indexed: one overmap aggregates every level of its submaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OvermapKey {
    /// Overmap column
    pub ox: i32,
    /// Overmap row
    pub oy: i32,
}

impl OvermapKey {
    /// Create an overmap key
    pub const fn new(ox: i32, oy: i32) -> Self {
        OvermapKey { ox, oy }
    }

    /// Absolute (x, y) of this overmap's first submap
    ///
    /// `None` when the origin lies outside `i32`, which only happens for
    /// keys read from damaged records.
    pub fn origin(&self, span: Span) -> Option<(i32, i32)> {
        Some((
            self.ox.checked_mul(span.get())?,
            self.oy.checked_mul(span.get())?,
        ))
    }
}

impl fmt::Display for OvermapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o.{}.{}", self.ox, self.oy)
    }
}

/// Submaps per overmap edge, always positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Span(i32);

impl Span {
    /// Validate a span
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when `value <= 0`.
    pub fn new(value: i32) -> Result<Self> {
        if value <= 0 {
            return Err(Error::config(format!(
                "span must be a positive integer, got {}",
                value
            )));
        }
        Ok(Span(value))
    }

    /// Raw span value
    pub fn get(&self) -> i32 {
        self.0
    }
}

impl Default for Span {
    fn default() -> Self {
        Span(DEFAULT_SPAN)
    }
}

impl TryFrom<i32> for Span {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Span::new(value)
    }
}

impl From<Span> for i32 {
    fn from(span: Span) -> i32 {
        span.0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a single coordinate
pub fn parse(text: &str) -> Result<Coordinate> {
    Coordinate::parse(text)
}

/// Parse a delimited list of coordinates
///
/// Blank items are skipped. Order is preserved and duplicates are kept.
pub fn parse_list(text: &str, item_delimiter: char) -> Result<Vec<Coordinate>> {
    text.split(item_delimiter)
        .filter(|item| !item.trim().is_empty())
        .map(Coordinate::parse)
        .collect()
}

/// Owning overmap of `coord` for a raw span value
///
/// # Errors
///
/// Returns `Error::Config` when `span <= 0`.
pub fn to_overmap_key(coord: Coordinate, span: i32) -> Result<OvermapKey> {
    Ok(coord.overmap_key(Span::new(span)?))
}
