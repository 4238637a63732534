//! Record paths in the `files` table
//!
//! The upstream save stores every record in one table keyed by a path:
//! - submaps: `maps/<bucket>/<x>.<y>.<z>.map`
//! - overmaps: `o.<ox>.<oy>`
//!
//! Any other path is foreign to the pruner and is never touched.

use crate::coordinate::{Coordinate, OvermapKey};

/// Prefix of submap record paths
pub const SUBMAP_PREFIX: &str = "maps/";

/// Suffix of submap record paths
pub const SUBMAP_SUFFIX: &str = ".map";

/// Prefix of overmap record paths
pub const OVERMAP_PREFIX: &str = "o.";

/// SQL `LIKE` pattern selecting submap candidates
pub const SUBMAP_LIKE: &str = "maps/%.map";

/// SQL `LIKE` pattern selecting overmap candidates
pub const OVERMAP_LIKE: &str = "o.%";

/// Coordinate encoded in a submap record path
///
/// Only the basename is significant; the bucket directory is ignored.
/// Returns `None` for paths that are not submap records.
pub fn submap_coordinate(path: &str) -> Option<Coordinate> {
    if !path.starts_with(SUBMAP_PREFIX) {
        return None;
    }
    let basename = path.rsplit('/').next()?;
    let stem = basename.strip_suffix(SUBMAP_SUFFIX)?;
    let mut parts = stem.split('.');
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Coordinate::new(x, y, z))
}

/// Overmap key encoded in an overmap record path
///
/// Returns `None` for paths that are not exactly `o.<ox>.<oy>`.
pub fn overmap_key(path: &str) -> Option<OvermapKey> {
    let rest = path.strip_prefix(OVERMAP_PREFIX)?;
    let (ox, oy) = rest.split_once('.')?;
    Some(OvermapKey::new(ox.parse().ok()?, oy.parse().ok()?))
}

/// Record path of an overmap
pub fn overmap_path(key: OvermapKey) -> String {
    key.to_string()
}
