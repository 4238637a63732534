//! Retention set
//!
//! Expands a keep-list into the closed set of keys that survive a prune:
//!
//! - every listed coordinate, verbatim
//! - the overmap owning each listed coordinate
//!
//! Retention is at submap granularity. An overmap survives when it contains
//! at least one listed coordinate, but its unlisted submaps are still
//! deleted.
//!
//! The set is built once per run and never changes afterwards.

use std::collections::BTreeSet;

use mapprune_core::{Coordinate, Error, LocalPosition, OvermapKey, Result, Span};
use serde::Serialize;

/// Closed set of keys guaranteed to survive a prune
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetentionSet {
    span: Span,
    submaps: BTreeSet<Coordinate>,
    overmaps: BTreeSet<OvermapKey>,
    requested: Vec<Coordinate>,
}

/// Where one requested coordinate lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Requested coordinate
    pub coord: Coordinate,
    /// Owning overmap
    pub overmap: OvermapKey,
    /// Position inside that overmap
    pub local: LocalPosition,
}

impl RetentionSet {
    /// Build a retention set from a keep-list and a raw span
    ///
    /// # Errors
    ///
    /// `Error::Config` if `span <= 0` or `keep` is empty.
    pub fn build(keep: &[Coordinate], span: i32) -> Result<Self> {
        RetentionSetBuilder::new(Span::new(span)?)
            .keep_all(keep.iter().copied())
            .build()
    }

    /// Span the set was built with
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether a submap survives
    pub fn keeps_submap(&self, coord: &Coordinate) -> bool {
        self.submaps.contains(coord)
    }

    /// Whether an overmap survives
    pub fn keeps_overmap(&self, key: &OvermapKey) -> bool {
        self.overmaps.contains(key)
    }

    /// Kept submap coordinates, sorted
    pub fn submaps(&self) -> &BTreeSet<Coordinate> {
        &self.submaps
    }

    /// Kept overmap keys, sorted
    pub fn overmaps(&self) -> &BTreeSet<OvermapKey> {
        &self.overmaps
    }

    /// Coordinates in the order they were requested (duplicates included)
    pub fn requested(&self) -> &[Coordinate] {
        &self.requested
    }

    /// Overmap and local position of every requested coordinate
    pub fn assignments(&self) -> Vec<Assignment> {
        self.requested
            .iter()
            .map(|coord| Assignment {
                coord: *coord,
                overmap: coord.overmap_key(self.span),
                local: coord.local_in(self.span),
            })
            .collect()
    }
}

/// Builder for [`RetentionSet`]
#[derive(Debug, Clone)]
pub struct RetentionSetBuilder {
    span: Span,
    requested: Vec<Coordinate>,
}

impl RetentionSetBuilder {
    /// Start an empty keep-list
    pub fn new(span: Span) -> Self {
        RetentionSetBuilder {
            span,
            requested: Vec::new(),
        }
    }

    /// Add one coordinate
    pub fn keep(mut self, coord: Coordinate) -> Self {
        self.requested.push(coord);
        self
    }

    /// Add many coordinates
    pub fn keep_all(mut self, coords: impl IntoIterator<Item = Coordinate>) -> Self {
        self.requested.extend(coords);
        self
    }

    /// Close the set
    ///
    /// # Errors
    ///
    /// `Error::Config` if nothing was requested: an empty keep-list would
    /// delete the whole world.
    pub fn build(self) -> Result<RetentionSet> {
        if self.requested.is_empty() {
            return Err(Error::config(
                "keep list is empty; nothing would remain after pruning",
            ));
        }

        let submaps: BTreeSet<Coordinate> = self.requested.iter().copied().collect();
        let overmaps = submaps
            .iter()
            .map(|coord| coord.overmap_key(self.span))
            .collect();

        Ok(RetentionSet {
            span: self.span,
            submaps,
            overmaps,
            requested: self.requested,
        })
    }
}
