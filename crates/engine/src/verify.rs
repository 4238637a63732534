//! Snapshot verification
//!
//! `DiffVerifier` compares two saves, typically the pre-prune snapshot (A)
//! against the pruned result (B):
//!
//! - submap coordinates and overmap keys of both are merge-joined and split
//!   into matched, missing-from-A, missing-from-B and content-mismatch
//! - with a retention set, kept records that A has and B lost are listed
//! - with a retention set and edge checking on, electric and fluid grid
//!   edges between kept coordinates are compared; edges A has and B lacks
//!   are reported
//!
//! Neither database is written.

use std::collections::BTreeSet;
use std::fmt;
use std::iter::Peekable;
use std::path::PathBuf;

use mapprune_core::{Coordinate, Error, OvermapKey, Result, Span};
use mapprune_storage::codec::{GridConnection, OvermapBlob};
use mapprune_storage::MapDatabase;
use serde::Serialize;
use tracing::{debug, info};

use crate::retention::RetentionSet;

/// Keys of two snapshots split by presence and content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition<K> {
    /// Present in both, payload identical
    pub matched: Vec<K>,
    /// Present only in B
    pub missing_from_a: Vec<K>,
    /// Present only in A
    pub missing_from_b: Vec<K>,
    /// Present in both, payload differs
    pub content_mismatch: Vec<K>,
}

impl<K> Default for Partition<K> {
    fn default() -> Self {
        Partition {
            matched: Vec::new(),
            missing_from_a: Vec::new(),
            missing_from_b: Vec::new(),
            content_mismatch: Vec::new(),
        }
    }
}

impl<K> Partition<K> {
    /// Whether both snapshots hold exactly the same records
    pub fn is_identical(&self) -> bool {
        self.missing_from_a.is_empty() && self.missing_from_b.is_empty() && self.content_mismatch.is_empty()
    }
}

/// An undirected grid edge between two absolute coordinates, `from <= to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridEdge {
    /// Lower endpoint
    pub from: Coordinate,
    /// Upper endpoint
    pub to: Coordinate,
}

impl GridEdge {
    /// Build an edge with normalized endpoint order
    pub fn new(a: Coordinate, b: Coordinate) -> Self {
        if a <= b {
            GridEdge { from: a, to: b }
        } else {
            GridEdge { from: b, to: a }
        }
    }
}

impl fmt::Display for GridEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  <->  {}", self.from, self.to)
    }
}

/// Edge comparison for one network kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeDiff {
    /// Edges found in A
    pub in_a: usize,
    /// Edges found in B
    pub in_b: usize,
    /// Edges in A that B lacks, sorted
    pub missing: Vec<GridEdge>,
}

/// Grid edges between kept coordinates in both snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeCheck {
    /// Kept coordinates present in A; only edges between these count
    pub endpoints: usize,
    /// Electric network
    pub electric: EdgeDiff,
    /// Fluid network
    pub fluid: EdgeDiff,
}

impl EdgeCheck {
    /// Total edges missing from B
    pub fn missing(&self) -> usize {
        self.electric.missing.len() + self.fluid.missing.len()
    }
}

/// Result of comparing two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// First snapshot (usually the pre-prune copy)
    pub a: PathBuf,
    /// Second snapshot (usually the pruned save)
    pub b: PathBuf,
    /// Submap records by coordinate
    pub submaps: Partition<Coordinate>,
    /// Overmap records by key
    pub overmaps: Partition<OvermapKey>,
    /// Whether a retention set scoped the check
    pub retention_checked: bool,
    /// Kept coordinates present in A but not in B
    pub lost_submaps: Vec<Coordinate>,
    /// Kept overmaps present in A but not in B
    pub lost_overmaps: Vec<OvermapKey>,
    /// Grid edge comparison, when performed
    pub edges: Option<EdgeCheck>,
}

impl VerificationReport {
    fn lost_records(&self) -> usize {
        if self.retention_checked {
            self.lost_submaps.len() + self.lost_overmaps.len()
        } else {
            self.submaps.missing_from_b.len() + self.overmaps.missing_from_b.len()
        }
    }

    fn content_mismatches(&self) -> usize {
        let overmaps = if self.retention_checked {
            0
        } else {
            self.overmaps.content_mismatch.len()
        };
        self.submaps.content_mismatch.len() + overmaps
    }

    fn unexpected_records(&self) -> usize {
        self.submaps.missing_from_a.len() + self.overmaps.missing_from_a.len()
    }

    fn missing_edges(&self) -> usize {
        self.edges.as_ref().map_or(0, EdgeCheck::missing)
    }

    /// Whether B is a consistent result of A
    ///
    /// Without a retention set B must equal A. With one, B may lack records
    /// that were not kept and overmap payloads may differ (grid filtering),
    /// but nothing kept may be lost and no kept grid edge may vanish.
    pub fn is_consistent(&self) -> bool {
        self.content_mismatches() == 0
            && self.unexpected_records() == 0
            && self.lost_records() == 0
            && self.missing_edges() == 0
    }

    /// Turn an inconsistent report into `Error::VerificationMismatch`
    pub fn into_result(self) -> Result<Self> {
        if self.is_consistent() {
            return Ok(self);
        }
        Err(Error::VerificationMismatch {
            content_mismatches: self.content_mismatches(),
            unexpected_records: self.unexpected_records(),
            lost_records: self.lost_records(),
            missing_edges: self.missing_edges(),
        })
    }
}

/// Compares two saves
#[derive(Debug, Clone, Default)]
pub struct DiffVerifier {
    retention: Option<RetentionSet>,
    check_edges: bool,
}

impl DiffVerifier {
    /// Plain comparison with no retention scoping
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope the check to a retention set; enables edge checking
    pub fn with_retention(mut self, retention: RetentionSet) -> Self {
        self.retention = Some(retention);
        self.check_edges = true;
        self
    }

    /// Turn grid edge checking on or off (only meaningful with a retention set)
    pub fn check_edges(mut self, enabled: bool) -> Self {
        self.check_edges = enabled;
        self
    }

    /// Compare `a` against `b`
    ///
    /// # Errors
    ///
    /// `Error::Transaction` on read failures, `Error::GridCorruption` if a
    /// kept overmap cannot be decoded during edge checking.
    pub fn verify(&self, a: &MapDatabase, b: &MapDatabase) -> Result<VerificationReport> {
        let submaps = merge_join(
            a.submaps()?.into_iter().map(|e| (e.coord, e.path)),
            b.submaps()?.into_iter().map(|e| (e.coord, e.path)),
            |path_a, path_b| same_payload(a, path_a, b, path_b),
        )?;
        let overmaps = merge_join(
            a.overmaps()?.into_iter().map(|e| (e.key, e.path)),
            b.overmaps()?.into_iter().map(|e| (e.key, e.path)),
            |path_a, path_b| same_payload(a, path_a, b, path_b),
        )?;

        let mut report = VerificationReport {
            a: a.path().to_path_buf(),
            b: b.path().to_path_buf(),
            submaps,
            overmaps,
            retention_checked: self.retention.is_some(),
            lost_submaps: Vec::new(),
            lost_overmaps: Vec::new(),
            edges: None,
        };

        if let Some(retention) = &self.retention {
            report.lost_submaps = report
                .submaps
                .missing_from_b
                .iter()
                .filter(|coord| retention.keeps_submap(coord))
                .copied()
                .collect();
            report.lost_overmaps = report
                .overmaps
                .missing_from_b
                .iter()
                .filter(|key| retention.keeps_overmap(key))
                .copied()
                .collect();

            if self.check_edges {
                let in_a: BTreeSet<Coordinate> = a.submaps()?.into_iter().map(|e| e.coord).collect();
                let endpoints: BTreeSet<Coordinate> =
                    retention.submaps().intersection(&in_a).copied().collect();
                report.edges = Some(compare_edges(a, b, retention, &endpoints)?);
            }
        }

        info!(
            matched = report.submaps.matched.len(),
            missing_from_a = report.submaps.missing_from_a.len(),
            missing_from_b = report.submaps.missing_from_b.len(),
            content_mismatch = report.submaps.content_mismatch.len(),
            consistent = report.is_consistent(),
            "verification finished"
        );
        Ok(report)
    }
}

fn same_payload(a: &MapDatabase, path_a: &str, b: &MapDatabase, path_b: &str) -> Result<bool> {
    Ok(a.read_record(path_a)? == b.read_record(path_b)?)
}

fn merge_join<K, A, B, F>(a: A, b: B, mut same: F) -> Result<Partition<K>>
where
    K: Ord + Copy,
    A: Iterator<Item = (K, String)>,
    B: Iterator<Item = (K, String)>,
    F: FnMut(&str, &str) -> Result<bool>,
{
    let mut partition = Partition::default();
    let mut a: Peekable<A> = a.peekable();
    let mut b: Peekable<B> = b.peekable();

    loop {
        let order = match (a.peek(), b.peek()) {
            (None, None) => break,
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some((ka, _)), Some((kb, _))) => ka.cmp(kb),
        };
        match order {
            std::cmp::Ordering::Less => {
                if let Some((key, _)) = a.next() {
                    partition.missing_from_b.push(key);
                }
            }
            std::cmp::Ordering::Greater => {
                if let Some((key, _)) = b.next() {
                    partition.missing_from_a.push(key);
                }
            }
            std::cmp::Ordering::Equal => {
                if let (Some((key, path_a)), Some((_, path_b))) = (a.next(), b.next()) {
                    if same(&path_a, &path_b)? {
                        partition.matched.push(key);
                    } else {
                        partition.content_mismatch.push(key);
                    }
                }
            }
        }
    }
    Ok(partition)
}

#[derive(Default)]
struct EdgeSets {
    electric: BTreeSet<GridEdge>,
    fluid: BTreeSet<GridEdge>,
}

fn compare_edges(
    a: &MapDatabase,
    b: &MapDatabase,
    retention: &RetentionSet,
    endpoints: &BTreeSet<Coordinate>,
) -> Result<EdgeCheck> {
    let edges_a = collect_edges(a, retention, endpoints)?;
    let edges_b = collect_edges(b, retention, endpoints)?;

    let diff = |in_a: &BTreeSet<GridEdge>, in_b: &BTreeSet<GridEdge>| EdgeDiff {
        in_a: in_a.len(),
        in_b: in_b.len(),
        missing: in_a.difference(in_b).copied().collect(),
    };
    let check = EdgeCheck {
        endpoints: endpoints.len(),
        electric: diff(&edges_a.electric, &edges_b.electric),
        fluid: diff(&edges_a.fluid, &edges_b.fluid),
    };
    debug!(
        endpoints = check.endpoints,
        missing = check.missing(),
        "grid edges compared"
    );
    Ok(check)
}

fn collect_edges(
    db: &MapDatabase,
    retention: &RetentionSet,
    endpoints: &BTreeSet<Coordinate>,
) -> Result<EdgeSets> {
    let span = retention.span();
    let mut sets = EdgeSets::default();

    for key in retention.overmaps() {
        let Some(stored) = db.read_record(&key.to_string())? else {
            continue;
        };
        let grid = OvermapBlob::decode(stored.compression.as_deref(), &stored.data)
            .and_then(|blob| blob.grid())
            .map_err(|e| Error::grid_corruption(*key, e.to_string()))?;

        for (connections, out) in [(&grid.electric, &mut sets.electric), (&grid.fluid, &mut sets.fluid)] {
            if let Some(connections) = connections {
                add_edges(*key, span, connections, endpoints, out)?;
            }
        }
    }
    Ok(sets)
}

fn add_edges(
    key: OvermapKey,
    span: Span,
    connections: &[GridConnection],
    endpoints: &BTreeSet<Coordinate>,
    out: &mut BTreeSet<GridEdge>,
) -> Result<()> {
    let out_of_range = || Error::grid_corruption(key, "grid position lies outside the coordinate range");
    for connection in connections {
        let node = Coordinate::from_local(key, connection.position, span).ok_or_else(out_of_range)?;
        if !endpoints.contains(&node) {
            continue;
        }
        for neighbor in connection.neighbors() {
            let other = neighbor
                .and_then(|local| Coordinate::from_local(key, local, span))
                .ok_or_else(out_of_range)?;
            if endpoints.contains(&other) {
                out.insert(GridEdge::new(node, other));
            }
        }
    }
    Ok(())
}
