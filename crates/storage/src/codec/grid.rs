//! Grid section codec.
//!
//! Electric and fluid networks live inside the overmap JSON body:
//!
//! - `electric_grid_connections` / `fluid_grid_connections`: arrays of
//!   `[[lx,ly,lz], [dx,dy,dz], ...]`, a node position (local to the overmap)
//!   followed by offsets to the nodes it links to
//! - `fluid_grid_storage`: arrays whose first element is a node position;
//!   the remaining elements are opaque and carried through verbatim
//!
//! Decoding is strict: any entry that does not have this shape is an error,
//! never skipped.

use mapprune_core::LocalPosition;
use serde_json::{Map, Value};

use super::traits::CodecError;

/// Electric network links
pub const ELECTRIC_CONNECTIONS: &str = "electric_grid_connections";

/// Fluid network links
pub const FLUID_CONNECTIONS: &str = "fluid_grid_connections";

/// Fluid tank contents per node
pub const FLUID_STORAGE: &str = "fluid_grid_storage";

/// All grid fields of an overmap body
pub const GRID_FIELDS: [&str; 3] = [ELECTRIC_CONNECTIONS, FLUID_CONNECTIONS, FLUID_STORAGE];

/// One node of a network and its outgoing links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConnection {
    /// Node position, local to the owning overmap
    pub position: LocalPosition,
    /// Offsets from `position` to linked nodes
    pub offsets: Vec<[i32; 3]>,
}

impl GridConnection {
    /// Local positions of every linked node
    ///
    /// An offset that leaves the `i32` range yields `None`.
    pub fn neighbors(&self) -> impl Iterator<Item = Option<LocalPosition>> + '_ {
        self.offsets.iter().map(move |offset| self.position.offset(*offset))
    }
}

/// Stored fluid at one node
#[derive(Debug, Clone, PartialEq)]
pub struct GridStorageEntry {
    /// Node position, local to the owning overmap
    pub position: LocalPosition,
    /// Remaining array elements, untouched
    pub payload: Vec<Value>,
}

/// Outcome of filtering a grid section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridFilterStats {
    /// Node entries removed (connections and storage)
    pub entries_removed: usize,
    /// Links removed from surviving nodes
    pub links_removed: usize,
}

impl GridFilterStats {
    /// Whether filtering changed anything
    pub fn changed(&self) -> bool {
        self.entries_removed > 0 || self.links_removed > 0
    }
}

/// Decoded grid fields of one overmap
///
/// A field absent from the body (or `null`) decodes to `None` and is
/// left absent on re-encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSection {
    /// `electric_grid_connections`
    pub electric: Option<Vec<GridConnection>>,
    /// `fluid_grid_connections`
    pub fluid: Option<Vec<GridConnection>>,
    /// `fluid_grid_storage`
    pub storage: Option<Vec<GridStorageEntry>>,
}

impl GridSection {
    /// Decode grid fields from an overmap body
    pub fn decode(body: &Map<String, Value>) -> Result<Self, CodecError> {
        Ok(GridSection {
            electric: decode_connections(body, ELECTRIC_CONNECTIONS)?,
            fluid: decode_connections(body, FLUID_CONNECTIONS)?,
            storage: decode_storage(body)?,
        })
    }

    /// Write present fields back into an overmap body
    ///
    /// Existing keys keep their position in the body.
    pub fn encode_into(&self, body: &mut Map<String, Value>) {
        if let Some(electric) = &self.electric {
            body.insert(ELECTRIC_CONNECTIONS.to_string(), encode_connections(electric));
        }
        if let Some(fluid) = &self.fluid {
            body.insert(FLUID_CONNECTIONS.to_string(), encode_connections(fluid));
        }
        if let Some(storage) = &self.storage {
            let entries = storage
                .iter()
                .map(|entry| {
                    let mut array = Vec::with_capacity(entry.payload.len() + 1);
                    array.push(encode_position(entry.position));
                    array.extend(entry.payload.iter().cloned());
                    Value::Array(array)
                })
                .collect();
            body.insert(FLUID_STORAGE.to_string(), Value::Array(entries));
        }
    }

    /// Whether no field holds any entry
    pub fn is_empty(&self) -> bool {
        self.electric.as_ref().map_or(true, Vec::is_empty)
            && self.fluid.as_ref().map_or(true, Vec::is_empty)
            && self.storage.as_ref().map_or(true, Vec::is_empty)
    }

    /// Number of node entries across all fields
    pub fn entry_count(&self) -> usize {
        self.electric.as_ref().map_or(0, Vec::len)
            + self.fluid.as_ref().map_or(0, Vec::len)
            + self.storage.as_ref().map_or(0, Vec::len)
    }

    /// Drop every node and link touching a position `keep` rejects
    ///
    /// A connection node whose links all disappear is dropped too; a node
    /// that had no links to begin with stays. The first error from `keep`,
    /// or a link offset that overflows, aborts the filter.
    pub fn retain<F>(&mut self, mut keep: F) -> Result<GridFilterStats, CodecError>
    where
        F: FnMut(LocalPosition) -> Result<bool, CodecError>,
    {
        let mut stats = GridFilterStats::default();
        for (field, connections) in [
            (ELECTRIC_CONNECTIONS, self.electric.as_mut()),
            (FLUID_CONNECTIONS, self.fluid.as_mut()),
        ] {
            if let Some(connections) = connections {
                retain_connections(field, connections, &mut keep, &mut stats)?;
            }
        }
        if let Some(storage) = self.storage.as_mut() {
            let before = storage.len();
            let mut kept = Vec::with_capacity(before);
            for entry in std::mem::take(storage) {
                if keep(entry.position)? {
                    kept.push(entry);
                }
            }
            *storage = kept;
            stats.entries_removed += before - storage.len();
        }
        Ok(stats)
    }

    /// Empty every present field
    ///
    /// Returns the number of node entries removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entry_count();
        for connections in [self.electric.as_mut(), self.fluid.as_mut()].into_iter().flatten() {
            connections.clear();
        }
        if let Some(storage) = self.storage.as_mut() {
            storage.clear();
        }
        removed
    }
}

fn retain_connections<F>(
    field: &'static str,
    connections: &mut Vec<GridConnection>,
    keep: &mut F,
    stats: &mut GridFilterStats,
) -> Result<(), CodecError>
where
    F: FnMut(LocalPosition) -> Result<bool, CodecError>,
{
    let before = connections.len();
    let mut kept = Vec::with_capacity(before);
    for (index, mut connection) in std::mem::take(connections).into_iter().enumerate() {
        if !keep(connection.position)? {
            continue;
        }
        if connection.offsets.is_empty() {
            kept.push(connection);
            continue;
        }
        let links_before = connection.offsets.len();
        let mut offsets = Vec::with_capacity(links_before);
        for offset in std::mem::take(&mut connection.offsets) {
            let target = connection
                .position
                .offset(offset)
                .ok_or_else(|| malformed(field, index, "link offset leaves the coordinate range"))?;
            if keep(target)? {
                offsets.push(offset);
            }
        }
        stats.links_removed += links_before - offsets.len();
        if !offsets.is_empty() {
            connection.offsets = offsets;
            kept.push(connection);
        }
    }
    *connections = kept;
    stats.entries_removed += before - connections.len();
    Ok(())
}

fn field_array<'a>(
    body: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a Vec<Value>>, CodecError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(entries)) => Ok(Some(entries)),
        Some(_) => Err(CodecError::MalformedGrid {
            field,
            reason: "field is not an array".into(),
        }),
    }
}

fn decode_connections(
    body: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Vec<GridConnection>>, CodecError> {
    let Some(entries) = field_array(body, field)? else {
        return Ok(None);
    };

    let mut connections = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let items = entry_items(entry, field, index)?;
        let position = decode_position(&items[0]).ok_or_else(|| malformed(field, index, "node position is not an integer triple"))?;
        let offsets = items[1..]
            .iter()
            .map(|item| decode_triple(item).ok_or_else(|| malformed(field, index, "link offset is not an integer triple")))
            .collect::<Result<Vec<_>, _>>()?;
        connections.push(GridConnection { position, offsets });
    }
    Ok(Some(connections))
}

fn decode_storage(body: &Map<String, Value>) -> Result<Option<Vec<GridStorageEntry>>, CodecError> {
    let Some(entries) = field_array(body, FLUID_STORAGE)? else {
        return Ok(None);
    };

    let mut storage = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let items = entry_items(entry, FLUID_STORAGE, index)?;
        let position = decode_position(&items[0])
            .ok_or_else(|| malformed(FLUID_STORAGE, index, "node position is not an integer triple"))?;
        storage.push(GridStorageEntry {
            position,
            payload: items[1..].to_vec(),
        });
    }
    Ok(Some(storage))
}

fn entry_items<'a>(entry: &'a Value, field: &'static str, index: usize) -> Result<&'a Vec<Value>, CodecError> {
    match entry {
        Value::Array(items) if !items.is_empty() => Ok(items),
        Value::Array(_) => Err(malformed(field, index, "entry is empty")),
        _ => Err(malformed(field, index, "entry is not an array")),
    }
}

fn malformed(field: &'static str, index: usize, reason: &str) -> CodecError {
    CodecError::MalformedGrid {
        field,
        reason: format!("entry #{}: {}", index, reason),
    }
}

fn decode_triple(value: &Value) -> Option<[i32; 3]> {
    let items = value.as_array()?;
    if items.len() != 3 {
        return None;
    }
    let mut triple = [0i32; 3];
    for (slot, item) in triple.iter_mut().zip(items) {
        *slot = i32::try_from(item.as_i64()?).ok()?;
    }
    Some(triple)
}

fn decode_position(value: &Value) -> Option<LocalPosition> {
    decode_triple(value).map(|[x, y, z]| LocalPosition::new(x, y, z))
}

fn encode_position(position: LocalPosition) -> Value {
    serde_json::json!([position.x, position.y, position.z])
}

fn encode_connections(connections: &[GridConnection]) -> Value {
    Value::Array(
        connections
            .iter()
            .map(|connection| {
                let mut array = Vec::with_capacity(connection.offsets.len() + 1);
                array.push(encode_position(connection.position));
                array.extend(connection.offsets.iter().map(|offset| serde_json::json!(offset)));
                Value::Array(array)
            })
            .collect(),
    )
}
