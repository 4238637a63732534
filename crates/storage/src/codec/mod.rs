//! Payload codecs.
//!
//! Two layers:
//!
//! - **Compression** ([`StorageCodec`]): maps the `compression` column to a
//!   byte transformation (`NULL` → [`IdentityCodec`], `"zlib"` → [`ZlibCodec`]).
//! - **Overmap structure** ([`OvermapBlob`], [`GridSection`]): the decoded
//!   overmap text `# version N\n{json}` and the grid fields inside its body.
//!
//! Grid rewriting only ever goes through `OvermapBlob::decode` →
//! `GridSection` → `OvermapBlob::encode`, so a payload that cannot be
//! understood fails with a [`CodecError`] instead of being partially spliced.
//!
//! # Usage
//!
//! ```ignore
//! use mapprune_storage::codec::OvermapBlob;
//!
//! let mut blob = OvermapBlob::decode(Some("zlib"), &data)?;
//! let mut grid = blob.grid()?;
//! grid.retain(|pos| Ok(pos.z == 0))?;
//! blob.set_grid(&grid);
//! let bytes = blob.encode()?;
//! ```

mod grid;
mod identity;
mod overmap;
mod traits;
mod zlib;

pub use grid::{
    GridConnection, GridFilterStats, GridSection, GridStorageEntry, ELECTRIC_CONNECTIONS, FLUID_CONNECTIONS,
    FLUID_STORAGE, GRID_FIELDS,
};
pub use identity::IdentityCodec;
pub use overmap::OvermapBlob;
pub use traits::{CodecError, StorageCodec};
pub use zlib::{ZlibCodec, ZLIB_COLUMN};

/// Get a codec for a `compression` column value.
///
/// # Known Codecs
///
/// - `NULL`: no-op codec (pass-through)
/// - `"zlib"`: zlib stream
pub fn get_codec(compression: Option<&str>) -> Result<Box<dyn StorageCodec>, CodecError> {
    match compression {
        None => Ok(Box::new(IdentityCodec)),
        Some(ZLIB_COLUMN) => Ok(Box::new(ZlibCodec)),
        Some(other) => Err(CodecError::UnknownCodec(other.to_string())),
    }
}
