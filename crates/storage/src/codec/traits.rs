//! Payload codec trait definitions.

/// Payload codec trait.
///
/// Record payloads carry a `compression` column naming how `data` was
/// written. Each codec handles one value of that column.
pub trait StorageCodec: Send + Sync {
    /// Encode bytes for storage.
    ///
    /// The returned bytes are what gets written to the `data` column.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes from storage.
    ///
    /// Reverses the encode operation. Returns an error if the data
    /// cannot be decoded (e.g., truncated stream).
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Value of the `compression` column for this codec
    ///
    /// `None` means the column is `NULL` (raw bytes).
    fn column_value(&self) -> Option<&'static str>;
}

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Decoding failed (invalid or truncated stream).
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Encoding failed.
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Unknown `compression` column value.
    #[error("Unknown compression: {0}")]
    UnknownCodec(String),

    /// Decoded overmap text is not `# version N\n{json}`.
    #[error("Malformed overmap text: {0}")]
    MalformedText(String),

    /// Overmap JSON body could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A grid field is not an array, or holds an entry of the wrong shape.
    #[error("Malformed {field}: {reason}")]
    MalformedGrid {
        /// Grid field name
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },
}
