//! Overmap blob codec.
//!
//! An overmap record's `data` column holds (optionally compressed) text:
//!
//! ```text
//! # version 30
//! {"layers":[...],"electric_grid_connections":[...],...}
//! ```
//!
//! The version line is carried through untouched. The JSON body keeps its
//! key order on re-encode so untouched fields serialize the way they were read.

use serde_json::{Map, Value};

use super::grid::GridSection;
use super::traits::{CodecError, StorageCodec};
use super::get_codec;

/// Decoded overmap record
pub struct OvermapBlob {
    codec: Box<dyn StorageCodec>,
    version_line: String,
    body: Map<String, Value>,
}

impl OvermapBlob {
    /// Decode the `compression` and `data` columns of an overmap record
    pub fn decode(compression: Option<&str>, data: &[u8]) -> Result<Self, CodecError> {
        let codec = get_codec(compression)?;
        let raw = codec.decode(data)?;
        let text = String::from_utf8(raw)
            .map_err(|e| CodecError::MalformedText(format!("not UTF-8: {}", e)))?;

        let (version_line, json_text) = text
            .split_once('\n')
            .ok_or_else(|| CodecError::MalformedText("missing version line separator".into()))?;

        let body = match serde_json::from_str::<Value>(json_text)? {
            Value::Object(map) => map,
            other => {
                return Err(CodecError::MalformedText(format!(
                    "body is a JSON {}, expected an object",
                    json_kind(&other)
                )))
            }
        };

        Ok(OvermapBlob {
            codec,
            version_line: version_line.to_string(),
            body,
        })
    }

    /// Re-encode to `data` column bytes using the original compression
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let json_text = serde_json::to_string(&self.body)?;
        let mut text = String::with_capacity(self.version_line.len() + 1 + json_text.len());
        text.push_str(&self.version_line);
        text.push('\n');
        text.push_str(&json_text);
        self.codec.encode(text.as_bytes())
    }

    /// Value of the `compression` column this blob was read with
    pub fn compression(&self) -> Option<&'static str> {
        self.codec.column_value()
    }

    /// First line of the decoded text (e.g. `# version 30`)
    pub fn version_line(&self) -> &str {
        &self.version_line
    }

    /// JSON body
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Decode the grid fields of the body
    pub fn grid(&self) -> Result<GridSection, CodecError> {
        GridSection::decode(&self.body)
    }

    /// Write grid fields back into the body
    pub fn set_grid(&mut self, grid: &GridSection) {
        grid.encode_into(&mut self.body);
    }
}

impl std::fmt::Debug for OvermapBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OvermapBlob")
            .field("compression", &self.compression())
            .field("version_line", &self.version_line)
            .field("fields", &self.body.len())
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
