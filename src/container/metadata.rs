// Metadata record embedded between the length prefix and the payload.
//
// Serialized as compact JSON with the field names
// (`filename`, `originalSize`, `timestamp`, `mimetype`,
// `compressed_at`, `version`). On the way in only `filename` is required;
// missing or mistyped optional fields fall back to defaults so containers
// from other producers still decode.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::encoder::EncodeError;
use super::frame::FramingRejected;

/// Upper bound on the serialized metadata record, in bytes.
///
/// Bounds the allocation a hostile length prefix can cause during decode.
pub const MAX_METADATA_LEN: usize = 50_000;

/// Format version written into every record.
pub const FORMAT_VERSION: &str = "1.0";

/// Description of the original file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Original filename as declared by the uploader.
    pub filename: String,
    /// Uncompressed payload size in bytes.
    #[serde(rename = "originalSize")]
    pub original_size: u64,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Declared MIME type of the original file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    /// Creation time as RFC 3339 text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_at: Option<String>,
    pub version: String,
}

impl Metadata {
    /// Build a record stamped with the current UTC time.
    pub fn new(filename: &str, original_size: u64, mimetype: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            filename: filename.to_owned(),
            original_size,
            timestamp: now.timestamp_millis(),
            mimetype: mimetype.map(str::to_owned),
            compressed_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            version: FORMAT_VERSION.to_owned(),
        }
    }

    /// Serialize to compact JSON, enforcing `MAX_METADATA_LEN`.
    ///
    /// A record of exactly `MAX_METADATA_LEN` bytes is refused as well,
    /// since the decoder only accepts lengths strictly below the limit.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() >= MAX_METADATA_LEN {
            return Err(EncodeError::MetadataTooLarge {
                len: bytes.len(),
                max: MAX_METADATA_LEN,
            });
        }
        Ok(bytes)
    }

    /// Parse a metadata region.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FramingRejected> {
        let text = std::str::from_utf8(bytes).map_err(|_| FramingRejected::MetadataNotUtf8)?;
        let value: Value = serde_json::from_str(text)
            .map_err(|e| FramingRejected::MetadataNotJson(e.to_string()))?;
        let object = value.as_object().ok_or(FramingRejected::MetadataNotObject)?;

        let filename = match object.get("filename").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => return Err(FramingRejected::MissingFilename),
        };

        Ok(Self {
            filename,
            original_size: object
                .get("originalSize")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            timestamp: object.get("timestamp").and_then(Value::as_i64).unwrap_or(0),
            mimetype: string_field(object, "mimetype"),
            compressed_at: string_field(object, "compressed_at"),
            version: string_field(object, "version").unwrap_or_else(|| FORMAT_VERSION.to_owned()),
        })
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_owned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
