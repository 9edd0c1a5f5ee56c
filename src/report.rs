// Response objects for front ends.
//
// The shapes a web front end returns to its client: a JSON summary after
// compression, download headers after decompression, and a JSON error
// object for either direction. The CLI prints the same objects with
// `--json`.

use serde::Serialize;

use crate::container::decoder::{DecodeError, Decoded, Format};
use crate::container::encoder::{self, EncodeError};
use crate::io::{CompressStats, DecompressStats, IoError};

/// Suggestion attached to every decompression failure.
pub const DECOMPRESS_SUGGESTION: &str =
    "Try uploading a different compressed file or check if the file was compressed by this portal";

/// URL prefix under which stored containers are served.
pub const DOWNLOAD_PREFIX: &str = "/compressed/";

// ---------------------------------------------------------------------------
// Compress summary
// ---------------------------------------------------------------------------

/// Summary returned after a successful compression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressReport {
    pub success: bool,
    pub original_size: u64,
    pub compressed_size: u64,
    /// Percentage with two decimals, e.g. `"87.50%"`.
    pub compression_ratio: String,
    pub download_path: String,
    pub filename: String,
}

impl CompressReport {
    pub fn new(original_size: u64, compressed_size: u64, container_name: &str) -> Self {
        Self {
            success: true,
            original_size,
            compressed_size,
            compression_ratio: encoder::format_ratio(original_size, compressed_size),
            download_path: format!("{DOWNLOAD_PREFIX}{container_name}"),
            filename: container_name.to_owned(),
        }
    }
}

impl From<&CompressStats> for CompressReport {
    fn from(stats: &CompressStats) -> Self {
        Self::new(
            stats.original_size,
            stats.container_size,
            &stats.container_name,
        )
    }
}

// ---------------------------------------------------------------------------
// Decompress headers
// ---------------------------------------------------------------------------

/// Headers sent with a recovered payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecompressHeaders {
    pub content_disposition: String,
    pub content_type: String,
    pub content_length: u64,
    /// Which decode stage succeeded, as a human-readable description.
    pub compression_info: String,
}

impl DecompressHeaders {
    pub fn from_decoded(decoded: &Decoded) -> Self {
        Self::new(
            &decoded.filename,
            decoded.payload.len() as u64,
            decoded.format,
        )
    }

    fn new(filename: &str, content_length: u64, format: Format) -> Self {
        Self {
            content_disposition: content_disposition(filename),
            content_type: "application/octet-stream".to_owned(),
            content_length,
            compression_info: format.description().to_owned(),
        }
    }

    /// Header name/value pairs in the order they are sent.
    pub fn to_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("Content-Disposition", self.content_disposition.clone()),
            ("Content-Type", self.content_type.clone()),
            ("Content-Length", self.content_length.to_string()),
            ("X-Compression-Info", self.compression_info.clone()),
        ]
    }
}

impl From<&DecompressStats> for DecompressHeaders {
    fn from(stats: &DecompressStats) -> Self {
        Self::new(&stats.filename, stats.output_size, stats.format)
    }
}

/// `attachment; filename="..."; filename*=UTF-8''...` for a sanitized name.
///
/// The plain `filename` parameter carries an ASCII rendition (non-ASCII
/// characters become `_`); `filename*` carries the exact name.
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && c != '"' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        percent_encode(filename)
    )
}

/// Percent-encode with the `encodeURIComponent` unreserved set.
pub fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &b in text.as_bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Which direction a failed request was going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Compress,
    Decompress,
}

/// Structured error object: `{ "error": ..., "details"?: ..., "suggestion"?: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// HTTP status a web front end would answer with.
    #[serde(skip)]
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorReport {
    pub fn new(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
            suggestion: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Map a failed operation to the error object the client sees.
    pub fn for_error(op: Operation, err: &IoError) -> Self {
        if let IoError::Policy(policy) = err {
            return Self::new(400, policy.to_string());
        }

        match op {
            Operation::Compress => {
                Self::new(500, "Compression failed").with_details(cause_message(err))
            }
            Operation::Decompress => {
                let error = match err {
                    IoError::Decode(DecodeError::NotCompressed) => {
                        "File is not a valid compressed file"
                    }
                    IoError::Encode(EncodeError::MetadataTooLarge { .. }) => {
                        "File metadata is corrupted or too large"
                    }
                    _ => "Decompression failed",
                };
                Self::new(400, error)
                    .with_details(cause_message(err))
                    .with_suggestion(DECOMPRESS_SUGGESTION)
            }
        }
    }
}

/// The innermost message, without the `IoError` variant prefix.
fn cause_message(err: &IoError) -> String {
    match err {
        IoError::Io(e) => e.to_string(),
        IoError::Encode(e) => e.to_string(),
        IoError::Decode(e) => e.to_string(),
        IoError::Policy(e) => e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
