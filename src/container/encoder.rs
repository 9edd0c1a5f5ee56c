// Container encoder.
//
// Builds `[4-byte BE metadata length][metadata JSON][gzip payload]` from a
// payload and its metadata record. The metadata is serialized and checked
// against the size ceiling before any compression work starts.

use std::io;

use log::debug;
use thiserror::Error;

use super::codec::{Codec, DEFAULT_LEVEL, GzipCodec};
use super::frame::{FrameHeader, LENGTH_PREFIX_LEN};
use super::metadata::Metadata;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the container encoder.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Gzip compression level (0-9).
    pub level: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("metadata too large: {len} bytes (limit {max})")]
    MetadataTooLarge { len: usize, max: usize },

    #[error("filename must not be empty")]
    EmptyFilename,

    #[error("metadata serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Wrap `payload` in a container, stamping metadata with the current time.
///
/// # Example
/// ```no_run
/// use metagz::container::encoder;
/// let container = encoder::encode(b"hello world!", "hi.txt", None).unwrap();
/// let len = u32::from_be_bytes(container[..4].try_into().unwrap()) as usize;
/// assert!(container[4..4 + len].starts_with(br#"{"filename":"hi.txt""#));
/// ```
pub fn encode(
    payload: &[u8],
    filename: &str,
    mime_type: Option<&str>,
) -> Result<Vec<u8>, EncodeError> {
    let metadata = Metadata::new(filename, payload.len() as u64, mime_type);
    encode_with(payload, metadata, &EncodeOptions::default())
}

/// Wrap `payload` in a container using caller-built metadata.
///
/// `metadata.original_size` is overwritten with the payload length.
pub fn encode_with(
    payload: &[u8],
    metadata: Metadata,
    opts: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    encode_with_codec(payload, metadata, &GzipCodec::new(opts.level))
}

/// Wrap `payload` in a container, compressing with `codec`.
///
/// Decoders only recognise gzip payloads inside the frame; other codecs are
/// for tests and tooling.
pub fn encode_with_codec(
    payload: &[u8],
    mut metadata: Metadata,
    codec: &dyn Codec,
) -> Result<Vec<u8>, EncodeError> {
    if metadata.filename.is_empty() {
        return Err(EncodeError::EmptyFilename);
    }
    metadata.original_size = payload.len() as u64;

    let meta_bytes = metadata.to_bytes()?;
    let header = FrameHeader::for_metadata(&meta_bytes)?;

    let compressed = codec.compress(payload)?;

    let mut out = Vec::with_capacity(LENGTH_PREFIX_LEN + meta_bytes.len() + compressed.len());
    header.encode(&mut out)?;
    out.extend_from_slice(&meta_bytes);
    out.extend_from_slice(&compressed);

    debug!(
        "encoded {}: payload {} bytes, metadata {} bytes, container {} bytes",
        metadata.filename,
        payload.len(),
        meta_bytes.len(),
        out.len()
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Naming and ratio helpers
// ---------------------------------------------------------------------------

/// Name of the stored container: `{timestamp}-{original_name}.gz`.
pub fn container_filename(timestamp: i64, original_name: &str) -> String {
    format!("{timestamp}-{original_name}.gz")
}

/// `1 - container/original`. Negative when the container is larger.
///
/// Returns `0.0` for an empty original, where the ratio is undefined.
pub fn compression_ratio(original_size: u64, container_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    1.0 - container_size as f64 / original_size as f64
}

/// The ratio as a percentage string with two decimals, e.g. `"87.50%"`.
pub fn format_ratio(original_size: u64, container_size: u64) -> String {
    format!(
        "{:.2}%",
        compression_ratio(original_size, container_size) * 100.0
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
