// Container decoder: a three-stage fallback cascade.
//
//   1. framed: length prefix + JSON metadata + gzip payload
//   2. gzip: the whole input as a bare gzip stream
//   3. deflate: the whole input as zlib-wrapped, then raw, deflate
//
// Each stage returns `Result<Decoded, StageError>`; the driver chains them
// with `or_else`, so a stage only runs after every earlier one failed. Stage
// failures are logged at debug level and dropped. Only exhausting all three
// is reported, as `DecodeError::NotCompressed`.
//
// The framed stage accepts a buffer only when the prefix is plausible, the
// metadata parses as a JSON object with a filename, AND the payload
// decompresses. The first four bytes of an unrelated file can look like a
// valid length; the later checks are what keep such files out of stage 1.

use std::fmt;
use std::io;

use log::{debug, info};
use thiserror::Error;

use super::codec::{Codec, GzipCodec, RawDeflateCodec, ZlibCodec};
use super::filename;
use super::frame::{self, FramingRejected};
use super::metadata::Metadata;

/// Number of leading bytes shown in debug logs.
const LOG_PREFIX_BYTES: usize = 20;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Which cascade stage recognised the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// A container with a metadata record.
    Framed,
    /// A bare gzip stream.
    Gzip,
    /// A bare zlib or raw deflate stream.
    Deflate,
}

impl Format {
    /// Short machine-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Framed => "framed",
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }

    /// Human-readable description, as sent in the compression-info header.
    pub fn description(self) -> &'static str {
        match self {
            Self::Framed => "Custom format with metadata",
            Self::Gzip => "Standard GZIP format",
            Self::Deflate => "Deflate format",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A recovered payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub payload: Vec<u8>,
    /// Original filename; sanitized when returned from [`decode`].
    pub filename: String,
    pub format: Format,
    /// The embedded record, for framed inputs only.
    pub metadata: Option<Metadata>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Terminal decode failure: no stage accepted the input.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a valid compressed file or is corrupted")]
    NotCompressed,
}

/// Why a single stage did not accept the input. Never surfaced by [`decode`].
#[derive(Debug, Error)]
pub enum StageError {
    #[error("framing rejected: {0}")]
    Framing(#[from] FramingRejected),

    #[error("not a {codec} stream: {source}")]
    Stream {
        codec: &'static str,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// Recover the payload and filename from `input`.
///
/// `fallback_filename` (typically the uploaded file's own name) is used for
/// bare streams, minus one trailing `.gz`. The returned filename is always
/// sanitized for use as a path segment.
pub fn decode(input: &[u8], fallback_filename: &str) -> Result<Decoded, DecodeError> {
    debug!(
        "decoding {} bytes, leading bytes {}",
        input.len(),
        hex_prefix(input)
    );

    let mut decoded = try_framed(input)
        .or_else(|e| {
            debug!("framed stage: {e}");
            try_gzip(input, fallback_filename)
        })
        .or_else(|e| {
            debug!("gzip stage: {e}");
            try_deflate(input, fallback_filename)
        })
        .map_err(|e| {
            debug!("deflate stage: {e}");
            DecodeError::NotCompressed
        })?;

    decoded.filename = filename::sanitize(&decoded.filename);
    info!(
        "decoded {} bytes as {} -> {} ({} bytes)",
        input.len(),
        decoded.format,
        decoded.filename,
        decoded.payload.len()
    );
    Ok(decoded)
}

/// Stage 1: a framed container.
pub fn try_framed(input: &[u8]) -> Result<Decoded, StageError> {
    let frame = frame::split(input)?;
    let metadata = Metadata::from_bytes(frame.metadata)?;
    let payload = GzipCodec::default()
        .decompress(frame.payload)
        .map_err(FramingRejected::Payload)?;

    Ok(Decoded {
        payload,
        filename: metadata.filename.clone(),
        format: Format::Framed,
        metadata: Some(metadata),
    })
}

/// Stage 2: the whole input as a bare gzip stream.
pub fn try_gzip(input: &[u8], fallback_filename: &str) -> Result<Decoded, StageError> {
    let payload = decompress_whole(&GzipCodec::default(), input)?;
    Ok(bare(payload, fallback_filename, Format::Gzip))
}

/// Stage 3: the whole input as a zlib-wrapped or raw deflate stream.
pub fn try_deflate(input: &[u8], fallback_filename: &str) -> Result<Decoded, StageError> {
    let payload = decompress_whole(&ZlibCodec::default(), input).or_else(|e| {
        debug!("zlib attempt: {e}");
        decompress_whole(&RawDeflateCodec::default(), input)
    })?;
    Ok(bare(payload, fallback_filename, Format::Deflate))
}

fn decompress_whole(codec: &dyn Codec, input: &[u8]) -> Result<Vec<u8>, StageError> {
    codec.decompress(input).map_err(|source| StageError::Stream {
        codec: codec.name(),
        source,
    })
}

fn bare(payload: Vec<u8>, fallback_filename: &str, format: Format) -> Decoded {
    Decoded {
        payload,
        filename: filename::fallback_name(fallback_filename),
        format,
        metadata: None,
    }
}

fn hex_prefix(input: &[u8]) -> String {
    input
        .iter()
        .take(LOG_PREFIX_BYTES)
        .map(|b| format!("{b:02x}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
