// Container length prefix and region slicing.
//
// A container starts with a 4-byte big-endian unsigned integer giving the
// byte length of the metadata region that follows. Everything after the
// metadata region is the compressed payload.
//
// On the decode side the prefix is untrusted: a bare gzip or deflate file
// also has four leading bytes, so every check here reports a non-fatal
// `FramingRejected` and the decoder moves on to its next stage.

use std::io::{self, Write};

use thiserror::Error;

use super::encoder::EncodeError;
use super::metadata::MAX_METADATA_LEN;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a buffer was not accepted as a framed container.
///
/// Internal to the decode cascade: a rejection only means "try the next
/// stage", never a reported failure.
#[derive(Debug, Error)]
pub enum FramingRejected {
    #[error("buffer too short for a length prefix: {len} bytes")]
    TooShort { len: usize },

    #[error("metadata length is zero")]
    ZeroLength,

    #[error("metadata length {declared} leaves no payload in {available} bytes")]
    LengthOutOfBounds { declared: usize, available: usize },

    #[error("metadata length {declared} exceeds limit {}", MAX_METADATA_LEN)]
    LengthOverCeiling { declared: usize },

    #[error("metadata is not valid UTF-8")]
    MetadataNotUtf8,

    #[error("metadata is not JSON: {0}")]
    MetadataNotJson(String),

    #[error("metadata is not a JSON object")]
    MetadataNotObject,

    #[error("metadata has no filename")]
    MissingFilename,

    #[error("payload did not decompress: {0}")]
    Payload(#[source] io::Error),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// The decoded length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Byte length of the metadata region.
    pub metadata_len: u32,
}

impl FrameHeader {
    /// Build the prefix for a serialized metadata record.
    pub fn for_metadata(metadata: &[u8]) -> Result<Self, EncodeError> {
        let metadata_len =
            u32::try_from(metadata.len()).map_err(|_| EncodeError::MetadataTooLarge {
                len: metadata.len(),
                max: MAX_METADATA_LEN,
            })?;
        Ok(Self { metadata_len })
    }

    /// Write the 4-byte big-endian prefix.
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.metadata_len.to_be_bytes())
    }

    /// Read the prefix from the start of `input` without validating it.
    pub fn decode(input: &[u8]) -> Result<Self, FramingRejected> {
        let prefix: [u8; LENGTH_PREFIX_LEN] = input
            .get(..LENGTH_PREFIX_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(FramingRejected::TooShort { len: input.len() })?;
        Ok(Self {
            metadata_len: u32::from_be_bytes(prefix),
        })
    }

    /// Check the declared length against a buffer of `input_len` bytes.
    ///
    /// Requires `0 < n < input_len - 4` (at least one payload byte) and
    /// `n < MAX_METADATA_LEN`.
    pub fn validate(&self, input_len: usize) -> Result<(), FramingRejected> {
        let declared = self.metadata_len as usize;
        let available = input_len.saturating_sub(LENGTH_PREFIX_LEN);

        if declared == 0 {
            return Err(FramingRejected::ZeroLength);
        }
        if declared >= MAX_METADATA_LEN {
            return Err(FramingRejected::LengthOverCeiling { declared });
        }
        if declared >= available {
            return Err(FramingRejected::LengthOutOfBounds {
                declared,
                available,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A container split into its three regions. Borrows from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub header: FrameHeader,
    pub metadata: &'a [u8],
    pub payload: &'a [u8],
}

/// Split `input` into prefix, metadata and payload regions.
///
/// Only the length prefix is checked here; the metadata bytes are returned
/// unparsed.
pub fn split(input: &[u8]) -> Result<Frame<'_>, FramingRejected> {
    let header = FrameHeader::decode(input)?;
    header.validate(input.len())?;

    let body = &input[LENGTH_PREFIX_LEN..];
    let (metadata, payload) = body.split_at(header.metadata_len as usize);
    Ok(Frame {
        header,
        metadata,
        payload,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
