// Compression backends for container payloads.
//
// Provides a `Codec` trait with three flate2-backed implementations:
//   - Gzip (the container payload format, and the first fallback stage)
//   - Zlib (deflate with a zlib header, accepted by the deflate stage)
//   - Raw deflate (no header, accepted by the deflate stage)
//
// A truncated stream is always an error. What may follow a complete stream
// differs per format:
//   - gzip: further members, or trailing zero padding
//   - zlib: anything (the Adler-32 trailer already vouches for the stream)
//   - raw deflate: nothing; with no header or checksum, full consumption is
//     the only thing keeping arbitrary files out of the deflate stage

use std::io::{self, Read, Write};

use flate2::{Compression, Decompress, FlushDecompress, Status};

/// Output growth step for inflate.
const INFLATE_CHUNK: usize = 32 * 1024;

/// Default compression level, matching zlib's.
pub const DEFAULT_LEVEL: u32 = 6;

// ---------------------------------------------------------------------------
// Codec trait
// ---------------------------------------------------------------------------

/// A one-shot compressor/decompressor over in-memory buffers.
///
/// # Implementing a custom codec
///
/// ```no_run
/// use metagz::container::codec::Codec;
///
/// struct Identity;
///
/// impl Codec for Identity {
///     fn name(&self) -> &'static str { "identity" }
///     fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
///         Ok(data.to_vec())
///     }
///     fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
///         Ok(data.to_vec())
///     }
/// }
/// ```
pub trait Codec: Send + Sync {
    /// Short name used in log lines and error messages.
    fn name(&self) -> &'static str;

    /// Compress `data` into a complete stream.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress a complete stream. Fails on truncated input.
    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// Gzip
// ---------------------------------------------------------------------------

/// Gzip (RFC 1952). Accepts concatenated members and trailing zero padding
/// on decompress.
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: Compression,
}

impl GzipCodec {
    /// Create a gzip codec with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl Codec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        use flate2::write::GzEncoder;

        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        use flate2::bufread::GzDecoder;

        if data.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "empty input has no gzip header",
            ));
        }

        // One member per pass; the bufread decoder leaves `input` positioned
        // right after the member trailer. Zero padding after the last member
        // is tolerated, any other leftover must parse as another member.
        let mut input = data;
        let mut output = Vec::new();
        loop {
            GzDecoder::new(&mut input).read_to_end(&mut output)?;
            if input.iter().all(|&b| b == 0) {
                break;
            }
        }
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Zlib
// ---------------------------------------------------------------------------

/// Deflate with a zlib header and Adler-32 trailer (RFC 1950).
#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    level: Compression,
}

impl ZlibCodec {
    /// Create a zlib codec with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl Codec for ZlibCodec {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        use flate2::write::ZlibEncoder;

        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        inflate(data, true)
    }
}

// ---------------------------------------------------------------------------
// Raw deflate
// ---------------------------------------------------------------------------

/// Headerless deflate (RFC 1951).
#[derive(Debug, Clone, Copy)]
pub struct RawDeflateCodec {
    level: Compression,
}

impl RawDeflateCodec {
    /// Create a raw deflate codec with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for RawDeflateCodec {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl Codec for RawDeflateCodec {
    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        use flate2::write::DeflateEncoder;

        let mut encoder = DeflateEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        inflate(data, false)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Inflate a zlib or raw deflate stream. A raw stream must end exactly at the
/// end of `data`; a zlib stream may be followed by arbitrary bytes.
///
/// Drives `Decompress` directly instead of a `Read` adapter: the deflate
/// adapters report a clean EOF on a truncated stream, which would let any
/// input that starts with a plausible block header "succeed". (The gzip
/// decoder catches truncation through its trailer.)
fn inflate(data: &[u8], zlib_header: bool) -> io::Result<Vec<u8>> {
    let mut state = Decompress::new(zlib_header);
    let mut output = Vec::with_capacity(data.len().saturating_mul(2).max(64));

    loop {
        if output.len() == output.capacity() {
            output.reserve(INFLATE_CHUNK);
        }

        let before_in = state.total_in();
        let before_out = state.total_out();
        let status = state
            .decompress_vec(
                &data[before_in as usize..],
                &mut output,
                FlushDecompress::Finish,
            )
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                if state.total_in() == before_in && state.total_out() == before_out {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "deflate stream ended before its final block",
                    ));
                }
            }
        }
    }

    if !zlib_header {
        ensure_consumed(data.len() - state.total_in() as usize)?;
    }
    Ok(output)
}

fn ensure_consumed(remaining: usize) -> io::Result<()> {
    if remaining == 0 {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{remaining} trailing bytes after end of stream"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
