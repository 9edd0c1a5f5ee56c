// Container format: framing, metadata, codecs, encoder and decoder.
//
// - `frame`: 4-byte big-endian length prefix and region slicing
// - `metadata`: the JSON metadata record embedded after the prefix
// - `codec`: gzip / zlib / raw deflate backends over flate2
// - `encoder`: payload + metadata -> container bytes
// - `decoder`: framed -> gzip -> deflate fallback cascade
// - `filename`: filename sanitization and fallback derivation

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod filename;
pub mod frame;
pub mod metadata;

pub use codec::{Codec, GzipCodec, RawDeflateCodec, ZlibCodec};
pub use decoder::{DecodeError, Decoded, Format, decode};
pub use encoder::{EncodeError, EncodeOptions, encode};
pub use frame::{FrameHeader, FramingRejected};
pub use metadata::{FORMAT_VERSION, MAX_METADATA_LEN, Metadata};
