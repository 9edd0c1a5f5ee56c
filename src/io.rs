// File-level helpers for container compression/decompression.
//
// Provides `compress_file()` and `decompress_file()`, which wrap the
// in-memory encoder and decoder with the upload policy, output naming and
// overwrite protection. Outputs are named `{timestamp}-{name}.gz` and
// `{timestamp}-{sanitized name}` respectively.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use thiserror::Error;

use crate::container::decoder::{self, DecodeError, Decoded, Format};
use crate::container::encoder::{self, EncodeError, EncodeOptions};
use crate::container::metadata::Metadata;
use crate::policy::{self, PolicyError, UploadPolicy};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration shared by the file helpers.
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    pub encode: EncodeOptions,
    pub policy: UploadPolicy,
    /// Declared MIME type. Guessed from the extension when `None`.
    pub mime: Option<String>,
    /// Filename used when a bare stream is decompressed. Defaults to the
    /// input file's own name.
    pub fallback_name: Option<String>,
    /// Overwrite existing output files.
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `compress_file()`.
#[derive(Debug, Clone)]
pub struct CompressStats {
    /// Path of the written container.
    pub output_path: PathBuf,
    /// `{timestamp}-{name}.gz`.
    pub container_name: String,
    /// Uncompressed input size in bytes.
    pub original_size: u64,
    /// Container size in bytes (prefix + metadata + payload).
    pub container_size: u64,
    /// Metadata timestamp, epoch milliseconds.
    pub timestamp: i64,
}

/// Statistics returned by `decompress_file()`.
#[derive(Debug, Clone)]
pub struct DecompressStats {
    /// Path of the written payload.
    pub output_path: PathBuf,
    /// Sanitized original filename.
    pub filename: String,
    /// Input size in bytes.
    pub input_size: u64,
    /// Recovered payload size in bytes.
    pub output_size: u64,
    /// Which decode stage succeeded.
    pub format: Format,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Container encoding error.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    /// Container decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Input refused by the upload policy.
    #[error("{0}")]
    Policy(#[from] PolicyError),
}

// ---------------------------------------------------------------------------
// compress_file
// ---------------------------------------------------------------------------

/// Wrap the file at `input` in a container written under `output_dir`.
pub fn compress_file(
    input: &Path,
    output_dir: &Path,
    opts: &FileOptions,
) -> Result<CompressStats, IoError> {
    let name = file_name(input)?;
    let mime = opts
        .mime
        .clone()
        .unwrap_or_else(|| policy::mime_for_filename(&name).to_owned());

    let size = fs::metadata(input)?.len();
    opts.policy.check(&name, Some(&mime), size)?;

    let data = fs::read(input)?;
    let metadata = Metadata::new(&name, data.len() as u64, Some(&mime));
    let timestamp = metadata.timestamp;
    let container = encoder::encode_with(&data, metadata, &opts.encode)?;

    let container_name = encoder::container_filename(timestamp, &name);
    let output_path = output_dir.join(&container_name);
    write_output(&output_path, &container, opts.force)?;

    info!(
        "compressed {} ({} bytes) -> {} ({} bytes, {})",
        input.display(),
        data.len(),
        output_path.display(),
        container.len(),
        encoder::format_ratio(data.len() as u64, container.len() as u64)
    );

    Ok(CompressStats {
        output_path,
        container_name,
        original_size: data.len() as u64,
        container_size: container.len() as u64,
        timestamp,
    })
}

// ---------------------------------------------------------------------------
// decompress_file
// ---------------------------------------------------------------------------

/// Read and decode the file at `input` without writing anything.
pub fn decode_file(input: &Path, opts: &FileOptions) -> Result<Decoded, IoError> {
    decode_input(input, opts).map(|(decoded, _)| decoded)
}

/// Recover the payload of the file at `input` into `output_dir`.
pub fn decompress_file(
    input: &Path,
    output_dir: &Path,
    opts: &FileOptions,
) -> Result<DecompressStats, IoError> {
    let (decoded, input_size) = decode_input(input, opts)?;

    let timestamp = Utc::now().timestamp_millis();
    let output_path = output_dir.join(format!("{timestamp}-{}", decoded.filename));
    write_output(&output_path, &decoded.payload, opts.force)?;

    info!(
        "decompressed {} ({}) -> {} ({} bytes)",
        input.display(),
        decoded.format.description(),
        output_path.display(),
        decoded.payload.len()
    );

    Ok(DecompressStats {
        output_path,
        filename: decoded.filename,
        input_size,
        output_size: decoded.payload.len() as u64,
        format: decoded.format,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Policy check, read and decode. Also returns the input size.
fn decode_input(input: &Path, opts: &FileOptions) -> Result<(Decoded, u64), IoError> {
    let name = file_name(input)?;
    let size = fs::metadata(input)?.len();
    opts.policy.check(&name, opts.mime.as_deref(), size)?;

    let data = fs::read(input)?;
    let fallback = opts.fallback_name.as_deref().unwrap_or(&name);
    let decoded = decoder::decode(&data, fallback)?;
    Ok((decoded, data.len() as u64))
}

fn file_name(path: &Path) -> Result<String, IoError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            IoError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a file path: {}", path.display()),
            ))
        })
}

fn write_output(path: &Path, data: &[u8], force: bool) -> io::Result<()> {
    let mut file = if force {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?
    } else {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    io::Error::new(
                        e.kind(),
                        format!(
                            "output file exists, use --force to overwrite: {}",
                            path.display()
                        ),
                    )
                } else {
                    e
                }
            })?
    };
    file.write_all(data)?;
    file.flush()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
