//! Metagz: self-describing gzip containers.
//!
//! A container is a gzip stream prefixed with a small JSON metadata record
//! (original filename, size, timestamp, MIME type):
//!
//! ```text
//! +-----------------+------------------+---------------------+
//! | metadata length | metadata (JSON)  | gzip payload        |
//! | 4 bytes (BE)    | length bytes     | remaining bytes     |
//! +-----------------+------------------+---------------------+
//! ```
//!
//! The crate provides:
//! - The container encoder and the fallback decoder (`container`)
//! - Upload size and type checks (`policy`)
//! - Response objects for HTTP-style front ends (`report`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use metagz::container::{decoder, encoder};
//!
//! let container = encoder::encode(b"hello world!", "hi.txt", Some("text/plain")).unwrap();
//! let decoded = decoder::decode(&container, "upload.gz").unwrap();
//! assert_eq!(decoded.payload, b"hello world!");
//! assert_eq!(decoded.filename, "hi.txt");
//! ```

pub mod container;
pub mod io;
pub mod policy;
pub mod report;

#[cfg(feature = "cli")]
pub mod cli;
