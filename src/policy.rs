// Upload acceptance rules.
//
// The size ceiling and the extension/MIME allow-list that front the
// container encoder and decoder. A file passes the type check when either
// its declared MIME type or its (lowercased) extension is allowed.

use std::path::Path;

use log::warn;
use thiserror::Error;

/// Default upload ceiling: 50 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 50 * 1024 * 1024;

/// Extensions accepted by default, with the leading dot.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".txt", ".jpg", ".jpeg", ".bin", ".png", ".pdf", ".gz"];

/// MIME types accepted by default.
pub const DEFAULT_MIME_TYPES: &[&str] = &[
    "text/plain",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/octet-stream",
    "application/x-binary",
    "application/binary",
    "application/pdf",
    "application/gzip",
    "application/x-gzip",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("File too large. Maximum size is {}MB.", max / (1024 * 1024))]
    TooLarge { size: u64, max: u64 },

    #[error("File type not allowed. Allowed types: {allowed}")]
    TypeNotAllowed { filename: String, allowed: String },
}

/// Size and type limits for incoming files.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_size: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            allowed_mime_types: DEFAULT_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UploadPolicy {
    /// A policy that accepts any type, keeping only the size ceiling.
    pub fn any_type(max_size: u64) -> Self {
        Self {
            max_size,
            allowed_extensions: Vec::new(),
            allowed_mime_types: Vec::new(),
        }
    }

    /// Check a file before it is read or processed.
    pub fn check(&self, filename: &str, mime: Option<&str>, size: u64) -> Result<(), PolicyError> {
        self.check_size(size)?;
        self.check_type(filename, mime)
    }

    /// Check only the size ceiling.
    pub fn check_size(&self, size: u64) -> Result<(), PolicyError> {
        if size > self.max_size {
            warn!("rejected upload of {size} bytes (limit {})", self.max_size);
            return Err(PolicyError::TooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// Check only the type allow-list. An empty allow-list accepts anything.
    pub fn check_type(&self, filename: &str, mime: Option<&str>) -> Result<(), PolicyError> {
        if self.allowed_extensions.is_empty() && self.allowed_mime_types.is_empty() {
            return Ok(());
        }

        let mime_ok = mime.is_some_and(|m| {
            self.allowed_mime_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(m))
        });
        let ext_ok = extension_of(filename).is_some_and(|ext| {
            self.allowed_extensions
                .iter()
                .any(|allowed| *allowed == ext)
        });

        if mime_ok || ext_ok {
            return Ok(());
        }

        warn!("rejected upload {filename:?} with MIME type {mime:?}");
        Err(PolicyError::TypeNotAllowed {
            filename: filename.to_owned(),
            allowed: self
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.'))
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Lowercased extension with its leading dot, e.g. `".txt"`.
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
}

/// Guess a MIME type from a filename's extension.
///
/// Falls back to `application/octet-stream`.
pub fn mime_for_filename(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some(".txt") => "text/plain",
        Some(".jpg" | ".jpeg") => "image/jpeg",
        Some(".png") => "image/png",
        Some(".pdf") => "application/pdf",
        Some(".gz") => "application/gzip",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extension() {
        let policy = UploadPolicy::default();
        assert!(policy.check("notes.TXT", None, 10).is_ok());
        assert!(policy.check("photo.jpeg", Some("weird/type"), 10).is_ok());
        assert!(policy.check("archive.tar.gz", None, 10).is_ok());
    }

    #[test]
    fn accepts_allowed_mime_without_extension() {
        let policy = UploadPolicy::default();
        assert!(policy.check("README", Some("text/plain"), 10).is_ok());
        assert!(policy.check("dump", Some("Application/Octet-Stream"), 10).is_ok());
    }

    #[test]
    fn rejects_unknown_type() {
        let policy = UploadPolicy::default();
        let err = policy
            .check("script.exe", Some("application/x-msdownload"), 10)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "File type not allowed. Allowed types: txt, jpg, jpeg, bin, png, pdf, gz"
        );
        assert!(policy.check("noext", None, 10).is_err());
    }

    #[test]
    fn size_ceiling() {
        let policy = UploadPolicy::default();
        assert!(policy.check("a.bin", None, DEFAULT_MAX_SIZE).is_ok());
        let err = policy.check("a.bin", None, DEFAULT_MAX_SIZE + 1).unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size is 50MB.");
    }

    #[test]
    fn size_checked_before_type() {
        let policy = UploadPolicy::default();
        assert!(matches!(
            policy.check("x.exe", None, DEFAULT_MAX_SIZE + 1),
            Err(PolicyError::TooLarge { .. })
        ));
    }

    #[test]
    fn any_type_policy() {
        let policy = UploadPolicy::any_type(100);
        assert!(policy.check("x.exe", None, 100).is_ok());
        assert!(policy.check("x.exe", None, 101).is_err());
    }

    #[test]
    fn mime_guess() {
        assert_eq!(mime_for_filename("a.TXT"), "text/plain");
        assert_eq!(mime_for_filename("a.jpg"), "image/jpeg");
        assert_eq!(mime_for_filename("a.tar.gz"), "application/gzip");
        assert_eq!(mime_for_filename("a"), "application/octet-stream");
    }
}
