//! Gzip compression and MD5 checksums for upload payloads.
//!
//! The checksum covers the *compressed* bytes, since those are what the
//! object store receives and verifies.

use std::ffi::OsStr;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use blip_client_models::CompressedPayload;
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::BulkLoadError;

/// Reads `path` fully and compresses it into a [`CompressedPayload`].
///
/// # Errors
///
/// Returns [`BulkLoadError::Io`] if the file cannot be read.
pub fn compress_file(path: &Path) -> Result<CompressedPayload, BulkLoadError> {
    let io_error = |source| BulkLoadError::Io {
        path: path.display().to_string(),
        source,
    };

    let original = std::fs::read(path).map_err(io_error)?;
    let bytes = gzip(&original).map_err(io_error)?;
    let md5 = md5_hex(&bytes);

    log::debug!(
        "Compressed {} from {} to {} bytes (md5 {md5})",
        path.display(),
        original.len(),
        bytes.len()
    );

    Ok(CompressedPayload {
        mime_type: detect_mime_type(path, &original).to_string(),
        file_name: path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("upload")
            .to_string(),
        bytes,
        md5,
    })
}

/// Runs [`compress_file`] on the blocking thread pool.
///
/// # Errors
///
/// Returns [`BulkLoadError::Io`] if the file cannot be read or the blocking
/// task is cancelled.
pub async fn compress_file_async(path: PathBuf) -> Result<CompressedPayload, BulkLoadError> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || compress_file(&path))
        .await
        .map_err(|e| BulkLoadError::Io {
            path: display,
            source: std::io::Error::other(e),
        })?
}

/// Gzip-compresses `data` in memory.
///
/// The gzip header carries no timestamp, so equal input always yields equal
/// output.
///
/// # Errors
///
/// Returns the encoder's I/O error (not expected for in-memory buffers).
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Lowercase hex MD5 digest of `data`.
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    let mut context = md5::Context::new();
    context.consume(data);
    format!("{:x}", context.finalize())
}

/// Best-effort MIME type of an uncompressed file.
///
/// Known extensions win; otherwise the content is sniffed for a few magic
/// numbers and for UTF-8 text.
#[must_use]
pub fn detect_mime_type(path: &Path, content: &[u8]) -> &'static str {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => return "text/csv",
        Some("tsv" | "tab") => return "text/tab-separated-values",
        Some("txt") => return "text/plain",
        Some("json") => return "application/json",
        Some("jsonl" | "ndjson") => return "application/x-ndjson",
        Some("xml") => return "application/xml",
        Some("xls") => return "application/vnd.ms-excel",
        Some("xlsx") => {
            return "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
        }
        Some("zip") => return "application/zip",
        Some("gz") => return "application/gzip",
        _ => {}
    }

    if content.starts_with(&[0x1f, 0x8b]) {
        "application/gzip"
    } else if content.starts_with(b"PK\x03\x04") {
        "application/zip"
    } else if std::str::from_utf8(content).is_ok() {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}
