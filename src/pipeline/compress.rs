//! Client-side compression: raw PDF bytes → zlib-framed deflate stream.
//!
//! Level 9 is used unconditionally. Uploads are dominated by network time,
//! so the extra CPU of maximum effort is always paid back. The framing is
//! zlib (RFC 1950), the same format `pako.deflate` emits, so any client that
//! speaks that format can talk to the server.

use crate::error::QaError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use tracing::debug;

/// A deflate-compressed copy of one selected document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedDocument {
    bytes: Vec<u8>,
    original_len: usize,
}

impl CompressedDocument {
    /// Compressed bytes, as sent over the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the compressed bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Compressed size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size of the document before compression.
    pub fn original_len(&self) -> usize {
        self.original_len
    }

    /// Compressed size divided by original size (1.0 for an empty input).
    pub fn ratio(&self) -> f64 {
        if self.original_len == 0 {
            1.0
        } else {
            self.bytes.len() as f64 / self.original_len as f64
        }
    }
}

/// Compress `document` with maximum effort.
///
/// Deterministic: the same input always yields the same bytes.
pub fn compress(document: &[u8]) -> Result<CompressedDocument, QaError> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(document.len() / 2 + 64),
        Compression::best(),
    );
    encoder
        .write_all(document)
        .map_err(|e| QaError::Compression {
            detail: e.to_string(),
        })?;
    let bytes = encoder.finish().map_err(|e| QaError::Compression {
        detail: e.to_string(),
    })?;

    debug!(
        "Compressed {} bytes → {} bytes",
        document.len(),
        bytes.len()
    );

    Ok(CompressedDocument {
        bytes,
        original_len: document.len(),
    })
}

/// Format a byte count as megabytes with two decimals, e.g. `"1.50 MB"`.
pub fn format_megabytes(bytes: usize) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}
