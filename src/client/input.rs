//! Selecting a local PDF for upload.
//!
//! The whole file is read into memory: both the compressor and the local
//! extractor work on byte buffers. The `%PDF` magic is checked up front so a
//! wrong file is refused before any derivation starts.

use crate::error::QaError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// PDF header bytes.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF picked by the user, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name without directories, e.g. `report.pdf`.
    pub name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Name used for the uploaded part: the original name plus `.gz`.
    pub fn upload_name(&self) -> String {
        format!("{}.gz", self.name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read `path` and check that it is a PDF.
///
/// # Errors
/// * [`QaError::FileNotFound`]: no such file (or a directory)
/// * [`QaError::PermissionDenied`]: not readable
/// * [`QaError::NotAPdf`]: does not start with `%PDF`
pub async fn read_pdf(path: impl AsRef<Path>) -> Result<SelectedFile, QaError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(QaError::FileNotFound { path });
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(QaError::PermissionDenied { path });
        }
        Err(_) => return Err(QaError::FileNotFound { path }),
    };

    if !bytes.starts_with(PDF_MAGIC) {
        let magic = bytes.iter().take(PDF_MAGIC.len()).copied().collect();
        return Err(QaError::NotAPdf { path, magic });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("Selected {} ({} bytes)", path.display(), bytes.len());
    Ok(SelectedFile { name, path, bytes })
}
