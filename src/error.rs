//! Error types for the pdfqa library.
//!
//! Every pipeline stage fails with its own [`QaError`] variant so the HTTP
//! boundary can pick a status code and a message without string matching.
//! Variants are grouped into an [`ErrorKind`]; the kind alone decides the
//! HTTP status through [`ErrorKind::http_status`], which keeps failure
//! classification testable without spinning up a server.
//!
//! Two messages exist for every error:
//!
//! * the `Display` text, which carries the underlying cause and is meant for
//!   logs and the CLI;
//! * [`QaError::public_message`], a short fixed sentence that is safe to put
//!   in an HTTP response body.

use std::path::PathBuf;
use thiserror::Error;

/// Failure classes, one per pipeline stage plus the surrounding plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing file or question, malformed multipart body. User-correctable.
    Validation,
    /// The upload exceeded the configured body limit.
    PayloadTooLarge,
    /// Client-side compression failed. Never crosses the wire.
    Compression,
    /// The uploaded bytes are not a valid deflate stream.
    Decompression,
    /// The decompressed bytes are not a parseable PDF.
    Extraction,
    /// The LLM service could not be reached or answered with an error.
    Upstream,
    /// The local input file could not be read or is not a PDF.
    Input,
    /// The client could not reach the upload endpoint, or it returned an error.
    Transport,
    /// Invalid configuration.
    Config,
    /// Anything else.
    Internal,
}

/// Explicit kind → HTTP status mapping used by the server.
///
/// Client-only kinds are listed too so the table is total.
const STATUS_TABLE: &[(ErrorKind, u16)] = &[
    (ErrorKind::Validation, 400),
    (ErrorKind::PayloadTooLarge, 413),
    (ErrorKind::Compression, 400),
    (ErrorKind::Decompression, 500),
    (ErrorKind::Extraction, 500),
    (ErrorKind::Upstream, 500),
    (ErrorKind::Input, 400),
    (ErrorKind::Transport, 502),
    (ErrorKind::Config, 500),
    (ErrorKind::Internal, 500),
];

impl ErrorKind {
    /// HTTP status code for this kind of failure.
    pub fn http_status(self) -> u16 {
        STATUS_TABLE
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, status)| *status)
            .unwrap_or(500)
    }

    /// `true` for kinds the caller can fix by changing the request.
    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

/// All errors returned by the pdfqa library.
#[derive(Debug, Error)]
pub enum QaError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The upload request carried no `compressedPdf` field.
    #[error("No file uploaded")]
    MissingFile,

    /// The question was absent or blank after trimming.
    #[error("No question provided")]
    MissingQuestion,

    /// More than one `compressedPdf` field was sent.
    #[error("Expected exactly one uploaded file, got {count}")]
    MultipleFiles { count: usize },

    /// The multipart body could not be read.
    #[error("Malformed upload: {detail}")]
    MalformedUpload { detail: String },

    /// The upload exceeded `max_upload_bytes`.
    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    // ── Client-side validation ────────────────────────────────────────────
    /// Submission attempted before any file was selected.
    #[error("Choose a .pdf file.")]
    NoFileSelected,

    /// A file is selected but its compressed artifact is missing or stale.
    #[error("Something went wrong.")]
    CompressedArtifactMissing,

    /// Submission attempted with an empty question.
    #[error("Please enter a question. For eg: Summarize the pdf.")]
    EmptyQuestion,

    /// Submission attempted while a derivation of the selected file is still running.
    #[error("The selected file is still being prepared")]
    NotReady,

    // ── Stage errors ──────────────────────────────────────────────────────
    /// Client-side deflate failed.
    #[error("Compression failed: {detail}")]
    Compression { detail: String },

    /// The uploaded bytes are not a valid (or complete) deflate stream.
    #[error("Corrupt compressed input: {detail}")]
    CorruptInput { detail: String },

    /// The inflated document grew past `max_document_bytes`.
    #[error("Decompressed document exceeds the {limit} byte limit")]
    DocumentTooLarge { limit: usize },

    /// The document bytes could not be parsed as a PDF.
    #[error("Unparseable document: {detail}")]
    UnparseableDocument { detail: String },

    /// The LLM call failed: network error or non-2xx status.
    #[error("Upstream AI service error: {detail}")]
    Upstream { detail: String },

    /// The LLM call did not finish within the configured timeout.
    #[error("Upstream AI service timed out after {secs}s")]
    UpstreamTimeout { secs: u64 },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("Please select a valid PDF file. '{path}' starts with {magic:?}")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The upload endpoint could not be reached.
    #[error("Failed to upload PDF to '{endpoint}': {detail}")]
    Transport { endpoint: String, detail: String },

    /// The upload endpoint answered with an error body.
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QaError {
    /// The failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QaError::MissingFile
            | QaError::MissingQuestion
            | QaError::MultipleFiles { .. }
            | QaError::MalformedUpload { .. }
            | QaError::NoFileSelected
            | QaError::CompressedArtifactMissing
            | QaError::EmptyQuestion
            | QaError::NotReady => ErrorKind::Validation,
            QaError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            QaError::Compression { .. } => ErrorKind::Compression,
            QaError::CorruptInput { .. } | QaError::DocumentTooLarge { .. } => {
                ErrorKind::Decompression
            }
            QaError::UnparseableDocument { .. } => ErrorKind::Extraction,
            QaError::Upstream { .. } | QaError::UpstreamTimeout { .. } => ErrorKind::Upstream,
            QaError::FileNotFound { .. }
            | QaError::PermissionDenied { .. }
            | QaError::NotAPdf { .. } => ErrorKind::Input,
            QaError::Transport { .. } | QaError::Server { .. } => ErrorKind::Transport,
            QaError::InvalidConfig(_) => ErrorKind::Config,
            QaError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status for this error, via the kind table.
    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }

    /// Short message that is safe to return to a remote caller.
    ///
    /// Never contains parser output, upstream bodies or file paths.
    pub fn public_message(&self) -> String {
        match self {
            QaError::MissingFile
            | QaError::MissingQuestion
            | QaError::MultipleFiles { .. }
            | QaError::PayloadTooLarge { .. }
            | QaError::DocumentTooLarge { .. }
            | QaError::NoFileSelected
            | QaError::CompressedArtifactMissing
            | QaError::EmptyQuestion
            | QaError::NotReady
            | QaError::Server { .. } => self.to_string(),
            QaError::MalformedUpload { .. } => "Malformed multipart upload".to_string(),
            QaError::Compression { .. } => "Failed to compress PDF.".to_string(),
            QaError::CorruptInput { .. } => "Failed to decompress uploaded file.".to_string(),
            QaError::UnparseableDocument { .. } => "Failed to extract text from PDF.".to_string(),
            QaError::Upstream { .. } | QaError::UpstreamTimeout { .. } => {
                "Failed to fetch response from Gemini AI".to_string()
            }
            QaError::FileNotFound { .. }
            | QaError::PermissionDenied { .. }
            | QaError::NotAPdf { .. } => "Please select a valid PDF file.".to_string(),
            QaError::Transport { .. } => "Failed to upload PDF.".to_string(),
            QaError::InvalidConfig(_) | QaError::Internal(_) => {
                "Internal Server Error".to_string()
            }
        }
    }
}
