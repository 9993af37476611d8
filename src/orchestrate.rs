//! Per-request orchestration: validate → decompress → extract → ask.
//!
//! [`Pipeline::run`] is the whole server-side behaviour of `POST /upload`
//! minus the HTTP framing, so it can be driven directly from tests. Stages run
//! strictly in sequence and nothing is retried across stages; the only retry
//! policy lives inside the QA client.

use crate::config::ServiceConfig;
use crate::error::QaError;
use crate::observer::{NoopObserver, RequestState, SharedObserver};
use crate::output::AnswerResult;
use crate::pipeline::llm::AnswerService;
use crate::pipeline::{decompress, extract};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// The compressed file part of an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    /// Client-supplied filename, used for logging only.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The decoded form fields of one upload.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// First `compressedPdf` part, if any.
    pub file: Option<UploadedFile>,
    /// Raw `question` field, untrimmed.
    pub question: Option<String>,
    /// Additional `compressedPdf` parts beyond the first.
    pub extra_files: usize,
}

/// Server-side pipeline shared by all requests.
pub struct Pipeline {
    answers: Arc<dyn AnswerService>,
    observer: SharedObserver,
    max_document_bytes: usize,
}

impl Pipeline {
    pub fn new(answers: Arc<dyn AnswerService>, config: &ServiceConfig) -> Self {
        Self {
            answers,
            observer: Arc::new(NoopObserver),
            max_document_bytes: config.max_document_bytes,
        }
    }

    /// Report every request state change to `observer`.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Run one upload through every stage.
    ///
    /// # Errors
    /// Validation errors (400-class) before any stage runs; otherwise the
    /// error of the first failing stage.
    pub async fn run(&self, upload: UploadRequest) -> Result<AnswerResult, QaError> {
        let filename = upload
            .file
            .as_ref()
            .map(|f| f.filename.clone())
            .unwrap_or_default();
        let span = info_span!("upload", filename = %filename);
        self.run_inner(upload).instrument(span).await
    }

    /// Record a request that was refused before it could be decoded
    /// (oversized or malformed body) and hand the error back.
    pub fn reject(&self, err: QaError) -> QaError {
        let mut tracker = StateTracker::new(&self.observer);
        warn!("Upload rejected: {}", err);
        tracker.advance(RequestState::Rejected);
        err
    }

    async fn run_inner(&self, upload: UploadRequest) -> Result<AnswerResult, QaError> {
        let start = Instant::now();
        let mut tracker = StateTracker::new(&self.observer);

        // ── Validate ─────────────────────────────────────────────────────
        let (file, question) = match validate(upload) {
            Ok(v) => v,
            Err(e) => {
                warn!("Upload rejected: {}", e);
                tracker.advance(RequestState::Rejected);
                return Err(e);
            }
        };
        tracker.advance(RequestState::Validated);
        info!(
            "Received {} compressed bytes, question of {} chars",
            file.bytes.len(),
            question.chars().count()
        );

        let result = self.process(&mut tracker, file.bytes, &question).await;
        match &result {
            Ok(answer) => {
                tracker.advance(RequestState::Responded);
                info!(
                    "Answered in {}ms (model {})",
                    start.elapsed().as_millis(),
                    answer.model_version
                );
            }
            Err(e) => {
                tracker.advance(RequestState::Failed);
                warn!("Upload failed after {}ms: {}", start.elapsed().as_millis(), e);
            }
        }
        result
    }

    async fn process(
        &self,
        tracker: &mut StateTracker<'_>,
        compressed: Vec<u8>,
        question: &str,
    ) -> Result<AnswerResult, QaError> {
        // ── Decompress ───────────────────────────────────────────────────
        let limit = self.max_document_bytes;
        let document = tokio::task::spawn_blocking(move || decompress::decompress(&compressed, limit))
            .await
            .map_err(|e| QaError::CorruptInput {
                detail: format!("decompression task failed: {e}"),
            })??;
        tracker.advance(RequestState::Decompressed);
        debug!("Inflated document is {} bytes", document.len());

        // ── Extract ──────────────────────────────────────────────────────
        let text = tokio::task::spawn_blocking(move || extract::extract_all_text(&document))
            .await
            .map_err(|e| QaError::UnparseableDocument {
                detail: format!("extraction task failed: {e}"),
            })??;
        tracker.advance(RequestState::TextExtracted);
        debug!("Extracted {} chars of text", text.chars().count());

        // ── Ask ──────────────────────────────────────────────────────────
        let answer = self.answers.ask(&text, question).await?;
        tracker.advance(RequestState::Answered);
        Ok(answer)
    }
}

/// Check the request invariant: exactly one file and a non-blank question.
///
/// The file is checked first so a request missing both reports the file.
fn validate(upload: UploadRequest) -> Result<(UploadedFile, String), QaError> {
    let file = upload.file.ok_or(QaError::MissingFile)?;
    if upload.extra_files > 0 {
        return Err(QaError::MultipleFiles {
            count: upload.extra_files + 1,
        });
    }
    let question = upload
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or(QaError::MissingQuestion)?;
    Ok((file, question))
}

/// Current request state plus the observer to notify on change.
struct StateTracker<'a> {
    state: RequestState,
    observer: &'a SharedObserver,
}

impl<'a> StateTracker<'a> {
    fn new(observer: &'a SharedObserver) -> Self {
        Self {
            state: RequestState::Received,
            observer,
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!("State {} -> {}", self.state, next);
        self.observer.on_transition(self.state, next);
        self.state = next;
    }
}
