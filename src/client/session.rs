//! Client-side state for one selected document.
//!
//! Selecting a file starts two derivations, the local report and the
//! compressed artifact, which finish in any order. Each selection gets a new
//! [`SelectionToken`]; a derivation result is stored only if its token is
//! still current, so a slow result for a previously selected file can never
//! overwrite state belonging to the new one.

use crate::error::QaError;
use crate::output::DocumentReport;
use crate::pipeline::compress::CompressedDocument;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::input::SelectedFile;

/// Identifies one selection. Compared by value; newer selections are larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionToken(u64);

/// Progress of one derived value.
#[derive(Debug, Clone, PartialEq)]
pub enum Derivation<T> {
    Pending,
    Ready(T),
    /// Holds the error's display text.
    Failed(String),
}

impl<T> Derivation<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Derivation::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Derivation::Ready(v) => Some(v),
            _ => None,
        }
    }

    fn from_result(result: Result<T, QaError>) -> Self {
        match result {
            Ok(v) => Derivation::Ready(v),
            Err(e) => Derivation::Failed(e.to_string()),
        }
    }
}

/// Everything needed for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Part filename, `<original>.gz`.
    pub filename: String,
    pub compressed: Vec<u8>,
    pub question: String,
}

#[derive(Debug)]
struct State {
    version: u64,
    file: Option<SelectedFile>,
    report: Derivation<DocumentReport>,
    compressed: Derivation<CompressedDocument>,
}

/// Current selection plus its derived artifacts.
#[derive(Debug)]
pub struct Selection {
    state: Mutex<State>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                version: 0,
                file: None,
                report: Derivation::Pending,
                compressed: Derivation::Pending,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the selection, discarding every artifact of the previous one.
    pub fn select(&self, file: SelectedFile) -> SelectionToken {
        let mut state = self.lock();
        state.version += 1;
        debug!("Selection {} -> {}", state.version, file.name);
        state.file = Some(file);
        state.report = Derivation::Pending;
        state.compressed = Derivation::Pending;
        SelectionToken(state.version)
    }

    /// Store the local report for `token`. Returns `false` if stale.
    pub fn complete_report(
        &self,
        token: SelectionToken,
        result: Result<DocumentReport, QaError>,
    ) -> bool {
        let mut state = self.lock();
        if !is_current(&state, token) {
            debug!("Discarding stale report for selection {}", token.0);
            return false;
        }
        if let Err(e) = &result {
            warn!("Local extraction failed: {}", e);
        }
        state.report = Derivation::from_result(result);
        true
    }

    /// Store the compressed artifact for `token`. Returns `false` if stale.
    ///
    /// A failure leaves no artifact behind, so a later submission is refused.
    pub fn complete_compression(
        &self,
        token: SelectionToken,
        result: Result<CompressedDocument, QaError>,
    ) -> bool {
        let mut state = self.lock();
        if !is_current(&state, token) {
            debug!("Discarding stale compression for selection {}", token.0);
            return false;
        }
        if let Err(e) = &result {
            warn!("Compression failed: {}", e);
        }
        state.compressed = Derivation::from_result(result);
        true
    }

    pub fn report(&self) -> Derivation<DocumentReport> {
        self.lock().report.clone()
    }

    pub fn compressed(&self) -> Derivation<CompressedDocument> {
        self.lock().compressed.clone()
    }

    /// Build the upload for `question`.
    ///
    /// # Errors
    /// * [`QaError::NoFileSelected`]: nothing selected
    /// * [`QaError::NotReady`]: a derivation is still running
    /// * [`QaError::CompressedArtifactMissing`]: compression failed
    /// * [`QaError::EmptyQuestion`]: blank question
    pub fn submission(&self, question: &str) -> Result<Submission, QaError> {
        let state = self.lock();
        let file = state.file.as_ref().ok_or(QaError::NoFileSelected)?;
        if state.report.is_pending() || state.compressed.is_pending() {
            return Err(QaError::NotReady);
        }
        let compressed = state
            .compressed
            .ready()
            .ok_or(QaError::CompressedArtifactMissing)?;
        if question.trim().is_empty() {
            return Err(QaError::EmptyQuestion);
        }
        Ok(Submission {
            filename: file.upload_name(),
            compressed: compressed.as_bytes().to_vec(),
            question: question.to_string(),
        })
    }
}

fn is_current(state: &State, token: SelectionToken) -> bool {
    state.file.is_some() && state.version == token.0
}
