//! Client side of the pipeline: pick a PDF, derive its report and compressed
//! form, then upload it with a question.
//!
//! ```text
//! input ──▶ prepare ──┬──▶ preview  (local report, display only)
//!                     └──▶ compress ──▶ session ──▶ upload
//! ```
//!
//! 1. [`input`]: read a local file and check the `%PDF` header
//! 2. [`prepare`]: run local extraction and compression concurrently
//! 3. [`session`]: hold the current selection and refuse stale results
//! 4. [`upload`]: send the multipart request and decode the answer

pub mod input;
pub mod prepare;
pub mod session;
pub mod upload;

use crate::error::QaError;
use crate::output::DocumentReport;
use std::path::Path;

/// Read `path` and build its local report without compressing or uploading.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DocumentReport, QaError> {
    let file = input::read_pdf(path).await?;
    tokio::task::spawn_blocking(move || crate::pipeline::preview::extract_report(&file.bytes))
        .await
        .map_err(|e| QaError::Internal(format!("local extraction task failed: {e}")))?
}
