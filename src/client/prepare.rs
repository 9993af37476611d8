//! Run both client-side derivations of a newly selected file.

use super::input::SelectedFile;
use super::session::{Selection, SelectionToken};
use crate::error::QaError;
use crate::pipeline::{compress, preview};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Select `file` and compute its report and compressed artifact concurrently.
///
/// Both results are stored in `selection` under the new token; results that
/// arrive after another file was selected are dropped by the session.
pub async fn prepare(selection: &Selection, file: SelectedFile) -> SelectionToken {
    let bytes: Arc<[u8]> = Arc::from(file.bytes.as_slice());
    let token = selection.select(file);
    let start = Instant::now();

    let report_bytes = Arc::clone(&bytes);
    let report_task = tokio::task::spawn_blocking(move || preview::extract_report(&report_bytes));
    let compress_task = tokio::task::spawn_blocking(move || compress::compress(&bytes));

    let (report, compressed) = tokio::join!(report_task, compress_task);

    selection.complete_report(token, flatten(report, "local extraction"));
    selection.complete_compression(token, flatten(compressed, "compression"));
    debug!("Prepared selection in {}ms", start.elapsed().as_millis());
    token
}

fn flatten<T>(
    joined: Result<Result<T, QaError>, tokio::task::JoinError>,
    what: &str,
) -> Result<T, QaError> {
    joined.map_err(|e| QaError::Internal(format!("{what} task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::decompress::decompress;
    use crate::pipeline::fixtures::build_pdf;
    use std::path::PathBuf;

    fn selected(bytes: Vec<u8>) -> SelectedFile {
        SelectedFile {
            name: "doc.pdf".into(),
            path: PathBuf::from("doc.pdf"),
            bytes,
        }
    }

    #[tokio::test]
    async fn both_derivations_complete() {
        let pdf = build_pdf(&[&["Hello world. This is a test."]], &[]);
        let selection = Selection::new();
        prepare(&selection, selected(pdf.clone())).await;

        let report = selection.report();
        let report = report.ready().unwrap();
        assert_eq!(report.page_count, 1);
        assert_eq!(report.language.as_deref(), Some("English"));

        let sub = selection.submission("Summarize the pdf.").unwrap();
        assert_eq!(sub.filename, "doc.pdf.gz");
        assert_eq!(decompress(&sub.compressed, usize::MAX).unwrap(), pdf);
    }

    #[tokio::test]
    async fn report_failure_does_not_block_compression() {
        let selection = Selection::new();
        prepare(&selection, selected(b"%PDF-1.4 truncated".to_vec())).await;
        assert!(!selection.report().is_pending());
        assert!(selection.compressed().ready().is_some());
        assert!(selection.submission("q").is_ok());
    }
}
