//! Client-side document report: page count, metadata, a short text preview
//! and a language guess, computed locally before anything is uploaded.
//!
//! The preview reads at most the first [`PREVIEW_PAGES`] pages. Each page's
//! text fragments are joined with single spaces, sentence ends (`.` followed
//! by whitespace) become paragraph breaks, and a blank line separates pages.
//! Gathering stops as soon as [`PREVIEW_CHARS`] characters are collected; the
//! result is trimmed and then cut to that length.

use crate::error::QaError;
use crate::language::detect_language;
use crate::output::{DocumentMetadata, DocumentReport, TextPreview};
use crate::pipeline::extract::{open_document, page_text, read_metadata};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Pages read for the preview.
pub const PREVIEW_PAGES: usize = 2;

/// Maximum preview length in characters.
pub const PREVIEW_CHARS: usize = 1000;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\s+").expect("static regex"));

/// Build the local report for a selected PDF.
///
/// # Errors
/// [`QaError::UnparseableDocument`] only when the document cannot be opened.
/// A page whose text cannot be decoded is skipped with a warning; when every
/// page read for the preview fails, `preview` and `language` stay unset.
pub fn extract_report(bytes: &[u8]) -> Result<DocumentReport, QaError> {
    let doc = open_document(bytes)?;
    let pages = doc.get_pages();
    let page_numbers: Vec<u32> = pages.keys().copied().collect();

    let report = report_from_pages(&page_numbers, read_metadata(&doc), |n| {
        match pages.get(&n) {
            Some(&page_id) => page_text(&doc, page_id),
            None => Err(QaError::UnparseableDocument {
                detail: format!("page {n} missing from page tree"),
            }),
        }
    });

    debug!(
        "Report: {} pages, language {:?}",
        report.page_count, report.language
    );
    Ok(report)
}

/// Assemble a report from per-page text supplied by `page_text`.
fn report_from_pages<F>(
    page_numbers: &[u32],
    metadata: DocumentMetadata,
    mut page_text: F,
) -> DocumentReport
where
    F: FnMut(u32) -> Result<String, QaError>,
{
    let mut warnings = Vec::new();
    let mut gathered = String::new();
    let mut pages_read = 0usize;

    for &n in page_numbers.iter().take(PREVIEW_PAGES) {
        match page_text(n) {
            Ok(text) => {
                pages_read += 1;
                gathered.push_str(&SENTENCE_END.replace_all(&text, ".\n\n"));
                gathered.push_str("\n\n");
                if gathered.chars().count() >= PREVIEW_CHARS {
                    break;
                }
            }
            Err(e) => {
                warn!("Page {}: preview text unavailable: {}", n, e);
                warnings.push(format!("Page {n}: text unavailable ({e})"));
            }
        }
    }

    let (preview, language) = if pages_read > 0 || page_numbers.is_empty() {
        let language = detect_language(&gathered).to_string();
        (Some(build_preview(&gathered)), Some(language))
    } else {
        (None, None)
    };

    DocumentReport {
        page_count: page_numbers.len(),
        metadata,
        preview,
        language,
        warnings,
    }
}

/// Trim `gathered`, cut it to [`PREVIEW_CHARS`] and count words and characters.
pub fn build_preview(gathered: &str) -> TextPreview {
    let text: String = gathered.trim().chars().take(PREVIEW_CHARS).collect();
    TextPreview {
        word_count: text.split_whitespace().count(),
        char_count: text.chars().count(),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::UNKNOWN_LANGUAGE;
    use crate::output::NOT_AVAILABLE;
    use crate::pipeline::fixtures::{build_pdf, build_pdf_from_operations, text_object};

    #[test]
    fn sentences_become_paragraphs() {
        let pdf = build_pdf(&[&["Hello world. This is a test."]], &[]);
        let report = extract_report(&pdf).unwrap();
        let preview = report.preview.unwrap();
        assert_eq!(preview.text, "Hello world.\n\nThis is a test.");
        assert_eq!(preview.char_count, 29);
        assert_eq!(preview.word_count, 6);
        assert_eq!(report.language.as_deref(), Some("English"));
        assert_eq!(report.page_count, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn fragments_on_a_page_are_space_joined() {
        let pdf = build_pdf(&[&["Alpha", "Beta"]], &[]);
        let preview = extract_report(&pdf).unwrap().preview.unwrap();
        assert_eq!(preview.text, "Alpha Beta");
    }

    #[test]
    fn separate_runs_are_joined_before_sentence_breaks() {
        let page = text_object(&["Hello", "world.", "Bye"], 720);
        let pdf = build_pdf_from_operations(vec![page], &[]);
        let preview = extract_report(&pdf).unwrap().preview.unwrap();
        assert_eq!(preview.text, "Hello world.\n\nBye");
        assert_eq!(preview.word_count, 3);
    }

    #[test]
    fn failing_page_is_skipped_with_warning() {
        let metadata = DocumentMetadata::from_fields(Some("Deck".into()), None, None);
        let report = report_from_pages(&[1, 2, 3], metadata, |n| match n {
            1 => Ok("First page. Still first".into()),
            _ => Err(QaError::UnparseableDocument {
                detail: "bad stream".into(),
            }),
        });
        assert_eq!(report.page_count, 3);
        assert_eq!(report.metadata.title, "Deck");
        assert_eq!(report.preview.unwrap().text, "First page.\n\nStill first");
        assert_eq!(report.language.as_deref(), Some("English"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Page 2:"));
    }

    #[test]
    fn all_preview_pages_failing_leaves_preview_unset() {
        let report = report_from_pages(&[1, 2], DocumentMetadata::default(), |_| {
            Err(QaError::UnparseableDocument {
                detail: "bad stream".into(),
            })
        });
        assert_eq!(report.page_count, 2);
        assert_eq!(report.metadata, DocumentMetadata::default());
        assert!(report.preview.is_none());
        assert!(report.language.is_none());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn only_first_two_pages_are_read() {
        let pdf = build_pdf(&[&["One"], &["Two"], &["Three"]], &[]);
        let report = extract_report(&pdf).unwrap();
        assert_eq!(report.page_count, 3);
        let text = report.preview.unwrap().text;
        assert!(text.contains("One"));
        assert!(text.contains("Two"));
        assert!(!text.contains("Three"));
    }

    #[test]
    fn preview_is_capped() {
        let long = "word ".repeat(400);
        let pdf = build_pdf(&[&[long.trim()], &["Second page"]], &[]);
        let preview = extract_report(&pdf).unwrap().preview.unwrap();
        assert_eq!(preview.char_count, PREVIEW_CHARS);
        assert!(!preview.text.contains("Second"));
    }

    #[test]
    fn metadata_defaults_in_report() {
        let pdf = build_pdf(&[&["x"]], &[("Keywords", "finance, q3")]);
        let report = extract_report(&pdf).unwrap();
        assert_eq!(report.metadata.title, NOT_AVAILABLE);
        assert_eq!(report.metadata.keywords, "finance, q3");
    }

    #[test]
    fn empty_gathered_text() {
        let preview = build_preview("  \n\n ");
        assert_eq!(preview.text, "");
        assert_eq!(preview.word_count, 0);
        assert_eq!(preview.char_count, 0);
        assert_eq!(detect_language(""), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn unparseable_bytes_fail_the_report() {
        let err = extract_report(b"nope").unwrap_err();
        assert!(matches!(err, QaError::UnparseableDocument { .. }));
    }
}
