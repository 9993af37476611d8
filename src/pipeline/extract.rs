//! Server-side text extraction: PDF bytes → plain text of every page.
//!
//! Parsing goes through [`lopdf`] straight from memory, so the decompressed
//! upload never touches disk. Every string shown by `Tj`, `TJ`, `'` or `"`
//! is one fragment; a page's fragments are joined with single spaces in
//! content-stream order and pages are separated by a line break. No layout
//! reconstruction is attempted.
//!
//! The helpers [`open_document`], [`page_text`] and [`read_metadata`] are
//! shared with the client-side report in [`super::preview`].

use crate::error::QaError;
use crate::output::{DocumentMetadata, ExtractionResult};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Parse `bytes` as a PDF document.
pub fn open_document(bytes: &[u8]) -> Result<Document, QaError> {
    Document::load_mem(bytes).map_err(|e| QaError::UnparseableDocument {
        detail: e.to_string(),
    })
}

/// Extract the full text, page count and metadata of a PDF.
///
/// # Errors
/// [`QaError::UnparseableDocument`] when the bytes are not a PDF, or when the
/// document has pages but none of them yields text.
pub fn extract_document(bytes: &[u8]) -> Result<ExtractionResult, QaError> {
    let doc = open_document(bytes)?;
    let pages = doc.get_pages();

    let mut texts = Vec::with_capacity(pages.len());
    let mut first_failure = None;
    for (&number, &page_id) in &pages {
        match page_text(&doc, page_id) {
            Ok(text) => texts.push(text),
            Err(e) => {
                warn!("Page {}: text extraction failed: {}", number, e);
                first_failure.get_or_insert(e);
            }
        }
    }
    if texts.is_empty() {
        if let Some(e) = first_failure {
            return Err(e);
        }
    }
    let text = texts.join("\n").trim().to_string();

    debug!(
        "Extracted {} chars from {} pages",
        text.chars().count(),
        pages.len()
    );

    Ok(ExtractionResult {
        text,
        page_count: Some(pages.len()),
        metadata: Some(read_metadata(&doc)),
    })
}

/// Extract only the trimmed text of every page.
pub fn extract_all_text(bytes: &[u8]) -> Result<String, QaError> {
    extract_document(bytes).map(|r| r.text)
}

/// Text of one page: its fragments joined with single spaces.
pub fn page_text(doc: &Document, page_id: ObjectId) -> Result<String, QaError> {
    page_fragments(doc, page_id)
        .map(|fragments| fragments.join(" "))
        .map_err(|e| QaError::UnparseableDocument {
            detail: format!("page text: {e}"),
        })
}

fn page_fragments(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<String>> {
    let encodings = doc
        .get_page_fonts(page_id)?
        .into_iter()
        .map(|(name, font)| font.get_font_encoding(doc).map(|enc| (name, enc)))
        .collect::<lopdf::Result<BTreeMap<Vec<u8>, Encoding>>>()?;
    let content = doc.get_and_decode_page_content(page_id)?;

    let mut fragments = Vec::new();
    let mut encoding: Option<&Encoding> = None;
    for op in &content.operations {
        let shown = match op.operator.as_str() {
            "Tf" => {
                encoding = op
                    .operands
                    .first()
                    .and_then(|font| font.as_name().ok())
                    .and_then(|name| encodings.get(name));
                continue;
            }
            "Tj" | "TJ" | "'" => op.operands.first(),
            "\"" => op.operands.get(2),
            _ => continue,
        };
        let Some(operand) = shown else { continue };
        let Some(enc) = encoding else {
            debug!("Text shown without a decodable font, skipped");
            continue;
        };
        let fragment = decode_shown(enc, operand)?;
        if !fragment.is_empty() {
            fragments.push(fragment);
        }
    }
    Ok(fragments)
}

/// Decode a string operand, or a `TJ` array where large negative kerning
/// stands for a word gap.
fn decode_shown(encoding: &Encoding, operand: &Object) -> lopdf::Result<String> {
    match operand {
        Object::String(bytes, _) => Document::decode_text(encoding, bytes),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => {
                        text.push_str(&Document::decode_text(encoding, bytes)?)
                    }
                    Object::Integer(_) | Object::Real(_) => {
                        if item.as_float().is_ok_and(|k| k < -100.0) {
                            text.push(' ');
                        }
                    }
                    _ => {}
                }
            }
            Ok(text)
        }
        _ => Ok(String::new()),
    }
}

/// Read Title, Author and Keywords from the trailer's Info dictionary.
///
/// A missing or malformed Info entry yields all-default metadata.
pub fn read_metadata(doc: &Document) -> DocumentMetadata {
    let Some(info) = info_dictionary(doc) else {
        return DocumentMetadata::default();
    };
    let field = |key: &[u8]| match info.get(key) {
        Ok(Object::String(bytes, _)) => Some(decode_pdf_string(bytes)),
        _ => None,
    };
    DocumentMetadata::from_fields(field(b"Title"), field(b"Author"), field(b"Keywords"))
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with a byte-order mark, otherwise
/// treated as single-byte (PDFDocEncoding's printable range is Latin-1).
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
