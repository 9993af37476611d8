//! Result types produced by the pipeline stages.
//!
//! All of them are plain data: derived once, never mutated, serialisable so
//! the CLI can print them as JSON and the server can return them as-is.

use serde::{Deserialize, Serialize};

/// Placeholder for metadata fields the document does not carry.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Answer returned by the QA client and, unchanged, by `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    /// Answer text, or the placeholder when the model returned none.
    pub text: String,
    /// Model version reported by the service, or `"Unknown"`.
    pub model_version: String,
}

/// Title / author / keywords from the PDF Info dictionary.
///
/// Absent or blank entries hold [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub keywords: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            author: NOT_AVAILABLE.to_string(),
            keywords: NOT_AVAILABLE.to_string(),
        }
    }
}

impl DocumentMetadata {
    /// Build from optional raw values, substituting [`NOT_AVAILABLE`].
    pub fn from_fields(
        title: Option<String>,
        author: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let or_default = |v: Option<String>| {
            v.filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        Self {
            title: or_default(title),
            author: or_default(author),
            keywords: or_default(keywords),
        }
    }
}

/// Full-document text extracted on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Trimmed plain text of every page.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}

/// Length-capped excerpt shown to the user before upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPreview {
    /// At most 1000 characters, trimmed before slicing.
    pub text: String,
    /// Whitespace-delimited tokens in `text`.
    pub word_count: usize,
    /// Characters in `text`.
    pub char_count: usize,
}

/// Everything the local extractor learns about a selected PDF.
///
/// Fields are computed independently. A page whose text cannot be decoded
/// is skipped and named in `warnings`; the other pages still feed the
/// preview. When no preview page decodes, `preview` and `language` are empty
/// while page count and metadata are still reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub page_count: usize,
    pub metadata: DocumentMetadata,
    pub preview: Option<TextPreview>,
    /// Best-effort script-based guess, see [`crate::language`].
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
