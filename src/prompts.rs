//! Prompt text and fixed strings for the question-answering call.
//!
//! Keeping the prompt here means the wording can change without touching the
//! HTTP or retry logic in [`crate::pipeline::llm`], and tests can assert on
//! the exact text sent to the model.

/// Header placed before the document text.
pub const TEXT_HEADER: &str = "Extracted text from PDF:";

/// Header placed before the user's question.
pub const QUESTION_HEADER: &str = "Question:";

/// Answer text used when the model returns no candidate text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response received.";

/// Model version used when the response does not report one.
pub const UNKNOWN_MODEL_VERSION: &str = "Unknown";

/// Build the single-turn prompt sent to the model.
///
/// The layout is fixed: text header, document text, a blank line, question
/// header, question. Neither input is escaped or truncated.
pub fn build_prompt(extracted_text: &str, question: &str) -> String {
    format!("{TEXT_HEADER}\n{extracted_text}\n\n{QUESTION_HEADER}\n{question}")
}
