//! # pdfqa
//!
//! Ask natural-language questions about PDF documents.
//!
//! A client compresses the PDF and uploads it together with a question; the
//! server inflates it, extracts the text and asks Gemini, returning the answer
//! and the model version. While the upload is prepared, the client builds a
//! local report (page count, metadata, a short preview and a language guess)
//! that is shown to the user and never sent anywhere.
//!
//! ## Pipeline Overview
//!
//! ```text
//! client                                 server  POST /upload
//!  ├─ 1. Input     read file, check %PDF
//!  ├─ 2. Prepare   compress ∥ local report
//!  └─ 3. Upload    multipart ─────────────▶ 4. Decompress  (spawn_blocking)
//!                                          5. Extract     (spawn_blocking)
//!                                          6. Ask         Gemini generateContent
//!        answer + model version ◀───────── 7. Respond
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfqa::{serve, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GEMINI_API_KEY
//!     let config = ServiceConfig::builder().bind_addr("127.0.0.1:5000").build()?;
//!     serve(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfqa` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfqa = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod language;
pub mod observer;
pub mod orchestrate;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::inspect;
pub use client::session::{Derivation, Selection, SelectionToken, Submission};
pub use client::upload::UploadClient;
pub use config::{ClientConfig, LlmConfig, ServiceConfig, ServiceConfigBuilder};
pub use error::{ErrorKind, QaError};
pub use language::detect_language;
pub use observer::{NoopObserver, PipelineObserver, RequestState};
pub use orchestrate::{Pipeline, UploadRequest, UploadedFile};
pub use output::{AnswerResult, DocumentMetadata, DocumentReport, ExtractionResult, TextPreview};
pub use pipeline::compress::{compress, CompressedDocument};
pub use pipeline::decompress::decompress;
pub use pipeline::extract::{extract_all_text, extract_document};
pub use pipeline::llm::{AnswerService, GeminiClient};
pub use pipeline::preview::extract_report;
pub use server::{create_router, serve};
