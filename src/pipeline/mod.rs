//! Pipeline stages for PDF question answering.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and driven from either the client or the server.
//!
//! ## Data Flow
//!
//! ```text
//!  client                         server
//! compress ──(multipart)──▶ decompress ──▶ extract ──▶ llm
//! preview  (display only)
//! ```
//!
//! 1. [`compress`]: zlib level 9 over the raw PDF bytes
//! 2. [`preview`]: local page count, metadata, preview and language
//! 3. [`decompress`]: inflate the upload with an output cap; runs in
//!    `spawn_blocking`
//! 4. [`extract`]: full-document text via lopdf; runs in `spawn_blocking`
//! 5. [`llm`]: the Gemini call with retry/backoff; the only stage
//!    with network I/O

pub mod compress;
pub mod decompress;
pub mod extract;
pub mod llm;
pub mod preview;

#[cfg(test)]
pub(crate) mod fixtures;
