//! Configuration types for the upload server, the QA client and the CLI client.
//!
//! Server behaviour is controlled through [`ServiceConfig`], built via its
//! [`ServiceConfigBuilder`]. The LLM settings live in a nested [`LlmConfig`]
//! so the QA client can be constructed on its own in tests and tools.

use crate::error::QaError;
use std::fmt;

/// One mebibyte, the unit used by the CLI size flags.
pub const MIB: usize = 1024 * 1024;

/// Default maximum accepted upload body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * MIB;

/// Default maximum size of an inflated document.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 512 * MIB;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default Gemini REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable consulted when [`LlmConfig::api_key`] is unset.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Settings for the outbound LLM call.
#[derive(Clone)]
pub struct LlmConfig {
    /// API key sent as `x-goog-api-key`. Falls back to `GEMINI_API_KEY`.
    pub api_key: Option<String>,

    /// Model identifier used in the request path. Default: `gemini-1.5-flash`.
    pub model: String,

    /// Scheme + host (+ optional prefix) of the generateContent API.
    pub base_url: String,

    /// Per-call timeout in seconds. Default: 60. Expiry is an upstream error.
    pub api_timeout_secs: u64,

    /// Extra attempts after a failed call. Default: 0 (single attempt).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

impl LlmConfig {
    /// The configured key, or the value of `GEMINI_API_KEY` when unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }

    /// Full generateContent URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Configuration for the upload server.
///
/// # Example
/// ```rust
/// use pdfqa::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .bind_addr("127.0.0.1:8080")
///     .max_upload_bytes(50 * 1024 * 1024)
///     .model("gemini-1.5-pro")
///     .build()
///     .unwrap();
/// assert_eq!(config.llm.model, "gemini-1.5-pro");
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address to listen on. Default: `0.0.0.0:5000`.
    pub bind_addr: String,

    /// Maximum multipart body size. Default: 200 MiB.
    pub max_upload_bytes: usize,

    /// Maximum size of the inflated PDF. Default: 512 MiB.
    pub max_document_bytes: usize,

    /// Outbound LLM settings.
    pub llm: LlmConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            llm: LlmConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn max_document_bytes(mut self, n: usize) -> Self {
        self.config.max_document_bytes = n;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.llm.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.llm.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.llm.base_url = url.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.llm.api_timeout_secs = secs.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.llm.max_retries = n.min(10);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.llm.retry_backoff_ms = ms;
        self
    }

    pub fn llm(mut self, llm: LlmConfig) -> Self {
        self.config.llm = llm;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, QaError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(QaError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_document_bytes == 0 {
            return Err(QaError::InvalidConfig(
                "max_document_bytes must be ≥ 1".into(),
            ));
        }
        if c.llm.model.trim().is_empty() {
            return Err(QaError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.llm.base_url.starts_with("http://") || c.llm.base_url.starts_with("https://")) {
            return Err(QaError::InvalidConfig(format!(
                "base_url must be an HTTP/HTTPS URL, got '{}'",
                c.llm.base_url
            )));
        }
        Ok(self.config)
    }
}

/// Configuration for the CLI upload client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the upload endpoint.
    pub endpoint: String,

    /// Whole-request timeout in seconds. Covers the server's LLM round trip.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/upload".to_string(),
            timeout_secs: 300,
        }
    }
}
