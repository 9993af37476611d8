//! Question answering: send document text plus question to Gemini and map
//! the reply to an [`AnswerResult`].
//!
//! The HTTP contract is the public `generateContent` REST call: one user turn
//! whose single text part is the prompt from [`crate::prompts::build_prompt`].
//! All prompt wording lives in [`crate::prompts`]; this module only deals with
//! transport, retries and response decoding.
//!
//! ## Retry Strategy
//!
//! Network errors, timeouts, HTTP 429 and 5xx responses are retried with
//! exponential backoff (`retry_backoff_ms * 2^(attempt-1)`). Other 4xx
//! responses (bad key, bad model name) fail immediately. The default is a
//! single attempt; see [`LlmConfig::max_retries`].

use crate::config::LlmConfig;
use crate::error::QaError;
use crate::output::AnswerResult;
use crate::prompts::{build_prompt, NO_RESPONSE_PLACEHOLDER, UNKNOWN_MODEL_VERSION};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Anything that can answer a question about a document's text.
///
/// The server pipeline holds an `Arc<dyn AnswerService>`; tests substitute
/// fakes to observe or short-circuit the LLM call.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, extracted_text: &str, question: &str) -> Result<AnswerResult, QaError>;
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    config: LlmConfig,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("config", &self.config)
            .finish()
    }
}

// ── Wire types ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// First candidate's first text part and the model version, with
    /// placeholders for anything absent or empty.
    fn into_answer(self) -> AnswerResult {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string());
        let model_version = self
            .model_version
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNKNOWN_MODEL_VERSION.to_string());
        AnswerResult {
            text,
            model_version,
        }
    }
}

/// One failed attempt and whether another attempt may help.
struct AttemptFailure {
    error: QaError,
    retryable: bool,
}

impl GeminiClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    /// [`QaError::InvalidConfig`] when no API key is configured or set in the
    /// environment, or the HTTP client cannot be constructed.
    pub fn new(config: LlmConfig) -> Result<Self, QaError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            QaError::InvalidConfig(format!(
                "no Gemini API key: set {} or pass --api-key",
                crate::config::API_KEY_ENV
            ))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| QaError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    /// Send `prompt`, retrying transient failures per the configured policy.
    pub async fn generate(&self, prompt: &str) -> Result<AnswerResult, QaError> {
        let start = Instant::now();
        let max_retries = self.config.max_retries;
        let mut attempt: u32 = 0;

        loop {
            if attempt > 0 {
                let backoff = backoff_ms(self.config.retry_backoff_ms, attempt);
                warn!(
                    "Gemini: retry {}/{} after {}ms",
                    attempt, max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.generate_once(prompt).await {
                Ok(answer) => {
                    debug!(
                        "Gemini answered in {:?} ({} chars, model {})",
                        start.elapsed(),
                        answer.text.len(),
                        answer.model_version
                    );
                    return Ok(answer);
                }
                Err(failure) => {
                    warn!("Gemini: attempt {} failed: {}", attempt + 1, failure.error);
                    if !failure.retryable || attempt >= max_retries {
                        return Err(failure.error);
                    }
                }
            }
            attempt += 1;
        }
    }

    async fn generate_once(&self, prompt: &str) -> Result<AnswerResult, AttemptFailure> {
        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| self.transport_failure(e))?;

        if !status.is_success() {
            let retryable = status.as_u16() == 429 || status.is_server_error();
            return Err(AttemptFailure {
                error: QaError::Upstream {
                    detail: format!("HTTP {}: {}", status.as_u16(), snippet(&raw)),
                },
                retryable,
            });
        }

        let parsed = match serde_json::from_str::<GenerateResponse>(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Gemini returned an undecodable body ({}), using placeholder", e);
                GenerateResponse::default()
            }
        };
        Ok(parsed.into_answer())
    }

    fn transport_failure(&self, e: reqwest::Error) -> AttemptFailure {
        let error = if e.is_timeout() {
            QaError::UpstreamTimeout {
                secs: self.config.api_timeout_secs,
            }
        } else {
            QaError::Upstream {
                detail: e.to_string(),
            }
        };
        AttemptFailure {
            error,
            retryable: true,
        }
    }
}

#[async_trait]
impl AnswerService for GeminiClient {
    async fn ask(&self, extracted_text: &str, question: &str) -> Result<AnswerResult, QaError> {
        self.generate(&build_prompt(extracted_text, question)).await
    }
}

/// First 200 characters of an upstream body, for error details.
fn snippet(body: &str) -> String {
    let s: String = body.chars().take(200).collect();
    if s.len() < body.len() {
        format!("{s}…")
    } else {
        s
    }
}

/// Delay before retry `attempt` (1-based): `base_ms * 2^(attempt-1)`,
/// saturating at `u64::MAX`.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn client_for(server: &mockito::Server, max_retries: u32) -> GeminiClient {
        GeminiClient::new(LlmConfig {
            api_key: Some("test-key".into()),
            base_url: server.url(),
            max_retries,
            retry_backoff_ms: 1,
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn decode_takes_first_candidate_part() {
        let r: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"A"},{"text":"B"}]}},
                {"content":{"parts":[{"text":"C"}]}}],"modelVersion":"gemini-1.5-flash-002"}"#,
        )
        .unwrap();
        let a = r.into_answer();
        assert_eq!(a.text, "A");
        assert_eq!(a.model_version, "gemini-1.5-flash-002");
    }

    #[test]
    fn decode_uses_placeholders() {
        let a = serde_json::from_str::<GenerateResponse>("{}").unwrap().into_answer();
        assert_eq!(a.text, NO_RESPONSE_PLACEHOLDER);
        assert_eq!(a.model_version, UNKNOWN_MODEL_VERSION);

        let a = serde_json::from_str::<GenerateResponse>(
            r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#,
        )
        .unwrap()
        .into_answer();
        assert_eq!(a.text, NO_RESPONSE_PLACEHOLDER);
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: "p" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "p"}]}]})
        );
    }

    #[test]
    fn missing_key_is_config_error() {
        let config = LlmConfig {
            api_key: Some(String::new()),
            ..LlmConfig::default()
        };
        if std::env::var(crate::config::API_KEY_ENV).is_err() {
            assert!(matches!(
                GeminiClient::new(config),
                Err(QaError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn debug_hides_key() {
        let client = GeminiClient::new(LlmConfig {
            api_key: Some("super-secret".into()),
            ..LlmConfig::default()
        })
        .unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn ask_sends_prompt_and_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::Json(serde_json::json!({
                "contents": [{"parts": [{"text":
                    "Extracted text from PDF:\nHello.\n\nQuestion:\nWhat?"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Greeting."}]}}],"modelVersion":"v1"}"#)
            .create_async()
            .await;

        let answer = client_for(&server, 0).ask("Hello.", "What?").await.unwrap();
        assert_eq!(answer.text, "Greeting.");
        assert_eq!(answer.model_version, "v1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .with_status(503)
            .with_body("overloaded")
            .expect(3)
            .create_async()
            .await;

        let err = client_for(&server, 2).ask("t", "q").await.unwrap_err();
        assert!(matches!(err, QaError::Upstream { .. }), "got {err:?}");
        assert!(err.to_string().contains("503"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .with_status(400)
            .with_body(r#"{"error":{"message":"API key not valid"}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server, 3).ask("t", "q").await.unwrap_err();
        assert!(matches!(err, QaError::Upstream { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_json_success_body_yields_placeholder() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let answer = client_for(&server, 0).ask("t", "q").await.unwrap();
        assert_eq!(answer.text, NO_RESPONSE_PLACEHOLDER);
        assert_eq!(answer.model_version, UNKNOWN_MODEL_VERSION);
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        let s = snippet(&long);
        assert!(s.ends_with('…'));
        assert_eq!(s.chars().count(), 201);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(u64::MAX / 2, 3), u64::MAX);
        assert_eq!(backoff_ms(1, 200), u64::MAX);
    }
}
