//! Multipart upload of a [`Submission`] to the server.

use super::session::Submission;
use crate::config::ClientConfig;
use crate::error::QaError;
use crate::output::AnswerResult;
use crate::server::{FILE_FIELD, QUESTION_FIELD};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// MIME type of the compressed part.
pub const COMPRESSED_MIME: &str = "application/gzip";

/// Talks to one upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl UploadClient {
    pub fn new(config: &ClientConfig) -> Result<Self, QaError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QaError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `submission` and decode the answer.
    ///
    /// # Errors
    /// * [`QaError::Transport`]: the endpoint could not be reached, or the
    ///   response was not understood
    /// * [`QaError::Server`]: the server answered with an error body
    pub async fn submit(&self, submission: Submission) -> Result<AnswerResult, QaError> {
        let size = submission.compressed.len();
        let part = Part::bytes(submission.compressed)
            .file_name(submission.filename)
            .mime_str(COMPRESSED_MIME)
            .map_err(|e| self.transport(e))?;
        let form = Form::new()
            .part(FILE_FIELD, part)
            .text(QUESTION_FIELD, submission.question);

        info!("Uploading {} bytes to {}", size, self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport(e))?;
        debug!("Server answered {} ({} bytes)", status, body.len());

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| QaError::Transport {
                endpoint: self.endpoint.clone(),
                detail: format!("unexpected response body: {e}"),
            });
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
        Err(QaError::Server {
            status: status.as_u16(),
            message,
        })
    }

    fn transport(&self, e: reqwest::Error) -> QaError {
        QaError::Transport {
            endpoint: self.endpoint.clone(),
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn submission() -> Submission {
        Submission {
            filename: "doc.pdf.gz".into(),
            compressed: vec![0x78, 0xDA, 0x03, 0x00],
            question: "What is it?".into(),
        }
    }

    fn client(url: String) -> UploadClient {
        UploadClient::new(&ClientConfig {
            endpoint: url,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn success_decodes_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".into()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="compressedPdf"; filename="doc.pdf.gz""#.into()),
                Matcher::Regex("application/gzip".into()),
                Matcher::Regex("What is it\\?".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"text":"A test document.","modelVersion":"v1"}"#)
            .create_async()
            .await;

        let answer = client(format!("{}/upload", server.url()))
            .submit(submission())
            .await
            .unwrap();
        assert_eq!(answer.text, "A test document.");
        assert_eq!(answer.model_version, "v1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_body_becomes_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .with_status(400)
            .with_body(r#"{"error":"No question provided"}"#)
            .create_async()
            .await;

        let err = client(format!("{}/upload", server.url()))
            .submit(submission())
            .await
            .unwrap_err();
        match err {
            QaError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No question provided");
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let err = client(format!("http://127.0.0.1:{port}/upload"))
            .submit(submission())
            .await
            .unwrap_err();
        assert!(matches!(err, QaError::Transport { .. }));
        assert_eq!(err.public_message(), "Failed to upload PDF.");
    }
}
