//! HTTP server for the question-answering pipeline.
//!
//! # Endpoints
//!
//! - `POST /upload` - multipart upload: `compressedPdf` (binary) + `question`
//! - `POST /api/v1/upload` - same handler, older path
//! - `GET /` - liveness text
//!
//! Success is `200 {"text", "modelVersion"}`; every failure is
//! `{"error": "<message>"}` with the status from [`crate::error::ErrorKind`].
//!
//! # cURL
//!
//! ```bash
//! # report.pdf.gz must be a zlib stream, as produced by `pdfqa ask`
//! curl -F "compressedPdf=@report.pdf.gz" -F "question=Summarize the pdf." \
//!      http://localhost:5000/upload
//! ```

use crate::config::ServiceConfig;
use crate::error::QaError;
use crate::output::AnswerResult;
use crate::orchestrate::{Pipeline, UploadRequest, UploadedFile};
use crate::pipeline::llm::GeminiClient;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Multipart field carrying the compressed document.
pub const FILE_FIELD: &str = "compressedPdf";

/// Multipart field carrying the question.
pub const QUESTION_FIELD: &str = "question";

/// Body of `GET /`.
pub const LIVENESS_TEXT: &str = "Server is Live!";

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pipeline: Arc<Pipeline>,
    max_upload_bytes: usize,
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A [`QaError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub QaError);

impl From<QaError> for ApiError {
    fn from(e: QaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.kind().is_client_error() {
            info!("Rejected: {}", self.0);
        } else {
            error!("Request failed: {}", self.0);
        }
        let body = ErrorResponse {
            error: self.0.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the router around an existing pipeline.
pub fn create_router(pipeline: Arc<Pipeline>, config: &ServiceConfig) -> Router {
    let state = ApiState {
        pipeline,
        max_upload_bytes: config.max_upload_bytes,
    };
    Router::new()
        .route("/", get(liveness))
        .route("/upload", post(upload))
        .route("/api/v1/upload", post(upload))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state)
}

/// Bind `config.bind_addr` and serve until Ctrl-C.
///
/// # Errors
/// [`QaError::InvalidConfig`] when no API key is available or the address
/// cannot be bound; [`QaError::Internal`] if the server loop fails.
pub async fn serve(config: ServiceConfig) -> Result<(), QaError> {
    let client = GeminiClient::new(config.llm.clone())?;
    let pipeline = Arc::new(Pipeline::new(Arc::new(client), &config));
    let app = create_router(pipeline, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| QaError::InvalidConfig(format!("cannot bind {}: {e}", config.bind_addr)))?;
    let local = listener
        .local_addr()
        .map_err(|e| QaError::Internal(e.to_string()))?;
    info!("Listening on http://{} (model {})", local, config.llm.model);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| QaError::Internal(format!("server error: {e}")))?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

async fn upload(
    State(state): State<ApiState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnswerResult>, ApiError> {
    if let Some(len) = content_length(&headers) {
        if len > state.max_upload_bytes {
            return Err(state
                .pipeline
                .reject(QaError::PayloadTooLarge {
                    limit: state.max_upload_bytes,
                })
                .into());
        }
    }

    let request = match multipart {
        Ok(multipart) => read_upload(multipart, state.max_upload_bytes)
            .await
            .map_err(|e| state.pipeline.reject(e))?,
        // Not a multipart body: nothing was uploaded.
        Err(rejection) => {
            info!("Non-multipart upload: {}", rejection);
            UploadRequest::default()
        }
    };

    state
        .pipeline
        .run(request)
        .await
        .map(Json)
        .map_err(ApiError::from)
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Drain the multipart stream into an [`UploadRequest`].
///
/// Unknown fields are skipped; repeated `question` fields keep the first.
async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<UploadRequest, QaError> {
    let mut request = UploadRequest::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                if request.file.is_some() {
                    request.extra_files += 1;
                } else {
                    request.file = Some(UploadedFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            Some(QUESTION_FIELD) => {
                let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                if request.question.is_none() {
                    request.question = Some(text);
                }
            }
            other => {
                warn!(
                    "Ignoring unexpected multipart field '{}'",
                    other.unwrap_or("<unnamed>")
                );
            }
        }
    }
    Ok(request)
}

fn multipart_error(e: MultipartError, limit: usize) -> QaError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        QaError::PayloadTooLarge { limit }
    } else {
        QaError::MalformedUpload {
            detail: e.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn api_error_uses_public_message_and_status() {
        let resp = ApiError(QaError::UnparseableDocument {
            detail: "xref broken".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Failed to extract text from PDF."}));
    }

    #[tokio::test]
    async fn validation_errors_are_400() {
        let resp = ApiError(QaError::MissingQuestion).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = ApiError(QaError::PayloadTooLarge { limit: 5 }).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn content_length_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), None);
        headers.insert(header::CONTENT_LENGTH, "1234".parse().unwrap());
        assert_eq!(content_length(&headers), Some(1234));
        headers.insert(header::CONTENT_LENGTH, "abc".parse().unwrap());
        assert_eq!(content_length(&headers), None);
    }
}
