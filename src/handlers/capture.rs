//! The capture endpoint
//!
//! `POST /capture` is the boundary between the wire and the capture engine:
//! it validates request shape, dispatches, maps the error taxonomy to HTTP
//! statuses, and implements the inline response mode (base64 body, backing
//! file deleted after transfer).

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::browser::{Artifact, CaptureOutcome};
use crate::error::CaptureError;
use crate::options::CaptureRequest;

use super::AppState;

/// JSON error body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable error kind label (e.g. `element_not_found`)
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Correlation id, also present in the server logs
    pub request_id: Uuid,
}

/// Response body for the inline (base64) mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineCapture {
    /// Which strategy produced the image (`singleSelector` or `fullPage`)
    pub kind: String,
    /// The generated identity the image was briefly persisted under
    pub file_name: String,
    /// Image size in bytes
    pub bytes: u64,
    /// MIME type of the encoded image
    pub mime_type: String,
    /// Base64-encoded image data
    pub data: String,
}

/// `POST /capture` - render the page and capture per the request.
#[instrument(skip_all, fields(request_id))]
pub async fn capture_handler(
    State(state): State<AppState>,
    Json(request): Json<CaptureRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    tracing::Span::current().record("request_id", request_id.to_string().as_str());

    if let Err(response) = validate_shape(&request, request_id) {
        return response;
    }

    info!(url = %request.url, full_page = request.full_page, "capture request");

    let start = Instant::now();
    let result = state.engine.capture(&request).await;
    state.stats.record_latency(start.elapsed());

    match result {
        Ok(outcome) => {
            state.stats.record_capture();
            counter!("clipshot_captures_total").increment(1);
            if request.inline {
                inline_response(outcome, request_id).await
            } else {
                (StatusCode::OK, Json(outcome)).into_response()
            }
        }
        Err(e) => {
            state.stats.record_failure();
            counter!("clipshot_capture_errors_total", "kind" => e.kind()).increment(1);
            debug!("capture failed: {e}");
            error_response(&e, request_id)
        }
    }
}

/// Reject requests whose shape can never capture anything: no target mode,
/// or a URL that is not absolute http(s).
fn validate_shape(request: &CaptureRequest, request_id: Uuid) -> Result<(), Response> {
    if request.mode().is_none() {
        return Err(shape_error(
            "request must supply a selector or set fullPage",
            request_id,
        ));
    }

    match Url::parse(&request.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(shape_error(
            &format!("unsupported URL scheme: {}", url.scheme()),
            request_id,
        )),
        Err(e) => Err(shape_error(
            &format!("url must be an absolute http(s) URL: {e}"),
            request_id,
        )),
    }
}

fn shape_error(message: &str, request_id: Uuid) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorBody {
            error: "invalid_request".to_string(),
            message: message.to_string(),
            request_id,
        }),
    )
        .into_response()
}

fn error_response(error: &CaptureError, request_id: Uuid) -> Response {
    (
        error.status_code(),
        Json(ErrorBody {
            error: error.kind().to_string(),
            message: error.to_string(),
            request_id,
        }),
    )
        .into_response()
}

/// Serve a single-artifact outcome inline and delete the backing file.
///
/// Batch outcomes have no single artifact to inline; they are returned as
/// the regular reference response.
async fn inline_response(outcome: CaptureOutcome, request_id: Uuid) -> Response {
    let artifact = match outcome.artifact() {
        Some(artifact) => artifact.clone(),
        None => return (StatusCode::OK, Json(outcome)).into_response(),
    };
    let kind = match &outcome {
        CaptureOutcome::FullPage { .. } => "fullPage",
        _ => "singleSelector",
    };

    match read_and_remove(&artifact).await {
        Ok(data) => {
            let mime_type = if artifact.file_name.ends_with(".jpg") {
                "image/jpeg"
            } else {
                "image/png"
            };
            let body = InlineCapture {
                kind: kind.to_string(),
                file_name: artifact.file_name,
                bytes: artifact.bytes,
                mime_type: mime_type.to_string(),
                data: BASE64.encode(&data),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(&e, request_id),
    }
}

async fn read_and_remove(artifact: &Artifact) -> crate::error::Result<Vec<u8>> {
    let data = tokio::fs::read(&artifact.path).await?;
    if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
        warn!(path = %artifact.path.display(), "failed to delete inlined artifact: {e}");
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_body_serialization() {
        let body = ErrorBody {
            error: "element_not_found".to_string(),
            message: "element not found for selector: h1".to_string(),
            request_id: Uuid::nil(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"error\":\"element_not_found\""));
        assert!(json.contains("\"requestId\""));
    }

    #[test]
    fn test_shape_validation_requires_mode() {
        let request = CaptureRequest {
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        assert!(validate_shape(&request, Uuid::nil()).is_err());
    }

    #[test]
    fn test_shape_validation_rejects_relative_url() {
        let request = CaptureRequest {
            url: "/just/a/path".to_string(),
            full_page: true,
            ..Default::default()
        };
        assert!(validate_shape(&request, Uuid::nil()).is_err());
    }

    #[test]
    fn test_shape_validation_rejects_file_scheme() {
        let request = CaptureRequest {
            url: "file:///etc/passwd".to_string(),
            full_page: true,
            ..Default::default()
        };
        assert!(validate_shape(&request, Uuid::nil()).is_err());
    }

    #[test]
    fn test_shape_validation_accepts_https_full_page() {
        let request = CaptureRequest {
            url: "https://example.com".to_string(),
            full_page: true,
            ..Default::default()
        };
        assert!(validate_shape(&request, Uuid::nil()).is_ok());
    }

    #[tokio::test]
    async fn test_inline_reads_and_deletes_file() {
        let dir = std::env::temp_dir();
        let file_name = format!("clipshot-inline-test-{}.png", Uuid::new_v4());
        let path = dir.join(&file_name);
        tokio::fs::write(&path, b"fake image bytes").await.unwrap();

        let artifact = Artifact {
            file_name,
            path: path.clone(),
            bytes: 16,
        };
        let data = read_and_remove(&artifact).await.unwrap();
        assert_eq!(data, b"fake image bytes");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_inline_missing_file_is_internal_error() {
        let artifact = Artifact {
            file_name: "does-not-exist.png".to_string(),
            path: PathBuf::from("/nonexistent/does-not-exist.png"),
            bytes: 0,
        };
        let err = read_and_remove(&artifact).await.unwrap_err();
        assert_eq!(err.kind(), "internal_error");
    }
}
