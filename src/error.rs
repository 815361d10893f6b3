//! Error types for clipshot
//!
//! Every failure a capture request can hit is represented as one variant of
//! [`CaptureError`]. Each variant is raised directly by the operation that
//! fails (the viewport validator, the selector wait, the navigation step),
//! so callers never have to classify failures by inspecting message text.

use axum::http::StatusCode;
use thiserror::Error;

/// The error taxonomy for capture requests.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Custom viewport dimensions fall outside the supported bounds.
    ///
    /// Raised by the option resolver before any browser process exists.
    #[error("invalid viewport {width}x{height}: width must be 100-3840, height must be 100-2160")]
    InvalidViewport {
        /// Requested viewport width in pixels
        width: u32,
        /// Requested viewport height in pixels
        height: u32,
    },

    /// The selector never matched an element before the deadline.
    #[error("element not found for selector: {selector}")]
    ElementNotFound {
        /// The CSS selector that never matched
        selector: String,
    },

    /// Navigation or page readiness exceeded its deadline.
    #[error("request timed out after {ms}ms")]
    RequestTimeout {
        /// The deadline that elapsed, in milliseconds
        ms: u64,
    },

    /// The target URL could not be reached (DNS, connection refused, etc).
    #[error("network error reaching target: {message}")]
    NetworkError {
        /// Description of the navigation failure
        message: String,
    },

    /// Browser launch, page creation, CDP, or I/O failure.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the underlying failure
        message: String,
    },
}

impl CaptureError {
    /// Build a [`CaptureError::Internal`] from any displayable cause.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        CaptureError::Internal {
            message: message.into(),
        }
    }

    /// Stable snake_case label for the variant, used in JSON error bodies
    /// and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::InvalidViewport { .. } => "invalid_viewport",
            CaptureError::ElementNotFound { .. } => "element_not_found",
            CaptureError::RequestTimeout { .. } => "request_timeout",
            CaptureError::NetworkError { .. } => "network_error",
            CaptureError::Internal { .. } => "internal_error",
        }
    }

    /// HTTP status the boundary maps this variant to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CaptureError::InvalidViewport { .. } => StatusCode::BAD_REQUEST,
            CaptureError::ElementNotFound { .. } => StatusCode::NOT_FOUND,
            CaptureError::RequestTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CaptureError::NetworkError { .. } => StatusCode::BAD_GATEWAY,
            CaptureError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Internal {
            message: format!("I/O error: {err}"),
        }
    }
}

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;
