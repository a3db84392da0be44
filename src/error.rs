// src/error.rs
// Standardized error types for the relay

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Main error type for the relay library.
///
/// The Display strings are the exact caller-facing messages; `Upstream` keeps its
/// internal detail out of the body and surfaces it via [`RelayError::detail`] for
/// logging only.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Message is required")]
    EmptyMessage,

    #[error("Invalid API key. Please check your Perplexity API configuration.")]
    Auth,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Failed to process your request. Please try again.")]
    Upstream(String),

    #[error("Method not allowed")]
    MethodNotAllowed,
}

/// Convenience type alias for Result using RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    pub fn upstream(detail: impl Into<String>) -> Self {
        RelayError::Upstream(detail.into())
    }

    /// HTTP status this error maps to at the API boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::EmptyMessage => StatusCode::BAD_REQUEST,
            RelayError::Auth => StatusCode::UNAUTHORIZED,
            RelayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Internal detail for logs. Never included in the response body.
    pub fn detail(&self) -> Option<&str> {
        match self {
            RelayError::Upstream(detail) => Some(detail),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Upstream(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
