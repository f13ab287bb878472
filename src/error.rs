//! Error types for the mock service
//!
//! Every negative path the service produces on purpose (missing credentials,
//! unknown routes, malformed batch bodies) is an `AppError` value rendered
//! through `IntoResponse`. Simulated failures are not errors; they are built by
//! the response composer.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric error codes carried in `{"error":{"code":..}}` bodies
pub mod codes {
    const REQUEST_BASE: u32 = 1000;

    pub const INVALID_BODY: u32 = REQUEST_BASE + 1;
    pub const NOT_FOUND: u32 = REQUEST_BASE + 2;
    pub const METHOD_NOT_ALLOWED: u32 = REQUEST_BASE + 3;
    pub const RATE_LIMIT_EXCEEDED: u32 = REQUEST_BASE + 4;
    pub const FAILED_REQUEST: u32 = REQUEST_BASE + 5;
    pub const INTERNAL: u32 = REQUEST_BASE + 99;
}

/// Challenge sent back when a bearer token is rejected
pub const BEARER_CHALLENGE: &str =
    r#"Bearer realm="api-mock", error="invalid_token", error_description="invalid access token""#;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid bearer token")]
    InvalidToken,

    #[error("Mock endpoint not found: {0}")]
    NotFound(String),

    #[error("Method {method} not accepted by mock endpoint {name}")]
    MethodNotAllowed { method: String, name: String },

    #[error("Invalid request body: {message}")]
    InvalidBody { message: String, track_id: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
    /// Track id to cross-reference the failure with the logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
                id: None,
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.error.id = Some(id.into());
        self
    }
}

impl AppError {
    /// Status and JSON body this error is answered with
    pub fn status_and_body(&self) -> (StatusCode, Option<ErrorResponse>) {
        match self {
            // 401s carry no body contract; clients only look at the status
            AppError::Unauthorized | AppError::InvalidToken => (StatusCode::UNAUTHORIZED, None),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Some(ErrorResponse::new(codes::NOT_FOUND, "not found")),
            ),
            // Answered as 404 so that clients cannot tell a wrong method from a wrong path
            AppError::MethodNotAllowed { .. } => (
                StatusCode::NOT_FOUND,
                Some(ErrorResponse::new(
                    codes::METHOD_NOT_ALLOWED,
                    "method not allowed",
                )),
            ),
            AppError::InvalidBody { track_id, .. } => (
                StatusCode::BAD_REQUEST,
                Some(
                    ErrorResponse::new(codes::INVALID_BODY, "body parsing error")
                        .with_id(track_id.as_str()),
                ),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(ErrorResponse::new(codes::INTERNAL, "internal server error")),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(e) = &self {
            tracing::error!(error = %e, "Internal error");
        }

        let mut response = match self.status_and_body() {
            (status, Some(body)) => (status, Json(body)).into_response(),
            (status, None) => status.into_response(),
        };

        if matches!(self, AppError::InvalidToken) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BEARER_CHALLENGE),
            );
        }

        response
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
