//! Error handling for deployments
//!
//! Construction errors ([`DeployError`]), structured HTTP error bodies
//! ([`ErrorResponse`]) and the request-id middleware that tags every
//! response for tracing.

use crate::config::ConfigError;
use axum::{
    extract::Request,
    http::{
        StatusCode,
        header::{HeaderName, HeaderValue},
    },
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use outpost_core::{FailureReason, MountError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised while constructing a [`Deployment`](crate::Deployment)
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Mount(#[from] MountError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("route {path} collides with a documentation route")]
    RouteConflict { path: String },
}

impl DeployError {
    /// Whether the component variant cannot be deployed at all.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DeployError::Mount(err) if err.is_unsupported())
    }
}

static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Maximum length for client-provided request IDs
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// Request ID stored in request extensions by [`request_id_middleware`]
#[derive(Debug, Clone)]
pub struct RequestIdExtension(pub String);

/// Client-provided request IDs are limited to alphanumerics, `-` and `_`
/// so they cannot inject structure into log lines.
fn validate_request_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_REQUEST_ID_LENGTH
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Middleware that propagates or generates an `X-Request-ID`
///
/// A valid incoming header is reused, otherwise a UUID is generated. The ID
/// is stored in request extensions and echoed on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| validate_request_id(s))
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestIdExtension(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), header_value);
    }

    response
}

/// Machine-readable error codes of HTTP error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request body is not valid JSON
    InvalidJson,
    /// The callable rejected its input
    InvalidInput,
    /// The callable could not find a resource
    NotFound,
    /// The callable refused the operation
    PermissionDenied,
    /// The callable timed out
    Timeout,
    /// The callable failed unexpectedly
    InternalError,
    /// The callable failed with its own category
    CallableFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidJson => "invalid_json",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::NotFound => "not_found",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::Timeout => "timeout",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::CallableFailed => "callable_failed",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidJson => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::InternalError | ErrorCode::CallableFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error response for HTTP APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional context or details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Request ID for tracking and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// When the error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorResponse {
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            details: None,
            request_id: None,
            timestamp: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<&RequestIdExtension>) -> Self {
        self.request_id = request_id.map(|id| id.0.clone());
        self
    }
}

impl From<&FailureReason> for ErrorResponse {
    fn from(reason: &FailureReason) -> Self {
        let code = match reason {
            FailureReason::InvalidInput { .. } => ErrorCode::InvalidInput,
            FailureReason::NotFound { .. } => ErrorCode::NotFound,
            FailureReason::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            FailureReason::Timeout { .. } => ErrorCode::Timeout,
            FailureReason::InternalError { .. } => ErrorCode::InternalError,
            FailureReason::Custom { .. } => ErrorCode::CallableFailed,
        };
        let response = ErrorResponse::new(code, reason.message());
        match reason {
            FailureReason::Custom { category, .. } => {
                response.with_details(serde_json::json!({ "category": category }))
            }
            _ => response,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status_code = self.error.status_code();
        if status_code.is_server_error() {
            tracing::error!(
                error_code = %self.error,
                request_id = self.request_id.as_deref().unwrap_or("-"),
                status_code = %status_code,
                error_message = %self.message,
                "Request failed"
            );
        } else {
            tracing::debug!(
                error_code = %self.error,
                request_id = self.request_id.as_deref().unwrap_or("-"),
                status_code = %status_code,
                "Request rejected"
            );
        }
        (status_code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_validation() {
        assert!(validate_request_id("abc-123_DEF"));
        assert!(!validate_request_id(""));
        assert!(!validate_request_id("key:value"));
        assert!(!validate_request_id("line\nbreak"));
        assert!(!validate_request_id(&"a".repeat(MAX_REQUEST_ID_LENGTH + 1)));
    }

    #[test]
    fn failure_reasons_map_to_status_codes() {
        let cases = [
            (
                FailureReason::InvalidInput {
                    message: "x".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                FailureReason::NotFound {
                    resource: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                FailureReason::PermissionDenied {
                    message: "x".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                FailureReason::Timeout {
                    operation: "x".into(),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                FailureReason::InternalError {
                    message: "x".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (reason, status) in cases {
            assert_eq!(ErrorResponse::from(&reason).error.status_code(), status);
        }
    }

    #[test]
    fn custom_failure_keeps_category() {
        let reason = FailureReason::Custom {
            category: "quota".into(),
            message: "exhausted".into(),
        };
        let response = ErrorResponse::from(&reason);
        assert_eq!(response.error, ErrorCode::CallableFailed);
        assert_eq!(response.message, "quota: exhausted");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "category": "quota" }))
        );
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let json = serde_json::to_value(ErrorResponse::new(ErrorCode::InvalidJson, "bad")).unwrap();
        assert_eq!(json["error"], "invalid_json");
        assert_eq!(json["message"], "bad");
        assert!(json.get("details").is_none());
        assert!(json.get("request_id").is_none());
    }

    #[test]
    fn request_id_is_carried_into_the_body() {
        let id = RequestIdExtension("req-7".into());
        let json = serde_json::to_value(
            ErrorResponse::new(ErrorCode::NotFound, "gone").with_request_id(Some(&id)),
        )
        .unwrap();
        assert_eq!(json["request_id"], "req-7");
    }
}
