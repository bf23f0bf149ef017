//! Error types for the parse entry points.
//!
//! This module defines the errors that bridge between validation failures
//! and HTTP responses, implementing Axum's `IntoResponse` trait so handlers
//! can return them with `?`.
//!
//! - [`ErrorResponse`]: a rejected payload (status + message). The per-field
//!   detail is kept as the error source for logging but never sent.
//! - [`BodyError`]: the form body could not be read or decoded.
//! - [`FormError`]: either of the above, returned by `parse_form`.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use formwise_core::ValidationError;
use std::fmt;
use thiserror::Error;

/// Message used when no override is configured.
pub const DEFAULT_ERROR_MESSAGE: &str = "Bad Request";

/// Status used when no override is configured.
pub const DEFAULT_ERROR_STATUS: StatusCode = StatusCode::BAD_REQUEST;

/// Response produced when a throwing entry point rejects its input.
///
/// # Examples
///
/// ```ignore
/// async fn handler(Path(params): Path<HashMap<String, String>>) -> Result<Json<Post>, ErrorResponse> {
///     let post: PostParams = parse_params(params, shape, &ParseOptions::default())?;
///     Ok(Json(load(post.id)))
/// }
/// ```
#[derive(Debug)]
pub struct ErrorResponse {
    /// HTTP status code
    status: StatusCode,
    /// Message (user-facing, sent as the JSON body)
    message: String,
    /// Validation detail (for logging, not exposed to client)
    source: Option<ValidationError>,
}

impl ErrorResponse {
    /// Create a new error response.
    #[must_use]
    pub const fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            source: None,
        }
    }

    /// Create a 400 Bad Request response.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into())
    }

    /// Attach the validation error that caused the rejection.
    #[must_use]
    pub fn with_source(mut self, source: ValidationError) -> Self {
        self.source = Some(source);
        self
    }

    /// The HTTP status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The validation error behind this response, if any.
    #[must_use]
    pub const fn validation_error(&self) -> Option<&ValidationError> {
        self.source.as_ref()
    }
}

impl Default for ErrorResponse {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_STATUS, DEFAULT_ERROR_MESSAGE.to_string())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ErrorResponse {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.message)).into_response()
    }
}

/// The request body could not be turned into form data.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The `Content-Type` is neither url-encoded nor multipart.
    #[error("Unsupported form content type: {0:?}")]
    UnsupportedContentType(String),

    /// Reading the body failed or exceeded the limit.
    #[error("Failed to read request body: {0}")]
    Read(#[source] axum::Error),

    /// The multipart boundary was missing or invalid.
    #[error("Invalid multipart request: {0}")]
    MultipartRejected(#[from] MultipartRejection),

    /// A multipart field could not be read.
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

impl BodyError {
    /// The status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Read(_) | Self::MultipartRejected(_) | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status(), error = %self, "Unreadable form body");
        (self.status(), Json(self.to_string())).into_response()
    }
}

/// Failure of a throwing form parse.
#[derive(Debug, Error)]
pub enum FormError {
    /// The form was read but failed validation.
    #[error(transparent)]
    Rejected(#[from] ErrorResponse),

    /// The form could not be read.
    #[error(transparent)]
    Body(#[from] BodyError),
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(err) => err.into_response(),
            Self::Body(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use formwise_core::IssueCode;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = ErrorResponse::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[400] Invalid input");
    }

    #[test]
    fn test_default_is_bad_request() {
        let err = ErrorResponse::default();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Bad Request");
    }

    #[test]
    fn test_source_is_kept_for_logging() {
        let validation = ValidationError::single(IssueCode::Required, "Required").at("id");
        let err = ErrorResponse::default().with_source(validation.clone());

        assert_eq!(err.validation_error(), Some(&validation));
        assert_eq!(err.source().unwrap().to_string(), "id: Required");
    }

    #[tokio::test]
    async fn test_response_body_is_message_only() {
        let validation = ValidationError::single(IssueCode::Required, "Required").at("id");
        let response = ErrorResponse::new(StatusCode::UNPROCESSABLE_ENTITY, "Nope".to_string())
            .with_source(validation)
            .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#""Nope""#);
    }

    #[test]
    fn test_body_error_status() {
        let err = BodyError::UnsupportedContentType("text/plain".to_string());
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            FormError::from(err).to_string(),
            "Unsupported form content type: \"text/plain\""
        );
    }
}
