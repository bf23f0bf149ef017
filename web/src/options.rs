//! Per-call configuration for the parse entry points.

use crate::error::{DEFAULT_ERROR_MESSAGE, DEFAULT_ERROR_STATUS, ErrorResponse};
use axum::http::StatusCode;
use formwise_core::params::{DefaultParser, PairParser};
use std::fmt;
use std::sync::Arc;

/// Default cap on url-encoded form bodies (2 MiB, matching axum's default).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Options recognized by every entry point.
///
/// # Default Values
///
/// - `message`: `"Bad Request"`
/// - `status`: 400
/// - `parser`: [`DefaultParser`]
/// - `body_limit`: 2 MiB
///
/// # Example
///
/// ```
/// use axum::http::StatusCode;
/// use formwise_core::BracketArrayParser;
/// use formwise_web::ParseOptions;
///
/// let options = ParseOptions::new()
///     .message("Invalid search")
///     .status(StatusCode::UNPROCESSABLE_ENTITY)
///     .parser(BracketArrayParser);
/// assert_eq!(options.error_response().message(), "Invalid search");
/// ```
#[derive(Clone)]
pub struct ParseOptions {
    message: Option<String>,
    status: Option<StatusCode>,
    parser: Arc<dyn PairParser>,
    body_limit: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            message: None,
            status: None,
            parser: Arc::new(DefaultParser),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ParseOptions {
    /// Create options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Message of the rejection response. An empty message keeps the default.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Status of the rejection response.
    #[must_use]
    pub const fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace the key/value normalizer.
    #[must_use]
    pub fn parser(mut self, parser: impl PairParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Maximum size of a url-encoded form body, in bytes.
    ///
    /// Multipart bodies are limited by axum's `DefaultBodyLimit` instead.
    #[must_use]
    pub const fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// The configured normalizer.
    #[must_use]
    pub fn pair_parser(&self) -> &dyn PairParser {
        self.parser.as_ref()
    }

    /// The configured body limit.
    #[must_use]
    pub const fn max_body_size(&self) -> usize {
        self.body_limit
    }

    /// Build the response a throwing entry point returns on failure.
    #[must_use]
    pub fn error_response(&self) -> ErrorResponse {
        let message = self
            .message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_ERROR_MESSAGE);
        ErrorResponse::new(self.status.unwrap_or(DEFAULT_ERROR_STATUS), message.to_string())
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("message", &self.message)
            .field("status", &self.status)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}
