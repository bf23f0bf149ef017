//! Axum integration for formwise.
//!
//! Validate route parameters, query strings and submitted forms against a
//! formwise schema and get typed data back.
//!
//! # Request Flow
//!
//! 1. **Adapt** the source into ordered key/value pairs (reading the body
//!    once for forms)
//! 2. **Normalize** the pairs with the configured [`PairParser`](formwise_core::PairParser)
//! 3. **Validate** the normalized object against the schema
//! 4. **Deserialize** the validated output into the caller's type
//! 5. **Reject** with an [`ErrorResponse`] (throwing variants) or return a
//!    [`ParseOutcome`](formwise_core::ParseOutcome) (safe variants)
//!
//! # Example
//!
//! ```ignore
//! use axum::{Json, Router, extract::{Path, Request}, routing::{get, post}};
//! use formwise_core::prelude::*;
//! use formwise_web::{ErrorResponse, FormError, ParseOptions, parse_form, parse_params};
//!
//! async fn show(Path(params): Path<HashMap<String, String>>) -> Result<Json<Post>, ErrorResponse> {
//!     let shape = Shape::new().field("postId", int_as_string());
//!     let PostParams { post_id } = parse_params(params, shape, &ParseOptions::default())?;
//!     Ok(Json(load(post_id)))
//! }
//!
//! async fn create(request: Request) -> Result<Json<Post>, FormError> {
//!     let shape = Shape::new()
//!         .field("title", string().min_len(1))
//!         .field("published", checkbox_as_string());
//!     let form: NewPost = parse_form(request, shape, &ParseOptions::default()).await?;
//!     Ok(Json(save(form)))
//! }
//!
//! let app = Router::new()
//!     .route("/posts/:postId", get(show))
//!     .route("/posts", post(create));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod options;
pub mod parse;
pub mod source;

// Re-export key types for convenience
pub use error::{BodyError, ErrorResponse, FormError};
pub use options::{DEFAULT_BODY_LIMIT, ParseOptions};
pub use parse::{
    parse_form, parse_form_safe, parse_params, parse_params_safe, parse_query, parse_query_safe,
};
pub use source::{FormData, FormFile, FormInput, FormValue, QueryInput, SearchParams, read_form};

/// Result type alias for handlers that parse params or queries.
pub type ParseResult<T> = Result<T, ErrorResponse>;
