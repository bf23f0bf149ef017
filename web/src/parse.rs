//! The parse entry points.
//!
//! Every source has a throwing variant that returns an [`ErrorResponse`]
//! built from [`ParseOptions`], and a safe variant that returns a
//! [`ParseOutcome`] carrying every issue.
//!
//! | Source | Throwing | Safe |
//! |--------|----------|------|
//! | route parameters | [`parse_params`] | [`parse_params_safe`] |
//! | query string | [`parse_query`] | [`parse_query_safe`] |
//! | submitted form | [`parse_form`] | [`parse_form_safe`] |
//!
//! Params and query parsing is synchronous, so schemas with asynchronous
//! transforms are rejected there with an `AsyncRule` issue. Form parsing
//! awaits such transforms.

use crate::error::{BodyError, ErrorResponse, FormError};
use crate::options::ParseOptions;
use crate::source::{FormInput, QueryInput};
use formwise_core::{
    ParseOutcome, Params, Schema, ValidationError, ValidationIssue, validate, validate_async,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

fn reject(source: &'static str, options: &ParseOptions, err: ValidationError) -> ErrorResponse {
    log_rejection(source, &err);
    options.error_response().with_source(err)
}

fn log_rejection(source: &'static str, err: &ValidationError) {
    tracing::debug!(
        source,
        issues = err.issues().len(),
        first_path = %err
            .issues()
            .first()
            .map(ValidationIssue::path_string)
            .unwrap_or_default(),
        "parse rejected"
    );
}

fn outcome<T>(source: &'static str, result: Result<T, ValidationError>) -> ParseOutcome<T> {
    if let Err(err) = &result {
        log_rejection(source, err);
    }
    result.into()
}

fn params_value(params: impl Into<Params>) -> Value {
    params.into().to_json()
}

fn query_value(input: impl Into<QueryInput>, options: &ParseOptions) -> Value {
    let pairs = input.into().into_pairs();
    options.pair_parser().parse_pairs(&pairs).to_json()
}

async fn form_value(input: impl Into<FormInput>, options: &ParseOptions) -> Result<Value, BodyError> {
    let data = input.into().into_form_data(options.max_body_size()).await?;
    Ok(data.normalize(options.pair_parser()))
}

/// Validate route parameters.
///
/// # Errors
///
/// Returns the configured [`ErrorResponse`] when validation fails.
///
/// # Example
///
/// ```
/// use formwise_core::prelude::*;
/// use formwise_web::{ParseOptions, parse_params};
/// use serde::Deserialize;
/// use std::collections::HashMap;
///
/// #[derive(Deserialize)]
/// struct Person {
///     id: String,
///     age: i64,
/// }
///
/// let params: HashMap<String, String> = [("id", "id1"), ("age", "10")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
/// let shape = Shape::new().field("id", string()).field("age", int_as_string());
///
/// let person: Person = parse_params(params, shape, &ParseOptions::default()).unwrap();
/// assert_eq!(person.age, 10);
/// ```
pub fn parse_params<T: DeserializeOwned>(
    params: impl Into<Params>,
    schema: impl Into<Schema>,
    options: &ParseOptions,
) -> Result<T, ErrorResponse> {
    let rule = schema.into().resolve();
    validate(rule.as_ref(), &params_value(params)).map_err(|err| reject("params", options, err))
}

/// Validate route parameters without failing.
pub fn parse_params_safe<T: DeserializeOwned>(
    params: impl Into<Params>,
    schema: impl Into<Schema>,
) -> ParseOutcome<T> {
    let rule = schema.into().resolve();
    outcome("params", validate(rule.as_ref(), &params_value(params)))
}

/// Validate a query string.
///
/// # Errors
///
/// Returns the configured [`ErrorResponse`] when validation fails.
pub fn parse_query<T: DeserializeOwned>(
    input: impl Into<QueryInput>,
    schema: impl Into<Schema>,
    options: &ParseOptions,
) -> Result<T, ErrorResponse> {
    let rule = schema.into().resolve();
    validate(rule.as_ref(), &query_value(input, options))
        .map_err(|err| reject("query", options, err))
}

/// Validate a query string without failing.
pub fn parse_query_safe<T: DeserializeOwned>(
    input: impl Into<QueryInput>,
    schema: impl Into<Schema>,
    options: &ParseOptions,
) -> ParseOutcome<T> {
    let rule = schema.into().resolve();
    outcome("query", validate(rule.as_ref(), &query_value(input, options)))
}

/// Validate a submitted form, reading the request body if needed.
///
/// # Errors
///
/// Returns [`FormError::Body`] when the body cannot be read, and
/// [`FormError::Rejected`] with the configured response when validation fails.
pub async fn parse_form<T: DeserializeOwned>(
    input: impl Into<FormInput>,
    schema: impl Into<Schema>,
    options: &ParseOptions,
) -> Result<T, FormError> {
    let rule = schema.into().resolve();
    let value = form_value(input, options).await?;
    validate_async(rule.as_ref(), &value)
        .await
        .map_err(|err| FormError::Rejected(reject("form", options, err)))
}

/// Validate a submitted form without failing on validation errors.
///
/// # Errors
///
/// Returns [`BodyError`] when the body cannot be read. Validation failures
/// are reported through the outcome.
pub async fn parse_form_safe<T: DeserializeOwned>(
    input: impl Into<FormInput>,
    schema: impl Into<Schema>,
    options: &ParseOptions,
) -> Result<ParseOutcome<T>, BodyError> {
    let rule = schema.into().resolve();
    let value = form_value(input, options).await?;
    Ok(outcome("form", validate_async(rule.as_ref(), &value).await))
}
