//! Running a rule against input and producing typed output.

use crate::error::{IssueCode, ValidationError};
use crate::rule::Rule;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Result of a non-throwing parse.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// Validation passed.
    Success(T),
    /// Validation failed; carries every issue.
    Failure(ValidationError),
}

impl<T> ParseOutcome<T> {
    /// Whether validation passed.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The data, if validation passed.
    pub fn data(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// The error, if validation failed.
    pub const fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }

    /// Convert into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the validation error if validation failed.
    pub fn into_result(self) -> Result<T, ValidationError> {
        self.into()
    }
}

impl<T> From<Result<T, ValidationError>> for ParseOutcome<T> {
    fn from(result: Result<T, ValidationError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(err) => Self::Failure(err),
        }
    }
}

impl<T> From<ParseOutcome<T>> for Result<T, ValidationError> {
    fn from(outcome: ParseOutcome<T>) -> Self {
        match outcome {
            ParseOutcome::Success(data) => Ok(data),
            ParseOutcome::Failure(err) => Err(err),
        }
    }
}

fn deserialize<T: DeserializeOwned>(value: Value) -> Result<T, ValidationError> {
    serde_json::from_value(value)
        .map_err(|err| ValidationError::single(IssueCode::Deserialize, err.to_string()))
}

/// Validate `input` synchronously and deserialize the output into `T`.
///
/// # Errors
///
/// Returns the rule's issues, or a [`IssueCode::Deserialize`] issue when the
/// validated output does not fit `T`.
pub fn validate<T, R>(rule: &R, input: &Value) -> Result<T, ValidationError>
where
    T: DeserializeOwned,
    R: Rule + ?Sized,
{
    deserialize(rule.parse(Some(input))?)
}

/// Validate `input`, awaiting asynchronous rules, and deserialize into `T`.
///
/// # Errors
///
/// Same as [`validate`].
pub async fn validate_async<T, R>(rule: &R, input: &Value) -> Result<T, ValidationError>
where
    T: DeserializeOwned,
    R: Rule + ?Sized,
{
    deserialize(rule.parse_async(Some(input)).await?)
}
