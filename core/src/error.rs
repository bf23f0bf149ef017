//! Validation issues and the error type that carries them.
//!
//! A failed parse never stops at the first problem: every rule reports all of
//! the issues it finds, and object schemas concatenate the issues of their
//! fields in declaration order. Each issue carries the path of the offending
//! value so callers can present errors next to the matching form field.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One step in the path to an offending value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// A position inside a list.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Machine-readable category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// A required value was absent.
    Required,
    /// The value had the wrong JSON type.
    InvalidType,
    /// A string did not match a required pattern.
    InvalidString,
    /// The value did not equal the expected literal.
    InvalidLiteral,
    /// A string or list was shorter than allowed.
    TooSmall,
    /// A string or list was longer than allowed.
    TooBig,
    /// A date string could not be parsed.
    InvalidDate,
    /// A numeric string could not be represented.
    InvalidNumber,
    /// A custom check or refinement failed.
    Custom,
    /// An asynchronous rule was reached through a synchronous parse.
    AsyncRule,
    /// The validated output did not fit the requested Rust type.
    Deserialize,
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Location of the offending value; empty for the root.
    pub path: Vec<PathSegment>,
    /// Category of the problem.
    pub code: IssueCode,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Create an issue at the root path.
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            code,
            message: message.into(),
        }
    }

    /// Dotted rendering of the path (`friends.1`), empty for the root.
    #[must_use]
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}

/// An ordered, non-empty list of validation issues.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{}", summarize(.issues))]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Create an error holding a single root-level issue.
    pub fn single(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue::new(code, message)],
        }
    }

    /// Create an error from a list of issues, or `None` when the list is empty.
    #[must_use]
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self { issues })
        }
    }

    /// The issues, in the order they were found.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume the error, returning its issues.
    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Prefix every issue path with `segment`.
    #[must_use]
    pub fn at(mut self, segment: impl Into<PathSegment>) -> Self {
        let segment = segment.into();
        for issue in &mut self.issues {
            issue.path.insert(0, segment.clone());
        }
        self
    }

    /// Replace every issue message with `message`.
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        for issue in &mut self.issues {
            issue.message = message.to_string();
        }
        self
    }

    /// Append the issues of `other`.
    pub fn extend(&mut self, other: Self) {
        self.issues.extend(other.issues);
    }

    /// Messages grouped by the first key of each issue path.
    ///
    /// Issues without a leading key are omitted; see [`Self::form_errors`].
    #[must_use]
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for issue in &self.issues {
            if let Some(PathSegment::Key(key)) = issue.path.first() {
                fields
                    .entry(key.clone())
                    .or_default()
                    .push(issue.message.clone());
            }
        }
        fields
    }

    /// Messages of issues that are not tied to a named field.
    #[must_use]
    pub fn form_errors(&self) -> Vec<String> {
        self.issues
            .iter()
            .filter(|issue| !matches!(issue.path.first(), Some(PathSegment::Key(_))))
            .map(|issue| issue.message.clone())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_at_prefixes_every_issue() {
        let mut err = ValidationError::single(IssueCode::Required, "Required");
        err.extend(ValidationError::single(IssueCode::InvalidType, "Expected string").at(1));
        let err = err.at("friends");

        assert_eq!(err.issues()[0].path_string(), "friends");
        assert_eq!(err.issues()[1].path_string(), "friends.1");
    }

    #[test]
    fn test_from_issues_requires_at_least_one() {
        assert!(ValidationError::from_issues(Vec::new()).is_none());

        let err = ValidationError::from_issues(vec![ValidationIssue::new(
            IssueCode::TooSmall,
            "Too short",
        )])
        .unwrap();
        assert_eq!(err.issues().len(), 1);
    }

    #[test]
    fn test_display_joins_issues() {
        let mut err = ValidationError::single(IssueCode::Required, "Required").at("id");
        err.extend(ValidationError::single(IssueCode::Custom, "Passwords differ"));

        assert_eq!(err.to_string(), "id: Required; Passwords differ");
    }

    #[test]
    fn test_field_and_form_errors() {
        let mut err = ValidationError::single(IssueCode::Required, "Required").at("age");
        err.extend(ValidationError::single(IssueCode::TooSmall, "Too short").at("age"));
        err.extend(ValidationError::single(IssueCode::Custom, "Mismatch"));

        let fields = err.field_errors();
        assert_eq!(fields["age"], vec!["Required", "Too short"]);
        assert_eq!(err.form_errors(), vec!["Mismatch"]);
    }

    #[test]
    fn test_with_message_overrides_all() {
        let err = ValidationError::single(IssueCode::InvalidString, "Invalid")
            .at("age")
            .with_message("Age must be a number");

        assert_eq!(err.issues()[0].message, "Age must be a number");
        assert_eq!(err.issues()[0].path_string(), "age");
    }
}
