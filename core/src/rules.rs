//! Primitive rules: strings, numbers, booleans, literals, lists and files.
//!
//! Constructors are free functions so schemas read like a declaration:
//!
//! ```
//! use formwise_core::rules::{array, string};
//! use formwise_core::rule::{Rule, RuleExt};
//! use serde_json::json;
//!
//! let name = string().min_len(2);
//! let tags = array(string()).accept_single().optional();
//!
//! assert!(name.parse(Some(&json!("Al"))).is_ok());
//! assert_eq!(tags.parse(Some(&json!("rust"))).unwrap(), json!(["rust"]));
//! ```

use crate::error::{IssueCode, ValidationError, ValidationIssue};
use crate::rule::{Rule, RuleResult, required};
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Value;

/// Name of the JSON type of `value`, used in type-mismatch messages.
pub(crate) const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn invalid_type(expected: &str, received: &Value) -> ValidationError {
    ValidationError::single(
        IssueCode::InvalidType,
        format!("Expected {expected}, received {}", type_name(received)),
    )
}

/// Extract a string or report why the input is not one.
pub(crate) fn expect_str(input: Option<&Value>) -> Result<&str, ValidationError> {
    match input {
        None => Err(required()),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(invalid_type("string", other)),
    }
}

/// A string, optionally constrained by length and patterns.
#[derive(Debug, Clone, Default)]
pub struct StringRule {
    min_len: Option<usize>,
    max_len: Option<usize>,
    patterns: Vec<(Regex, String)>,
}

/// Accept any string.
#[must_use]
pub fn string() -> StringRule {
    StringRule::default()
}

impl StringRule {
    /// Require at least `len` characters.
    #[must_use]
    pub const fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    /// Allow at most `len` characters.
    #[must_use]
    pub const fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    /// Require a match of `pattern`, reporting `message` otherwise.
    #[must_use]
    pub fn regex(mut self, pattern: Regex, message: impl Into<String>) -> Self {
        self.patterns.push((pattern, message.into()));
        self
    }
}

impl Rule for StringRule {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let s = expect_str(input)?;
        let chars = s.chars().count();
        let mut issues = Vec::new();

        if let Some(min) = self.min_len {
            if chars < min {
                issues.push(ValidationIssue::new(
                    IssueCode::TooSmall,
                    format!("String must contain at least {min} character(s)"),
                ));
            }
        }
        if let Some(max) = self.max_len {
            if chars > max {
                issues.push(ValidationIssue::new(
                    IssueCode::TooBig,
                    format!("String must contain at most {max} character(s)"),
                ));
            }
        }
        for (pattern, message) in &self.patterns {
            if !pattern.is_match(s) {
                issues.push(ValidationIssue::new(IssueCode::InvalidString, message.clone()));
            }
        }

        ValidationError::from_issues(issues).map_or_else(|| Ok(Value::String(s.to_string())), Err)
    }
}

/// A JSON number.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberRule;

/// Accept any JSON number.
#[must_use]
pub const fn number() -> NumberRule {
    NumberRule
}

impl Rule for NumberRule {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        match input {
            None => Err(required()),
            Some(value @ Value::Number(_)) => Ok(value.clone()),
            Some(other) => Err(invalid_type("number", other)),
        }
    }
}

/// A JSON boolean.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanRule;

/// Accept `true` or `false`.
#[must_use]
pub const fn boolean() -> BooleanRule {
    BooleanRule
}

impl Rule for BooleanRule {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        match input {
            None => Err(required()),
            Some(value @ Value::Bool(_)) => Ok(value.clone()),
            Some(other) => Err(invalid_type("boolean", other)),
        }
    }
}

/// Exactly one string value.
#[derive(Debug, Clone)]
pub struct LiteralRule {
    expected: String,
}

/// Accept only the string `expected`.
pub fn literal(expected: impl Into<String>) -> LiteralRule {
    LiteralRule {
        expected: expected.into(),
    }
}

impl Rule for LiteralRule {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let s = expect_str(input)?;
        if s == self.expected {
            Ok(Value::String(s.to_string()))
        } else {
            Err(ValidationError::single(
                IssueCode::InvalidLiteral,
                format!("Invalid literal value, expected \"{}\"", self.expected),
            ))
        }
    }
}

/// Any present value, passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyRule;

/// Accept any present value.
#[must_use]
pub const fn any() -> AnyRule {
    AnyRule
}

impl Rule for AnyRule {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        input.cloned().ok_or_else(required)
    }
}

/// A list whose elements all satisfy an item rule.
#[derive(Debug, Clone)]
pub struct ArrayRule<R> {
    item: R,
    accept_single: bool,
    min_items: Option<usize>,
}

/// Accept a list of values matching `item`.
///
/// A lone scalar is rejected unless [`ArrayRule::accept_single`] is set: a
/// key submitted once normalizes to a plain string, not a one-element list.
pub const fn array<R: Rule>(item: R) -> ArrayRule<R> {
    ArrayRule {
        item,
        accept_single: false,
        min_items: None,
    }
}

impl<R: Rule> ArrayRule<R> {
    /// Treat a lone non-list value as a one-element list.
    #[must_use]
    pub const fn accept_single(mut self) -> Self {
        self.accept_single = true;
        self
    }

    /// Require at least `count` elements.
    #[must_use]
    pub const fn min_items(mut self, count: usize) -> Self {
        self.min_items = Some(count);
        self
    }

    fn elements<'v>(&self, input: Option<&'v Value>) -> Result<Vec<&'v Value>, ValidationError> {
        let elements: Vec<&Value> = match input {
            None => return Err(required()),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(other) if self.accept_single && !other.is_null() => vec![other],
            Some(other) => return Err(invalid_type("array", other)),
        };
        if let Some(min) = self.min_items {
            if elements.len() < min {
                return Err(ValidationError::single(
                    IssueCode::TooSmall,
                    format!("Array must contain at least {min} element(s)"),
                ));
            }
        }
        Ok(elements)
    }
}

impl<R: Rule> Rule for ArrayRule<R> {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let elements = self.elements(input)?;
        let mut output = Vec::with_capacity(elements.len());
        let mut errors: Option<ValidationError> = None;

        for (index, element) in elements.into_iter().enumerate() {
            match self.item.parse(Some(element)) {
                Ok(value) => output.push(value),
                Err(err) => merge(&mut errors, err.at(index)),
            }
        }

        errors.map_or(Ok(Value::Array(output)), Err)
    }

    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        Box::pin(async move {
            let elements = self.elements(input)?;
            let mut output = Vec::with_capacity(elements.len());
            let mut errors: Option<ValidationError> = None;

            for (index, element) in elements.into_iter().enumerate() {
                match self.item.parse_async(Some(element)).await {
                    Ok(value) => output.push(value),
                    Err(err) => merge(&mut errors, err.at(index)),
                }
            }

            errors.map_or(Ok(Value::Array(output)), Err)
        })
    }

    fn is_async(&self) -> bool {
        self.item.is_async()
    }
}

pub(crate) fn merge(acc: &mut Option<ValidationError>, err: ValidationError) {
    match acc {
        Some(existing) => existing.extend(err),
        None => *acc = Some(err),
    }
}

/// An uploaded file, as produced by multipart form parsing.
///
/// Files are carried as JSON objects whose `bytes` member is the base64
/// encoded contents, so this rule checks that shape.
#[derive(Debug, Clone, Default)]
pub struct FileRule {
    content_type_prefix: Option<String>,
}

/// Accept an uploaded file.
#[must_use]
pub fn file() -> FileRule {
    FileRule::default()
}

impl FileRule {
    /// Require the declared content type to start with `prefix` (e.g. `image/`).
    #[must_use]
    pub fn content_type(mut self, prefix: impl Into<String>) -> Self {
        self.content_type_prefix = Some(prefix.into());
        self
    }
}

impl Rule for FileRule {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let value = input.ok_or_else(required)?;
        let Some(object) = value
            .as_object()
            .filter(|o| o.get("bytes").is_some_and(Value::is_string))
        else {
            return Err(invalid_type("file", value));
        };

        if let Some(prefix) = &self.content_type_prefix {
            let declared = object
                .get("content_type")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if !declared.starts_with(prefix.as_str()) {
                return Err(ValidationError::single(
                    IssueCode::InvalidType,
                    format!("Expected a file of type {prefix}*"),
                ));
            }
        }
        Ok(value.clone())
    }
}

/// A rule backed by a plain function.
pub struct CustomRule<F> {
    check: F,
}

/// Build a rule from `check`; an `Err(message)` becomes a custom issue.
pub fn custom<F>(check: F) -> CustomRule<F>
where
    F: Fn(Option<&Value>) -> Result<Value, String> + Send + Sync,
{
    CustomRule { check }
}

impl<F> Rule for CustomRule<F>
where
    F: Fn(Option<&Value>) -> Result<Value, String> + Send + Sync,
{
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        (self.check)(input).map_err(|message| ValidationError::single(IssueCode::Custom, message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rule::RuleExt;
    use serde_json::json;

    #[test]
    fn test_string_accepts_strings_only() {
        assert_eq!(string().parse(Some(&json!("a"))).unwrap(), json!("a"));

        let err = string().parse(Some(&json!(3))).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::InvalidType);
        assert_eq!(err.issues()[0].message, "Expected string, received number");

        let err = string().parse(None).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::Required);
    }

    #[test]
    fn test_string_reports_every_failed_constraint() {
        let rule = string()
            .min_len(8)
            .regex(Regex::new(r"\d").unwrap(), "Must contain a digit");
        let err = rule.parse(Some(&json!("abc"))).unwrap_err();

        let codes: Vec<_> = err.issues().iter().map(|i| i.code).collect();
        assert_eq!(codes, vec![IssueCode::TooSmall, IssueCode::InvalidString]);
    }

    #[test]
    fn test_string_length_counts_chars() {
        assert!(string().max_len(2).parse(Some(&json!("éé"))).is_ok());
    }

    #[test]
    fn test_literal() {
        assert!(literal("on").parse(Some(&json!("on"))).is_ok());
        let err = literal("on").parse(Some(&json!("off"))).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::InvalidLiteral);
    }

    #[test]
    fn test_array_rejects_lone_scalar_by_default() {
        let err = array(string()).parse(Some(&json!("a"))).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::InvalidType);
    }

    #[test]
    fn test_array_accept_single_wraps_scalar() {
        let rule = array(string()).accept_single();
        assert_eq!(rule.parse(Some(&json!("a"))).unwrap(), json!(["a"]));
        assert_eq!(rule.parse(Some(&json!(["a", "b"]))).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_array_item_issues_carry_index() {
        let err = array(string())
            .parse(Some(&json!(["a", 1, "b", false])))
            .unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|i| i.path_string()).collect();
        assert_eq!(paths, vec!["1", "3"]);
    }

    #[test]
    fn test_array_min_items() {
        let rule = array(string()).min_items(2);
        assert!(rule.parse(Some(&json!(["a"]))).is_err());
        assert!(rule.parse(Some(&json!(["a", "b"]))).is_ok());
    }

    #[test]
    fn test_file_rule_checks_shape_and_type() {
        let upload = json!({
            "file_name": "cat.jpeg",
            "content_type": "image/jpeg",
            "bytes": "AQID"
        });
        assert!(file().parse(Some(&upload)).is_ok());
        assert!(file().content_type("image/").parse(Some(&upload)).is_ok());
        assert!(file().content_type("text/").parse(Some(&upload)).is_err());
        assert!(file().parse(Some(&json!("cat.jpeg"))).is_err());
        assert!(file().parse(Some(&json!({ "file_name": "a", "bytes": [1, 2] }))).is_err());
    }

    #[test]
    fn test_custom_rule() {
        let even = custom(|input| match input.and_then(Value::as_i64) {
            Some(n) if n % 2 == 0 => Ok(json!(n)),
            _ => Err("Must be even".to_string()),
        });
        assert!(even.parse(Some(&json!(4))).is_ok());
        assert_eq!(
            even.parse(Some(&json!(3))).unwrap_err().issues()[0].message,
            "Must be even"
        );
    }

    #[test]
    fn test_optional_number_and_boolean() {
        assert_eq!(number().optional().parse(None).unwrap(), Value::Null);
        assert!(boolean().parse(Some(&json!("true"))).is_err());
        assert!(any().parse(Some(&json!({"a": 1}))).is_ok());
    }
}
