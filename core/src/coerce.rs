//! Rules that turn submitted strings into typed values.
//!
//! Everything that arrives through a query string or a url-encoded form is a
//! string. These rules accept the string spelling of a value and emit the
//! typed JSON value, so a schema field declared with [`int_as_string`] yields a
//! JSON number that deserializes straight into an `i64`.
//!
//! | Rule | Accepts | Produces |
//! |------|---------|----------|
//! | [`int_as_string`] | `^-?[0-9]+$` | integer |
//! | [`num_as_string`] | `^-?[0-9]*\.?[0-9]+$` | float |
//! | [`bool_as_string`] | `"true"` / `"false"` | boolean |
//! | [`checkbox_as_string`] | the true token (default `"on"`) or absence | boolean |
//! | [`date_as_string`] | ISO 8601 / RFC 3339 / RFC 2822 dates | RFC 3339 UTC timestamp |
//!
//! Each rule is produced by a factory so its failure message (and, for
//! checkboxes, the true token) can be configured per use. The `*_AS_STRING`
//! constants are the default-configured instances.
//!
//! # Example
//!
//! ```
//! use formwise_core::coerce::{checkbox_as_string, int_as_string};
//! use formwise_core::rule::Rule;
//! use serde_json::json;
//!
//! assert_eq!(int_as_string().parse(Some(&json!("-3"))).unwrap(), json!(-3));
//! assert_eq!(checkbox_as_string().parse(None).unwrap(), json!(false));
//! assert_eq!(
//!     checkbox_as_string().true_value("yes").parse(Some(&json!("yes"))).unwrap(),
//!     json!(true)
//! );
//! ```

use crate::error::{IssueCode, ValidationError};
use crate::rule::{Rule, RuleResult};
use crate::rules::{expect_str, invalid_type};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static INT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+$").expect("literal pattern"));

#[allow(clippy::expect_used)]
static NUM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]*\.?[0-9]+$").expect("literal pattern"));

#[allow(clippy::expect_used)]
static BOOL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(true|false)$").expect("literal pattern"));

fn pattern_error(message: &str) -> ValidationError {
    ValidationError::single(IssueCode::InvalidString, message)
}

/// Integer spelled as a string.
#[derive(Debug, Clone)]
pub struct IntAsString {
    message: Cow<'static, str>,
}

/// Default-configured [`IntAsString`].
pub const INT_AS_STRING: IntAsString = IntAsString::new();

impl IntAsString {
    /// Create the rule with the default message.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            message: Cow::Borrowed("Must be an integer string"),
        }
    }

    /// Use `message` when the string is not an integer.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for IntAsString {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer-as-string rule: `"3"`, `"03"` and `"-3"` pass; `3`, `"3.14"` and `"a3"` fail.
#[must_use]
pub const fn int_as_string() -> IntAsString {
    IntAsString::new()
}

impl Rule for IntAsString {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let s = expect_str(input)?;
        if !INT_PATTERN.is_match(s) {
            return Err(pattern_error(&self.message));
        }
        s.parse::<i64>().map(Value::from).map_err(|_| {
            ValidationError::single(IssueCode::InvalidNumber, "Integer is out of range")
        })
    }
}

/// Number spelled as a string.
#[derive(Debug, Clone)]
pub struct NumAsString {
    message: Cow<'static, str>,
}

/// Default-configured [`NumAsString`].
pub const NUM_AS_STRING: NumAsString = NumAsString::new();

impl NumAsString {
    /// Create the rule with the default message.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            message: Cow::Borrowed("Must be a number string"),
        }
    }

    /// Use `message` when the string is not a number.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for NumAsString {
    fn default() -> Self {
        Self::new()
    }
}

/// Number-as-string rule producing a float.
#[must_use]
pub const fn num_as_string() -> NumAsString {
    NumAsString::new()
}

impl Rule for NumAsString {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let s = expect_str(input)?;
        if !NUM_PATTERN.is_match(s) {
            return Err(pattern_error(&self.message));
        }
        s.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| ValidationError::single(IssueCode::InvalidNumber, "Number is out of range"))
    }
}

/// Boolean spelled as `"true"` or `"false"`.
#[derive(Debug, Clone)]
pub struct BoolAsString {
    message: Cow<'static, str>,
}

/// Default-configured [`BoolAsString`].
pub const BOOL_AS_STRING: BoolAsString = BoolAsString::new();

impl BoolAsString {
    /// Create the rule with the default message.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            message: Cow::Borrowed("Must be a boolean string (\"true\" or \"false\")"),
        }
    }

    /// Use `message` when the string is neither `"true"` nor `"false"`.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for BoolAsString {
    fn default() -> Self {
        Self::new()
    }
}

/// Boolean-as-string rule, for `<input type="hidden" value="true">`.
#[must_use]
pub const fn bool_as_string() -> BoolAsString {
    BoolAsString::new()
}

impl Rule for BoolAsString {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let s = expect_str(input)?;
        if BOOL_PATTERN.is_match(s) {
            Ok(Value::Bool(s == "true"))
        } else {
            Err(pattern_error(&self.message))
        }
    }
}

/// HTML checkbox: the true token when checked, absent when not.
#[derive(Debug, Clone)]
pub struct CheckboxAsString {
    true_value: Cow<'static, str>,
    message: Option<Cow<'static, str>>,
}

/// Default-configured [`CheckboxAsString`] (true token `"on"`).
pub const CHECKBOX_AS_STRING: CheckboxAsString = CheckboxAsString::new();

impl CheckboxAsString {
    /// Create the rule with the browser default token `"on"`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            true_value: Cow::Borrowed("on"),
            message: None,
        }
    }

    /// Treat `token` as the checked value, for `<input type="checkbox" value="...">`.
    #[must_use]
    pub fn true_value(mut self, token: impl Into<Cow<'static, str>>) -> Self {
        self.true_value = token.into();
        self
    }

    /// Use `message` when a value other than the true token is submitted.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Default for CheckboxAsString {
    fn default() -> Self {
        Self::new()
    }
}

/// Checkbox rule: true token → `true`, absence → `false`.
#[must_use]
pub const fn checkbox_as_string() -> CheckboxAsString {
    CheckboxAsString::new()
}

impl Rule for CheckboxAsString {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        match input {
            None => Ok(Value::Bool(false)),
            Some(Value::String(s)) if *s == self.true_value => Ok(Value::Bool(true)),
            Some(Value::String(_)) => Err(ValidationError::single(
                IssueCode::InvalidLiteral,
                self.message.as_deref().map_or_else(
                    || format!("Invalid literal value, expected \"{}\"", self.true_value),
                    str::to_string,
                ),
            )),
            Some(other) => Err(invalid_type("string", other)),
        }
    }
}

/// Date or timestamp spelled as a string.
#[derive(Debug, Clone)]
pub struct DateAsString {
    message: Cow<'static, str>,
}

/// Default-configured [`DateAsString`].
pub const DATE_AS_STRING: DateAsString = DateAsString::new();

impl DateAsString {
    /// Create the rule with the default message.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            message: Cow::Borrowed("Invalid date"),
        }
    }

    /// Use `message` when the input is not a date.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for DateAsString {
    fn default() -> Self {
        Self::new()
    }
}

/// Date-as-string rule, for `<input type="date">` and `<input type="datetime-local">`.
///
/// Values without an offset are read as UTC. The output is an RFC 3339
/// timestamp with millisecond precision, e.g. `2022-11-25T00:00:00.000Z`,
/// which deserializes into `chrono::DateTime<Utc>`.
#[must_use]
pub const fn date_as_string() -> DateAsString {
    DateAsString::new()
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl Rule for DateAsString {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let s = expect_str(input)?;
        parse_date(s)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .ok_or_else(|| ValidationError::single(IssueCode::InvalidDate, self.message.as_ref()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(rule: &impl Rule, input: Value) -> Value {
        rule.parse(Some(&input)).unwrap()
    }

    fn rejects(rule: &impl Rule, input: Value) -> bool {
        rule.parse(Some(&input)).is_err()
    }

    #[test]
    fn test_int_as_string() {
        assert_eq!(ok(&int_as_string(), json!("3")), json!(3));
        assert_eq!(ok(&int_as_string(), json!("03")), json!(3));
        assert_eq!(ok(&int_as_string(), json!("-3")), json!(-3));

        assert!(rejects(&int_as_string(), json!(3)));
        assert!(rejects(&int_as_string(), json!(3.14)));
        assert!(rejects(&int_as_string(), json!("3.14")));
        assert!(rejects(&int_as_string(), json!("a3")));
        assert!(rejects(&int_as_string(), json!("")));
    }

    #[test]
    fn test_int_as_string_messages() {
        let err = int_as_string().parse(Some(&json!("a3"))).unwrap_err();
        assert_eq!(err.issues()[0].message, "Must be an integer string");

        let err = int_as_string()
            .with_message("Age must be a whole number")
            .parse(Some(&json!("a3")))
            .unwrap_err();
        assert_eq!(err.issues()[0].message, "Age must be a whole number");
    }

    #[test]
    fn test_int_as_string_overflow() {
        let err = int_as_string()
            .parse(Some(&json!("99999999999999999999")))
            .unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::InvalidNumber);
    }

    #[test]
    fn test_int_as_string_rejects_non_ascii_digits() {
        assert!(rejects(&int_as_string(), json!("٣")));
    }

    #[test]
    fn test_num_as_string() {
        assert_eq!(ok(&num_as_string(), json!("3.14")), json!(3.14));
        assert_eq!(ok(&num_as_string(), json!("03.14")), json!(3.14));
        assert_eq!(ok(&num_as_string(), json!("-3.14")), json!(-3.14));
        assert_eq!(ok(&num_as_string(), json!("3")), json!(3.0));
        assert_eq!(ok(&num_as_string(), json!("03")), json!(3.0));
        assert_eq!(ok(&num_as_string(), json!("-3")), json!(-3.0));
        assert_eq!(ok(&num_as_string(), json!(".5")), json!(0.5));

        assert!(rejects(&num_as_string(), json!("a3")));
        assert!(rejects(&num_as_string(), json!("3.")));
        assert!(rejects(&num_as_string(), json!(3.14)));
    }

    #[test]
    fn test_bool_as_string() {
        assert_eq!(ok(&bool_as_string(), json!("true")), json!(true));
        assert_eq!(ok(&bool_as_string(), json!("false")), json!(false));
        assert!(rejects(&bool_as_string(), json!("hello")));
        assert!(rejects(&bool_as_string(), json!("TRUE")));
        assert!(rejects(&bool_as_string(), json!(true)));
    }

    #[test]
    fn test_checkbox_as_string() {
        assert_eq!(ok(&checkbox_as_string(), json!("on")), json!(true));
        assert_eq!(checkbox_as_string().parse(None).unwrap(), json!(false));
        assert!(rejects(&checkbox_as_string(), json!("hello")));
        assert!(rejects(&checkbox_as_string(), json!("true")));
        assert!(rejects(&checkbox_as_string(), Value::Null));
    }

    #[test]
    fn test_checkbox_custom_token() {
        let rule = checkbox_as_string().true_value("true");
        assert_eq!(ok(&rule, json!("true")), json!(true));
        assert_eq!(rule.parse(None).unwrap(), json!(false));
        assert!(rejects(&rule, json!("on")));
    }

    #[test]
    fn test_checkbox_custom_message() {
        let err = checkbox_as_string()
            .with_message("Tick the box or leave it")
            .parse(Some(&json!("maybe")))
            .unwrap_err();
        assert_eq!(err.issues()[0].message, "Tick the box or leave it");
    }

    #[test]
    fn test_date_as_string() {
        assert_eq!(
            ok(&date_as_string(), json!("2022-11-25")),
            json!("2022-11-25T00:00:00.000Z")
        );
        assert_eq!(
            ok(&date_as_string(), json!("2022-11-25T13:45")),
            json!("2022-11-25T13:45:00.000Z")
        );
        assert_eq!(
            ok(&date_as_string(), json!("2022-11-25T13:45:00+02:00")),
            json!("2022-11-25T11:45:00.000Z")
        );
        assert!(rejects(&date_as_string(), json!("yesterday")));
        assert!(rejects(&date_as_string(), json!("2022-13-40")));
        assert!(rejects(&date_as_string(), json!(false)));
    }

    #[test]
    fn test_date_output_deserializes_to_chrono() {
        let value = ok(&date_as_string(), json!("2022-11-25"));
        let parsed: DateTime<Utc> = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2022-11-25T00:00:00+00:00");
    }

    #[test]
    fn test_fixed_instances_match_factories() {
        assert_eq!(ok(&INT_AS_STRING, json!("7")), ok(&int_as_string(), json!("7")));
        assert_eq!(ok(&CHECKBOX_AS_STRING, json!("on")), json!(true));
        assert_eq!(ok(&BOOL_AS_STRING, json!("false")), json!(false));
        assert_eq!(ok(&NUM_AS_STRING, json!("1.5")), json!(1.5));
        assert!(rejects(&DATE_AS_STRING, json!("nope")));
    }
}
