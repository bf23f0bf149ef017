//! The [`Rule`] trait and the combinators every rule shares.
//!
//! A rule consumes an optional JSON value (`None` means the key was absent)
//! and either produces a transformed JSON value or a [`ValidationError`].
//! Rules are object-safe so schemas can hold heterogeneous fields as
//! `Box<dyn Rule>`.
//!
//! Rules whose transformation is asynchronous report [`Rule::is_async`] and
//! implement [`Rule::parse_async`]. Reaching such a rule through the
//! synchronous [`Rule::parse`] yields an [`IssueCode::AsyncRule`] issue rather
//! than a half-finished value.

use crate::error::{IssueCode, ValidationError};
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Result of running a rule.
pub type RuleResult = Result<Value, ValidationError>;

/// A composable validation rule.
pub trait Rule: Send + Sync {
    /// Validate and transform `input` synchronously.
    ///
    /// # Errors
    ///
    /// Returns every issue found in `input`.
    fn parse(&self, input: Option<&Value>) -> RuleResult;

    /// Validate and transform `input`, awaiting asynchronous transforms.
    ///
    /// The default delegates to [`Rule::parse`].
    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        Box::pin(async move { self.parse(input) })
    }

    /// Whether this rule, or any rule nested in it, transforms asynchronously.
    fn is_async(&self) -> bool {
        false
    }
}

impl<R: Rule + ?Sized> Rule for Box<R> {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        (**self).parse(input)
    }

    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        (**self).parse_async(input)
    }

    fn is_async(&self) -> bool {
        (**self).is_async()
    }
}

impl<R: Rule + ?Sized> Rule for Arc<R> {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        (**self).parse(input)
    }

    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        (**self).parse_async(input)
    }

    fn is_async(&self) -> bool {
        (**self).is_async()
    }
}

pub(crate) fn required() -> ValidationError {
    ValidationError::single(IssueCode::Required, "Required")
}

pub(crate) fn async_in_sync() -> ValidationError {
    ValidationError::single(
        IssueCode::AsyncRule,
        "Asynchronous rule encountered during synchronous parse",
    )
}

/// Combinators available on every rule.
pub trait RuleExt: Rule + Sized + 'static {
    /// Accept absence, producing `null`.
    fn optional(self) -> Optional<Self> {
        Optional { inner: self }
    }

    /// Map the validated output; an `Err(message)` becomes a custom issue.
    fn transform<F>(self, f: F) -> Transform<Self, F>
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Transform { inner: self, f }
    }

    /// Map the validated output with an asynchronous function.
    fn transform_async<F, Fut>(self, f: F) -> AsyncTransform<Self, F>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        AsyncTransform { inner: self, f }
    }

    /// Replace every issue message produced by this rule.
    fn message(self, message: impl Into<String>) -> WithMessage<Self> {
        WithMessage {
            inner: self,
            message: message.into(),
        }
    }

    /// Erase the concrete type.
    fn boxed(self) -> Box<dyn Rule> {
        Box::new(self)
    }
}

impl<R: Rule + Sized + 'static> RuleExt for R {}

/// See [`RuleExt::optional`].
#[derive(Debug, Clone)]
pub struct Optional<R> {
    inner: R,
}

impl<R: Rule> Rule for Optional<R> {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        match input {
            None | Some(Value::Null) => Ok(Value::Null),
            Some(value) => self.inner.parse(Some(value)),
        }
    }

    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        match input {
            None | Some(Value::Null) => Box::pin(async { Ok(Value::Null) }),
            Some(value) => self.inner.parse_async(Some(value)),
        }
    }

    fn is_async(&self) -> bool {
        self.inner.is_async()
    }
}

/// See [`RuleExt::transform`].
pub struct Transform<R, F> {
    inner: R,
    f: F,
}

impl<R, F> Rule for Transform<R, F>
where
    R: Rule,
    F: Fn(Value) -> Result<Value, String> + Send + Sync,
{
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let value = self.inner.parse(input)?;
        (self.f)(value).map_err(|message| ValidationError::single(IssueCode::Custom, message))
    }

    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        Box::pin(async move {
            let value = self.inner.parse_async(input).await?;
            (self.f)(value).map_err(|message| ValidationError::single(IssueCode::Custom, message))
        })
    }

    fn is_async(&self) -> bool {
        self.inner.is_async()
    }
}

/// See [`RuleExt::transform_async`].
pub struct AsyncTransform<R, F> {
    inner: R,
    f: F,
}

impl<R, F, Fut> Rule for AsyncTransform<R, F>
where
    R: Rule,
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, String>> + Send + 'static,
{
    fn parse(&self, _input: Option<&Value>) -> RuleResult {
        Err(async_in_sync())
    }

    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        Box::pin(async move {
            let value = self.inner.parse_async(input).await?;
            (self.f)(value)
                .await
                .map_err(|message| ValidationError::single(IssueCode::Custom, message))
        })
    }

    fn is_async(&self) -> bool {
        true
    }
}

/// See [`RuleExt::message`].
#[derive(Debug, Clone)]
pub struct WithMessage<R> {
    inner: R,
    message: String,
}

impl<R: Rule> Rule for WithMessage<R> {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        self.inner
            .parse(input)
            .map_err(|err| err.with_message(&self.message))
    }

    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        Box::pin(async move {
            self.inner
                .parse_async(input)
                .await
                .map_err(|err| err.with_message(&self.message))
        })
    }

    fn is_async(&self) -> bool {
        self.inner.is_async()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::string;
    use serde_json::json;

    #[test]
    fn test_optional_accepts_absence() {
        let rule = string().optional();
        assert_eq!(rule.parse(None).unwrap(), Value::Null);
        assert_eq!(rule.parse(Some(&json!("x"))).unwrap(), json!("x"));
        assert!(rule.parse(Some(&json!(1))).is_err());
    }

    #[test]
    fn test_transform_maps_output() {
        let rule = string().transform(|v| Ok(json!(v.as_str().map_or(0, str::len))));
        assert_eq!(rule.parse(Some(&json!("abcd"))).unwrap(), json!(4));
    }

    #[test]
    fn test_transform_error_becomes_custom_issue() {
        let rule = string().transform(|_| Err("nope".to_string()));
        let err = rule.parse(Some(&json!("a"))).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::Custom);
        assert_eq!(err.issues()[0].message, "nope");
    }

    #[test]
    fn test_async_transform_rejects_sync_parse() {
        let rule = string().transform_async(|v| async move { Ok::<_, String>(v) });
        assert!(rule.is_async());
        let err = rule.parse(Some(&json!("a"))).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::AsyncRule);
    }

    #[tokio::test]
    async fn test_async_transform_is_awaited() {
        let rule = string().transform_async(|v| async move {
            Ok::<_, String>(json!(format!("{}!", v.as_str().unwrap_or_default())))
        });
        let input = json!("hi");
        assert_eq!(rule.parse_async(Some(&input)).await.unwrap(), json!("hi!"));
    }

    #[test]
    fn test_message_overrides_issue_text() {
        let rule = string().message("Name is required");
        let err = rule.parse(None).unwrap_err();
        assert_eq!(err.issues()[0].message, "Name is required");
    }
}
