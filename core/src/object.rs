//! Object schemas and the raw-shape / compiled-schema descriptor.
//!
//! Entry points accept either a bare field list ([`Shape`]) or a ready-made
//! rule (typically an [`ObjectSchema`], possibly wrapped in transforms or
//! refinements). [`Schema`] is the tagged union of the two; it is resolved
//! to a single rule once per call.
//!
//! # Example
//!
//! ```
//! use formwise_core::object::{Schema, Shape};
//! use formwise_core::rule::Rule;
//! use formwise_core::rules::string;
//! use formwise_core::coerce::int_as_string;
//! use serde_json::json;
//!
//! let shape = Shape::new()
//!     .field("id", string())
//!     .field("age", int_as_string());
//!
//! let rule = Schema::from(shape).resolve();
//! let out = rule.parse(Some(&json!({ "id": "id1", "age": "10" }))).unwrap();
//! assert_eq!(out, json!({ "id": "id1", "age": 10 }));
//! ```

use crate::error::{IssueCode, ValidationError};
use crate::rule::{Rule, RuleResult, required};
use crate::rules::{invalid_type, merge};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

type Refinement = Box<dyn Fn(&Map<String, Value>) -> bool + Send + Sync>;

/// An ordered list of named field rules.
#[derive(Default)]
pub struct Shape {
    fields: Vec<(String, Box<dyn Rule>)>,
}

impl Shape {
    /// Create an empty shape.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; a later field with the same name replaces the earlier one.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: impl Rule + 'static) -> Self {
        let name = name.into();
        self.fields.retain(|(existing, _)| *existing != name);
        self.fields.push((name, Box::new(rule)));
        self
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("fields", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Validates an object field by field.
///
/// Keys that the shape does not declare are dropped from the output. A field
/// that is absent from the input and resolves to `null` (an optional field)
/// is omitted from the output as well.
pub struct ObjectSchema {
    shape: Shape,
    refinements: Vec<(Refinement, String)>,
}

impl ObjectSchema {
    /// Wrap a shape.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            refinements: Vec::new(),
        }
    }

    /// Add a whole-object check that runs after every field has passed.
    ///
    /// The check sees the transformed field values. A failure is reported as
    /// a root-level issue carrying `message`.
    #[must_use]
    pub fn refine<F>(mut self, check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Map<String, Value>) -> bool + Send + Sync + 'static,
    {
        self.refinements.push((Box::new(check), message.into()));
        self
    }

    fn input_object<'v>(input: Option<&'v Value>) -> Result<&'v Map<String, Value>, ValidationError> {
        match input {
            None => Err(required()),
            Some(Value::Object(object)) => Ok(object),
            Some(other) => Err(invalid_type("object", other)),
        }
    }

    fn finish(
        &self,
        output: Map<String, Value>,
        errors: Option<ValidationError>,
    ) -> RuleResult {
        if let Some(errors) = errors {
            return Err(errors);
        }
        let mut failed: Option<ValidationError> = None;
        for (check, message) in &self.refinements {
            if !check(&output) {
                merge(
                    &mut failed,
                    ValidationError::single(IssueCode::Custom, message.clone()),
                );
            }
        }
        failed.map_or(Ok(Value::Object(output)), Err)
    }
}

fn store(output: &mut Map<String, Value>, name: &str, present: bool, value: Value) {
    if present || !value.is_null() {
        output.insert(name.to_string(), value);
    }
}

impl Rule for ObjectSchema {
    fn parse(&self, input: Option<&Value>) -> RuleResult {
        let object = Self::input_object(input)?;
        let mut output = Map::new();
        let mut errors: Option<ValidationError> = None;

        for (name, rule) in &self.shape.fields {
            let field = object.get(name);
            match rule.parse(field) {
                Ok(value) => store(&mut output, name, field.is_some(), value),
                Err(err) => merge(&mut errors, err.at(name.as_str())),
            }
        }

        self.finish(output, errors)
    }

    fn parse_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, RuleResult> {
        Box::pin(async move {
            let object = Self::input_object(input)?;
            let mut output = Map::new();
            let mut errors: Option<ValidationError> = None;

            for (name, rule) in &self.shape.fields {
                let field = object.get(name);
                match rule.parse_async(field).await {
                    Ok(value) => store(&mut output, name, field.is_some(), value),
                    Err(err) => merge(&mut errors, err.at(name.as_str())),
                }
            }

            self.finish(output, errors)
        })
    }

    fn is_async(&self) -> bool {
        self.shape.fields.iter().any(|(_, rule)| rule.is_async())
    }
}

impl fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("shape", &self.shape)
            .field("refinements", &self.refinements.len())
            .finish()
    }
}

impl From<Shape> for ObjectSchema {
    fn from(shape: Shape) -> Self {
        Self::new(shape)
    }
}

/// Either a bare shape or an already-built rule.
pub enum Schema {
    /// Field rules to be wrapped in an [`ObjectSchema`].
    Shape(Shape),
    /// A complete rule used as-is.
    Compiled(Arc<dyn Rule>),
}

impl Schema {
    /// Resolve to the rule that validates the whole input.
    #[must_use]
    pub fn resolve(self) -> Arc<dyn Rule> {
        match self {
            Self::Shape(shape) => Arc::new(ObjectSchema::new(shape)),
            Self::Compiled(rule) => rule,
        }
    }

    /// Wrap any rule.
    pub fn compiled(rule: impl Rule + 'static) -> Self {
        Self::Compiled(Arc::new(rule))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(shape) => f.debug_tuple("Shape").field(shape).finish(),
            Self::Compiled(_) => f.write_str("Compiled(..)"),
        }
    }
}

impl From<Shape> for Schema {
    fn from(shape: Shape) -> Self {
        Self::Shape(shape)
    }
}

impl From<ObjectSchema> for Schema {
    fn from(schema: ObjectSchema) -> Self {
        Self::compiled(schema)
    }
}

impl From<Arc<dyn Rule>> for Schema {
    fn from(rule: Arc<dyn Rule>) -> Self {
        Self::Compiled(rule)
    }
}

impl From<&Arc<dyn Rule>> for Schema {
    fn from(rule: &Arc<dyn Rule>) -> Self {
        Self::Compiled(Arc::clone(rule))
    }
}
