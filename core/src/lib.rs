//! # Formwise Core
//!
//! Request-shaped data in, strongly-typed data out.
//!
//! Route parameters, query strings and submitted forms all arrive as string
//! key/value pairs. This crate provides the pieces that turn them into typed
//! values, independent of any web framework:
//!
//! - **Normalization** ([`params`]): fold ordered pairs into a map of single
//!   values and ordered lists, with a pluggable [`PairParser`] strategy
//! - **Rules** ([`rule`], [`rules`], [`object`]): composable validation rules
//!   that report every issue with its field path
//! - **Coercions** ([`coerce`]): string-to-integer, float, boolean, checkbox
//!   and date rules for use inside object schemas
//! - **Outcomes** ([`outcome`]): run a rule and deserialize into any
//!   `serde::Deserialize` type
//!
//! ## Example
//!
//! ```
//! use formwise_core::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Search {
//!     query: String,
//!     page: i64,
//!     tags: Option<Vec<String>>,
//! }
//!
//! let pairs = vec![
//!     ("query".to_string(), "rust".to_string()),
//!     ("page".to_string(), "2".to_string()),
//! ];
//! let params = normalize(&pairs);
//!
//! let rule = Schema::from(
//!     Shape::new()
//!         .field("query", string())
//!         .field("page", int_as_string())
//!         .field("tags", array(string()).accept_single().optional()),
//! )
//! .resolve();
//!
//! let search: Search = validate(rule.as_ref(), &params.to_json()).unwrap();
//! assert_eq!(search.page, 2);
//! assert!(search.tags.is_none());
//! ```

pub mod coerce;
pub mod error;
pub mod object;
pub mod outcome;
pub mod params;
pub mod rule;
pub mod rules;

// Re-export commonly used types
pub use error::{IssueCode, PathSegment, ValidationError, ValidationIssue};
pub use object::{ObjectSchema, Schema, Shape};
pub use outcome::{ParseOutcome, validate, validate_async};
pub use params::{BracketArrayParser, DefaultParser, PairParser, ParamValue, Params, RawPair};
pub use rule::{Rule, RuleExt, RuleResult};

/// Everything needed to declare schemas.
pub mod prelude {
    pub use crate::coerce::{
        bool_as_string, checkbox_as_string, date_as_string, int_as_string, num_as_string,
    };
    pub use crate::error::{IssueCode, ValidationError, ValidationIssue};
    pub use crate::object::{ObjectSchema, Schema, Shape};
    pub use crate::outcome::{ParseOutcome, validate, validate_async};
    pub use crate::params::{BracketArrayParser, PairParser, ParamValue, Params, normalize};
    pub use crate::rule::{Rule, RuleExt};
    pub use crate::rules::{any, array, boolean, custom, file, literal, number, string};
}
