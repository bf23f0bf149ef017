//! Key/value normalization.
//!
//! Query strings and url-encoded form bodies arrive as an ordered sequence of
//! `(key, value)` pairs in which a key may repeat. Schemas validate objects, so
//! the pairs are folded into a [`Params`] map first:
//!
//! - a key seen once becomes [`ParamValue::Single`]
//! - a key seen two or more times becomes [`ParamValue::Multiple`], with values
//!   in the order they were encountered
//!
//! The fold is pluggable through [`PairParser`], so applications can support
//! other encodings such as `friends[]=a&friends[]=b`.
//!
//! # Example
//!
//! ```
//! use formwise_core::params::{ParamValue, normalize};
//!
//! let pairs = vec![
//!     ("id".to_string(), "id1".to_string()),
//!     ("friends".to_string(), "a".to_string()),
//!     ("friends".to_string(), "b".to_string()),
//! ];
//! let params = normalize(&pairs);
//!
//! assert_eq!(params.get("id"), Some(&ParamValue::from("id1")));
//! assert_eq!(
//!     params.get("friends"),
//!     Some(&ParamValue::Multiple(vec!["a".to_string(), "b".to_string()]))
//! );
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::collections::hash_map;

/// A raw `(key, value)` pair drawn from a request source.
pub type RawPair = (String, String);

/// The value stored under one key after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// The key occurred once.
    Single(String),
    /// The key occurred repeatedly (or a parser asked for a list); values
    /// keep their encounter order. [`Params`] never stores an empty list.
    Multiple(Vec<String>),
}

impl ParamValue {
    /// Append another occurrence, promoting a single value to a list.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(previous) => {
                let previous = std::mem::take(previous);
                *self = Self::Multiple(vec![previous, value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }

    /// Whether no value is held, which only an empty `Multiple` can be.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Multiple(values) if values.is_empty())
    }

    /// All values under this key, in order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        }
    }

    /// JSON form: a string or an array of strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Single(value) => Value::String(value.clone()),
            Self::Multiple(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Normalized request data: key to single value or ordered list of values.
///
/// Key order is not significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: HashMap<String, ParamValue>,
}

impl Params {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// An empty list removes the key instead, since a key that occurred has at
    /// least one value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value);
        }
    }

    /// Record one more occurrence of `key`.
    ///
    /// This is the default accumulation rule: the first occurrence is stored as
    /// a single value, later occurrences turn it into a list.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.values.entry(key.into()) {
            hash_map::Entry::Occupied(mut entry) => entry.get_mut().push(value),
            hash_map::Entry::Vacant(entry) => {
                entry.insert(ParamValue::Single(value));
            }
        }
    }

    /// Look up the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no keys are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over keys and values in arbitrary key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    /// Flatten back into pairs, keeping the value order of every key.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<RawPair> {
        self.values
            .iter()
            .flat_map(|(key, value)| {
                value
                    .values()
                    .iter()
                    .map(move |v| (key.clone(), v.clone()))
            })
            .collect()
    }

    /// JSON object map of the normalized values.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }

    /// JSON object suitable as schema input.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.to_object())
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl From<HashMap<String, String>> for Params {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<HashMap<String, ParamValue>> for Params {
    fn from(values: HashMap<String, ParamValue>) -> Self {
        values.into_iter().collect()
    }
}

impl IntoIterator for Params {
    type Item = (String, ParamValue);
    type IntoIter = hash_map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Strategy that folds ordered pairs into [`Params`].
///
/// Any `Fn(&[RawPair]) -> Params` closure is a parser, so custom encodings can
/// be supported without a named type:
///
/// ```
/// use formwise_core::params::{PairParser, Params, RawPair};
///
/// let lowercase_keys = |pairs: &[RawPair]| {
///     let mut params = Params::new();
///     for (key, value) in pairs {
///         params.append(key.to_lowercase(), value.clone());
///     }
///     params
/// };
///
/// let params = lowercase_keys.parse_pairs(&[("ID".to_string(), "7".to_string())]);
/// assert!(params.get("id").is_some());
/// ```
pub trait PairParser: Send + Sync {
    /// Fold `pairs` into a normalized map.
    fn parse_pairs(&self, pairs: &[RawPair]) -> Params;
}

impl<F> PairParser for F
where
    F: Fn(&[RawPair]) -> Params + Send + Sync,
{
    fn parse_pairs(&self, pairs: &[RawPair]) -> Params {
        self(pairs)
    }
}

/// The default strategy: single occurrence yields a string, repeats yield a list.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl PairParser for DefaultParser {
    fn parse_pairs(&self, pairs: &[RawPair]) -> Params {
        normalize(pairs)
    }
}

/// Strategy for `key[]=a&key[]=b` encodings.
///
/// A trailing `[]` is stripped from the key and the key always yields a list,
/// even when it occurs once. Keys without the suffix follow the default rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketArrayParser;

impl PairParser for BracketArrayParser {
    fn parse_pairs(&self, pairs: &[RawPair]) -> Params {
        let mut params = Params::new();
        for (key, value) in pairs {
            if let Some(stripped) = key.strip_suffix("[]") {
                match params.values.entry(stripped.to_string()) {
                    hash_map::Entry::Occupied(mut entry) => entry.get_mut().push(value.clone()),
                    hash_map::Entry::Vacant(entry) => {
                        entry.insert(ParamValue::Multiple(vec![value.clone()]));
                    }
                }
            } else {
                params.append(key.clone(), value.clone());
            }
        }
        params
    }
}

/// Fold pairs with the default rule.
#[must_use]
pub fn normalize(pairs: &[RawPair]) -> Params {
    let mut params = Params::new();
    for (key, value) in pairs {
        params.append(key.clone(), value.clone());
    }
    tracing::trace!(pairs = pairs.len(), keys = params.len(), "normalized pairs");
    params
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<RawPair> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_single_occurrence_is_scalar() {
        let params = normalize(&pairs(&[("id", "id1"), ("age", "10")]));

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("age"), Some(&ParamValue::from("10")));
    }

    #[test]
    fn test_repeated_key_becomes_list_in_order() {
        let params = normalize(&pairs(&[
            ("friends", "a"),
            ("id", "1"),
            ("friends", "b"),
            ("friends", "c"),
        ]));

        assert_eq!(
            params.get("friends"),
            Some(&ParamValue::from(vec!["a", "b", "c"]))
        );
        assert_eq!(params.get("id"), Some(&ParamValue::from("1")));
    }

    #[test]
    fn test_empty_value_is_kept() {
        let params = normalize(&pairs(&[("q", "")]));
        assert_eq!(params.get("q"), Some(&ParamValue::from("")));
    }

    #[test]
    fn test_to_json_shapes() {
        let params = normalize(&pairs(&[("id", "id1"), ("f", "a"), ("f", "b")]));
        assert_eq!(params.to_json(), json!({ "id": "id1", "f": ["a", "b"] }));
    }

    #[test]
    fn test_bracket_parser_strips_suffix() {
        let params = BracketArrayParser.parse_pairs(&pairs(&[
            ("id", "id1"),
            ("friends[]", "friend1"),
            ("friends[]", "friend2"),
        ]));

        assert_eq!(
            params.get("friends"),
            Some(&ParamValue::from(vec!["friend1", "friend2"]))
        );
        assert_eq!(params.get("id"), Some(&ParamValue::from("id1")));
    }

    #[test]
    fn test_bracket_parser_single_value_is_list() {
        let params = BracketArrayParser.parse_pairs(&pairs(&[("tags[]", "rust")]));
        assert_eq!(params.get("tags"), Some(&ParamValue::from(vec!["rust"])));
    }

    #[test]
    fn test_closure_is_a_parser() {
        let ignore_all = |_: &[RawPair]| Params::new();
        assert!(ignore_all.parse_pairs(&pairs(&[("a", "b")])).is_empty());
    }

    #[test]
    fn test_empty_list_is_never_stored() {
        let params: Params = [("tags", Vec::<String>::new()), ("ids", vec!["1".to_string()])]
            .into_iter()
            .collect();
        assert!(params.get("tags").is_none());
        assert_eq!(params.len(), 1);

        let mut params = params;
        params.insert("ids", Vec::<&str>::new());
        assert!(params.is_empty());
    }

    #[test]
    fn test_round_trip_through_pairs() {
        let params = normalize(&pairs(&[("a", "1"), ("b", "2"), ("a", "3")]));
        assert_eq!(normalize(&params.to_pairs()), params);
    }

    #[test]
    fn test_from_route_map() {
        let map: HashMap<String, String> =
            [("postId".to_string(), "42".to_string())].into_iter().collect();
        let params = Params::from(map);
        assert_eq!(params.to_json(), json!({ "postId": "42" }));
    }
}
