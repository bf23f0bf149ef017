//! Request sources and the adapters that turn them into normalized JSON.
//!
//! Three sources are supported:
//!
//! - route parameters: already a map, see [`formwise_core::Params`]
//! - query strings: [`SearchParams`], or anything that carries a URI
//! - submitted forms: [`FormData`], or a request whose body is read once
//!
//! Text values go through the configured [`PairParser`]. Uploaded files
//! bypass it and are merged into the resulting object as JSON objects that
//! deserialize into [`FormFile`].

use crate::error::BodyError;
use axum::{
    body::to_bytes,
    extract::{FromRequest, Multipart, Request},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use formwise_core::params::{PairParser, RawPair};
use http::{Uri, header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::convert::Infallible;
use std::str::FromStr;
use url::form_urlencoded;

const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// Ordered query-string pairs.
///
/// # Example
///
/// ```
/// use formwise_web::SearchParams;
///
/// let search = SearchParams::parse("?friends=a&friends=b&q=hello+world");
/// assert_eq!(search.pairs().len(), 3);
/// assert_eq!(search.pairs()[2].1, "hello world");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<RawPair>,
}

impl SearchParams {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a query string. A leading `?` is ignored.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Pairs from the query component of `uri`, empty when there is none.
    #[must_use]
    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    /// Add one pair at the end.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Pairs in encounter order.
    #[must_use]
    pub fn pairs(&self) -> &[RawPair] {
        &self.pairs
    }

    /// Encode back into a query string (without the leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl FromStr for SearchParams {
    type Err = Infallible;

    fn from_str(query: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(query))
    }
}

impl<K, V> FromIterator<(K, V)> for SearchParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Where a query is read from.
#[derive(Debug, Clone)]
pub enum QueryInput {
    /// An explicit query-string container.
    Search(SearchParams),
    /// A URI whose query component is decoded.
    Uri(Uri),
}

impl QueryInput {
    /// Decode into ordered pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<RawPair> {
        match self {
            Self::Search(search) => search.pairs,
            Self::Uri(uri) => SearchParams::from_uri(&uri).pairs,
        }
    }
}

impl From<SearchParams> for QueryInput {
    fn from(search: SearchParams) -> Self {
        Self::Search(search)
    }
}

impl From<Uri> for QueryInput {
    fn from(uri: Uri) -> Self {
        Self::Uri(uri)
    }
}

impl From<&Uri> for QueryInput {
    fn from(uri: &Uri) -> Self {
        Self::Uri(uri.clone())
    }
}

impl<B> From<&http::Request<B>> for QueryInput {
    fn from(request: &http::Request<B>) -> Self {
        Self::Uri(request.uri().clone())
    }
}

impl From<&url::Url> for QueryInput {
    fn from(url: &url::Url) -> Self {
        Self::Search(url.query_pairs().into_owned().collect())
    }
}

/// An uploaded file.
///
/// In the normalized object the contents travel as one base64 string, so a
/// validated upload deserializes straight back into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFile {
    /// Name supplied by the client.
    pub file_name: String,
    /// Declared media type, if any.
    pub content_type: Option<String>,
    /// File contents.
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(de::Error::custom)
    }
}

/// One value of a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A text field.
    Text(String),
    /// An uploaded file.
    File(FormFile),
}

/// Ordered entries of a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push((key.into(), FormValue::Text(value.into())));
    }

    /// Add an uploaded file.
    pub fn append_file(&mut self, key: impl Into<String>, file: FormFile) {
        self.entries.push((key.into(), FormValue::File(file)));
    }

    /// All entries in submission order.
    #[must_use]
    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the form has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a url-encoded body.
    #[must_use]
    pub fn from_urlencoded(body: &[u8]) -> Self {
        form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Fold the form into a JSON object.
    ///
    /// Keys that carry only text are normalized by `parser`. Keys that carry
    /// at least one file keep every entry in submission order: alone they stay
    /// a single value, repeated they accumulate into a list.
    #[must_use]
    pub fn normalize(self, parser: &dyn PairParser) -> Value {
        let file_keys: HashSet<String> = self
            .entries
            .iter()
            .filter(|(_, value)| matches!(value, FormValue::File(_)))
            .map(|(key, _)| key.clone())
            .collect();

        let mut text = Vec::new();
        let mut mixed = Vec::new();
        for (key, value) in self.entries {
            match value {
                FormValue::Text(value) if !file_keys.contains(&key) => text.push((key, value)),
                FormValue::Text(value) => mixed.push((key, Value::String(value))),
                FormValue::File(file) => mixed.push((key, file_to_json(&file))),
            }
        }

        let mut object = parser.parse_pairs(&text).to_object();
        for (key, value) in mixed {
            accumulate(&mut object, key, value);
        }
        Value::Object(object)
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), FormValue::Text(v.into())))
                .collect(),
        }
    }
}

fn file_to_json(file: &FormFile) -> Value {
    let mut object = Map::new();
    object.insert("file_name".to_string(), Value::String(file.file_name.clone()));
    object.insert(
        "content_type".to_string(),
        file.content_type.clone().map_or(Value::Null, Value::String),
    );
    object.insert(
        "bytes".to_string(),
        Value::String(STANDARD.encode(&file.bytes)),
    );
    Value::Object(object)
}

fn accumulate(object: &mut Map<String, Value>, key: String, value: Value) {
    match object.get_mut(&key) {
        None => {
            object.insert(key, value);
        }
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

/// Where a form is read from.
#[derive(Debug)]
pub enum FormInput {
    /// An already-decoded form.
    Data(FormData),
    /// A request whose body holds the form.
    Request(Request),
}

impl FormInput {
    /// Produce the form entries, reading the body if needed.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError`] when the body cannot be read or decoded.
    pub async fn into_form_data(self, body_limit: usize) -> Result<FormData, BodyError> {
        match self {
            Self::Data(data) => Ok(data),
            Self::Request(request) => read_form(request, body_limit).await,
        }
    }
}

impl From<FormData> for FormInput {
    fn from(data: FormData) -> Self {
        Self::Data(data)
    }
}

impl From<Request> for FormInput {
    fn from(request: Request) -> Self {
        Self::Request(request)
    }
}

/// Read a url-encoded or multipart form from a request body.
///
/// The body is consumed once. `body_limit` caps url-encoded bodies; multipart
/// bodies are limited by axum's `DefaultBodyLimit`.
///
/// # Errors
///
/// - [`BodyError::UnsupportedContentType`] for any other content type
/// - [`BodyError::Read`] when the body cannot be read or is too large
/// - [`BodyError::MultipartRejected`] / [`BodyError::Multipart`] for bad multipart data
pub async fn read_form(request: Request, body_limit: usize) -> Result<FormData, BodyError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with(URLENCODED) {
        let body = to_bytes(request.into_body(), body_limit)
            .await
            .map_err(BodyError::Read)?;
        Ok(FormData::from_urlencoded(&body))
    } else if content_type.starts_with(MULTIPART) {
        read_multipart(request).await
    } else {
        Err(BodyError::UnsupportedContentType(content_type))
    }
}

async fn read_multipart(request: Request) -> Result<FormData, BodyError> {
    let mut multipart = Multipart::from_request(request, &()).await?;
    let mut form = FormData::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.append_file(
                    name,
                    FormFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    },
                );
            }
            None => {
                let text = field.text().await?;
                form.append(name, text);
            }
        }
    }

    tracing::trace!(entries = form.len(), "read multipart form");
    Ok(form)
}
