//! The raw parameter bundle a filter is driven by.
//!
//! Parameters arrive either as JSON or as a bracketed query string:
//!
//! ```text
//! filter[users][fields]=first_name last_name
//! filter[users][terms]=Jeremy
//! filter[users][with_role][]=admin&filter[users][with_role][]=staff
//! ```
//!
//! Both decode into [`FilterParams`], an insertion-ordered JSON object, so scope keys
//! keep the order they were sent in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A value that is either a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    /// Coerce a loosely typed JSON value.
    ///
    /// Scalars become text, arrays become lists of text. Objects and null are rejected.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Number(_) | Value::Bool(_) => Some(Self::Text(value.to_string())),
            Value::Array(items) => Some(Self::List(
                items.iter().filter_map(scalar_to_string).collect(),
            )),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Whitespace-separated words of a string, or the trimmed non-blank list elements.
    #[must_use]
    pub fn words(&self) -> Vec<String> {
        match self {
            Self::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            Self::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Every whitespace-separated word, splitting list elements as well.
    #[must_use]
    pub fn split_words(&self) -> Vec<String> {
        match self {
            Self::Text(_) => self.words(),
            Self::List(items) => items
                .iter()
                .flat_map(|item| item.split_whitespace())
                .map(str::to_string)
                .collect(),
        }
    }

    /// The value as one string, joining list elements with a single space.
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join(" "),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.iter().all(|item| item.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }
}

impl Default for TextOrList {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for TextOrList {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for TextOrList {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for TextOrList {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for TextOrList {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        _ => None,
    }
}

/// The whole parameter bundle, e.g. every query parameter of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterParams(Map<String, Value>);

impl FilterParams {
    #[must_use]
    pub fn new(params: Map<String, Value>) -> Self {
        Self(params)
    }

    /// Decode a raw (still percent-encoded) query string with bracketed keys.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Build the bundle from decoded key/value pairs, expanding bracketed keys into
    /// nested objects. `key[]` appends to a list.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut root = Map::new();
        for (key, value) in pairs {
            let path = split_key(key.as_ref());
            if path.is_empty() {
                continue;
            }
            insert_path(&mut root, &path, value.into());
        }
        Self(root)
    }

    /// Parameters for one collection under the given namespace.
    #[must_use]
    pub fn entity(&self, namespace: &str, collection: &str) -> Option<EntityParams> {
        let entity = self.0.get(namespace)?.as_object()?.get(collection)?.as_object()?;
        Some(EntityParams::from_map(entity))
    }

    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Value> for FilterParams {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// `filter[users][with_role][]` becomes `["filter", "users", "with_role", ""]`.
fn split_key(key: &str) -> Vec<&str> {
    let Some(open) = key.find('[') else {
        return if key.is_empty() { Vec::new() } else { vec![key] };
    };

    let mut path = vec![&key[..open]];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        path.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }
    path
}

fn insert_path(map: &mut Map<String, Value>, path: &[&str], value: String) {
    let (head, tail) = (path[0], &path[1..]);
    match tail {
        [] => {
            map.insert(head.to_string(), Value::String(value));
        }
        [""] => {
            let slot = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match slot {
                Value::Array(items) => items.push(Value::String(value)),
                other => *other = Value::Array(vec![Value::String(value)]),
            }
        }
        _ => {
            let slot = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                insert_path(child, tail, value);
            }
        }
    }
}

/// Filter parameters for one collection, split into the well-known keys and the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityParams {
    pub fields: Option<TextOrList>,
    pub terms: Option<TextOrList>,
    pub method: Option<String>,
    /// Every other key, in the order it was received
    pub extra: Vec<(String, Value)>,
}

impl EntityParams {
    fn from_map(map: &Map<String, Value>) -> Self {
        let mut params = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "fields" => params.fields = TextOrList::from_value(value),
                "terms" => params.terms = TextOrList::from_value(value),
                "method" => params.method = value.as_str().map(str::to_string),
                _ => params.extra.push((key.clone(), value.clone())),
            }
        }
        params
    }
}
