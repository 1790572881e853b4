//! Core types shared by the registry, decoder and encoder.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level member holding primary data.
pub const DATA: &str = "data";
/// Top-level member holding included resources.
pub const INCLUDED: &str = "included";
/// Top-level member holding error objects.
pub const ERRORS: &str = "errors";
/// Resource object member naming the wire type.
pub const TYPE: &str = "type";
/// Resource object member holding the textual id.
pub const ID: &str = "id";
/// Resource object member holding attributes.
pub const ATTRIBUTES: &str = "attributes";
/// Resource object member holding relationship objects.
pub const RELATIONSHIPS: &str = "relationships";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Textual form of a scalar wire value.
///
/// Ids are strings on the wire, but numbers and booleans are accepted and read
/// as their text. Returns `None` for null and containers.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whether a relationship holds a single reference or an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// Declared value type of an identity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    Integer,
    #[default]
    String,
}

impl IdKind {
    /// Convert a wire id into this kind.
    ///
    /// Returns `None` for empty input or when the text does not parse.
    pub fn parse(&self, raw: &str) -> Option<Id> {
        if raw.is_empty() {
            return None;
        }
        match self {
            IdKind::Integer => raw.parse().ok().map(Id::Integer),
            IdKind::String => Some(Id::Text(raw.to_string())),
        }
    }

    /// Convert a model-side JSON value into this kind.
    ///
    /// Integers and strings are both accepted for either kind.
    pub fn from_json(&self, value: &Value) -> Option<Id> {
        match (self, value) {
            (IdKind::Integer, Value::Number(n)) => n.as_i64().map(Id::Integer),
            (_, other) => self.parse(&scalar_text(other)?),
        }
    }
}

/// Identity value of a decoded resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Integer(i64),
    Text(String),
}

impl Id {
    /// Model-side JSON value: a number for integers, a string otherwise.
    pub fn to_json(&self) -> Value {
        match self {
            Id::Integer(n) => Value::from(*n),
            Id::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Integer(n) => write!(f, "{}", n),
            Id::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Integer(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Integer(i64::from(value))
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Text(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Text(value)
    }
}

/// `(type, id)` pair naming one resource within a document.
///
/// The id is kept in its wire (textual) form, so two linkages match exactly
/// when their wire text matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    type_name: String,
    id: String,
}

impl Identifier {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wire identifier object (`{"type": ..., "id": ...}`).
    pub fn to_linkage(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(TYPE.to_string(), Value::String(self.type_name.clone()));
        map.insert(ID.to_string(), Value::String(self.id.clone()));
        Value::Object(map)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.id)
    }
}
