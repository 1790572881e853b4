//! Error types for registration, decoding, encoding and loading.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{scalar_text, Cardinality};

/// Errors while building a [`Registry`](crate::Registry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("type definition #{index} has no wire type name")]
    MissingTypeName { index: usize },

    #[error("type '{type_name}' is registered more than once")]
    DuplicateTypeName { type_name: String },

    #[error("type '{type_name}' does not declare an identity field")]
    MissingIdentityField { type_name: String },

    #[error("type '{type_name}' declares relationship '{relationship}' more than once")]
    DuplicateRelationship {
        type_name: String,
        relationship: String,
    },

    #[error("type '{type_name}' uses identity field name '{relationship}' for a relationship")]
    RelationshipShadowsIdentity {
        type_name: String,
        relationship: String,
    },
}

/// Lookup of a wire type name the registry does not know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("type '{type_name}' is not registered")]
pub struct UnregisteredType {
    pub type_name: String,
}

/// Malformed document envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("document is not a JSON object, got {actual}")]
    NotAnObject { actual: String },

    #[error("document is missing the 'data' member")]
    MissingData,

    #[error("'data' must be an object or array, got {actual}")]
    ScalarData { actual: String },

    #[error("'data' must be a single resource object, got an array")]
    ExpectedObject,

    #[error("'data' must be an array of resource objects, got an object")]
    ExpectedArray,

    #[error("'included' must be an array, got {actual}")]
    InvalidIncluded { actual: String },

    #[error("'errors' must be an array of error objects")]
    InvalidErrors,

    #[error("malformed resource object at {pointer}: {message}")]
    MalformedResource { pointer: String, message: String },

    #[error("resource at {pointer} has type '{found}', expected '{expected}'")]
    TypeMismatch {
        pointer: String,
        expected: String,
        found: String,
    },
}

/// Errors during decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    UnregisteredType(#[from] UnregisteredType),

    #[error("resource at {pointer} has id \"{id}\" which is not a valid {type_name} id")]
    InvalidId {
        pointer: String,
        type_name: String,
        id: String,
    },

    // Error responses (exit code 1)
    #[error("document carries {} error(s)", errors.len())]
    ErrorDocument { errors: Vec<ErrorObject> },
}

impl DecodeError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            DecodeError::ErrorDocument { .. } => 1,
            _ => 2,
        }
    }
}

/// A [`NodeId`](crate::NodeId) used with a graph it does not belong to.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("node #{index} does not belong to this graph")]
pub struct UnknownNode {
    pub index: usize,
}

/// Errors during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("node #{index} does not belong to this graph")]
    UnknownNode { index: usize },

    #[error(transparent)]
    UnregisteredType(#[from] UnregisteredType),

    #[error("resource of type '{type_name}' has no id and cannot be linked")]
    MissingIdentity { type_name: String },

    #[error("relationship '{relationship}' of type '{type_name}' is declared {expected:?} but holds a different shape")]
    CardinalityMismatch {
        type_name: String,
        relationship: String,
        expected: Cardinality,
    },

    #[error("relationship '{relationship}' of type '{type_name}' targets '{expected}' but links a '{found}'")]
    TargetMismatch {
        type_name: String,
        relationship: String,
        expected: String,
        found: String,
    },

    #[error("failed to serialize document: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors converting between typed models and resources.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model for type '{type_name}' does not serialize to a JSON object")]
    NotAnObject { type_name: String },

    #[error("model for type '{type_name}' has invalid id value {value}")]
    InvalidId { type_name: String, value: String },

    #[error("model conversion for type '{type_name}' failed: {source}")]
    Json {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors loading documents and type definitions.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid type definitions: {source}")]
    InvalidDefinitions {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Single entry of a document's `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

/// References to the part of the request that caused an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// JSON Pointer (RFC 6901) into the request document.
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub pointer: Option<String>,
    /// Query parameter that caused the error.
    #[serde(
        default,
        deserialize_with = "scalar_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter: Option<String>,
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = &self.status {
            write!(f, "[{}] ", status)?;
        }
        let title = self.title.as_deref().or(self.code.as_deref());
        match (title, &self.detail) {
            (Some(title), Some(detail)) => write!(f, "{}: {}", title, detail)?,
            (Some(title), None) => f.write_str(title)?,
            (None, Some(detail)) => f.write_str(detail)?,
            (None, None) => f.write_str("unspecified error")?,
        }
        if let Some(pointer) = self.source.as_ref().and_then(|s| s.pointer.as_deref()) {
            write!(f, " (at {})", pointer)?;
        }
        Ok(())
    }
}

// Servers send numbers and booleans where text is expected; keep their text.
fn scalar_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_error_exit_codes() {
        let err = DecodeError::ErrorDocument { errors: vec![] };
        assert_eq!(err.exit_code(), 1);

        let err = DecodeError::Shape(ShapeError::MissingData);
        assert_eq!(err.exit_code(), 2);

        let err = DecodeError::UnregisteredType(UnregisteredType {
            type_name: "ghosts".into(),
        });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("doc.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::Registration(RegistrationError::MissingTypeName { index: 0 });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn error_object_accepts_numeric_status() {
        let parsed: ErrorObject = serde_json::from_value(json!({
            "status": 422,
            "code": "invalid",
            "title": "Invalid Attribute",
            "source": { "pointer": "/data/attributes/name" }
        }))
        .unwrap();

        assert_eq!(parsed.status.as_deref(), Some("422"));
        assert_eq!(parsed.code.as_deref(), Some("invalid"));
        assert_eq!(
            parsed.source.unwrap().pointer.as_deref(),
            Some("/data/attributes/name")
        );
    }

    #[test]
    fn error_object_reads_every_scalar_member_as_text() {
        let parsed: ErrorObject = serde_json::from_value(json!({
            "code": 17,
            "title": 422,
            "detail": true,
            "source": { "pointer": 5, "parameter": ["nested"] }
        }))
        .unwrap();

        assert_eq!(parsed.code.as_deref(), Some("17"));
        assert_eq!(parsed.title.as_deref(), Some("422"));
        assert_eq!(parsed.detail.as_deref(), Some("true"));
        let source = parsed.source.unwrap();
        assert_eq!(source.pointer.as_deref(), Some("5"));
        assert_eq!(source.parameter, None);
    }

    #[test]
    fn error_object_display() {
        let err = ErrorObject {
            status: Some("404".into()),
            title: Some("Not Found".into()),
            detail: Some("no user 7".into()),
            source: Some(ErrorSource {
                pointer: None,
                parameter: Some("id".into()),
            }),
            ..Default::default()
        };
        assert_eq!(err.to_string(), "[404] Not Found: no user 7");
    }

    #[test]
    fn error_document_display_counts_entries() {
        let err = DecodeError::ErrorDocument {
            errors: vec![ErrorObject::default(), ErrorObject::default()],
        };
        assert_eq!(err.to_string(), "document carries 2 error(s)");
    }
}
