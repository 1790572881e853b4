//! Document and type-definition loading.
//!
//! Handles loading from files, strings, and HTTP URLs.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::LoadError;
use crate::registry::{Registry, TypeDefinition};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Media type of JSON:API documents.
#[cfg(feature = "remote")]
const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    load_document_str(&content)
}

/// Load a document from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default). Error responses are
/// still parsed, since a JSON:API error document is the interesting payload.
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the body
/// isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, MEDIA_TYPE)
        .send()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    tracing::debug!(url, status = %response.status(), "fetched document");

    response.json().map_err(|source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    })
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Type definitions file: a bare array or an object with a `types` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionsFile {
    List(Vec<TypeDefinition>),
    Wrapped { types: Vec<TypeDefinition> },
}

/// Build a registry from a type definitions file.
///
/// # Errors
///
/// Returns `LoadError` if the file can't be read or parsed, or if the
/// definitions fail registration.
pub fn load_registry(path: &Path) -> Result<Registry, LoadError> {
    let content = read_file(path)?;
    load_registry_str(&content)
}

/// Build a registry from type definitions JSON.
pub fn load_registry_str(content: &str) -> Result<Registry, LoadError> {
    let file: DefinitionsFile = serde_json::from_str(content)
        .map_err(|source| LoadError::InvalidDefinitions { source })?;
    let definitions = match file {
        DefinitionsFile::List(types) | DefinitionsFile::Wrapped { types } => types,
    };
    Ok(Registry::new(definitions)?)
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}
