//! JSON:API resource resolver
//!
//! Bidirectional conversion between JSON:API documents and resource graphs.
//!
//! A [`Registry`] describes each resource type once: its wire type name,
//! identity field, and relationships. Decoding turns a document into a
//! [`ResourceGraph`], resolving linkages against `included` resources so a
//! resource referenced from several places becomes a single node, and cyclic
//! references terminate. Encoding walks the graph back into a document.
//!
//! # Example
//!
//! ```
//! use jsonapi_resolver::{decode_one, encode_one_value, IdKind, Registry, Relationship, TypeDefinition};
//! use serde_json::json;
//!
//! let registry = Registry::new([
//!     TypeDefinition::new("users")
//!         .id("id", IdKind::Integer)
//!         .relationship(Relationship::many("roles", "roles")),
//!     TypeDefinition::new("roles").id("id", IdKind::Integer),
//! ])
//! .unwrap();
//!
//! let doc = json!({
//!     "data": {
//!         "type": "users",
//!         "id": "1",
//!         "attributes": { "name": "Ann" },
//!         "relationships": {
//!             "roles": { "data": [{ "type": "roles", "id": "1" }, { "type": "roles", "id": "1" }] }
//!         }
//!     },
//!     "included": [{ "type": "roles", "id": "1", "attributes": { "title": "ADMIN" } }]
//! });
//!
//! let decoded = decode_one(&registry, doc.to_string().as_bytes(), "users").unwrap();
//! let roles = decoded.graph.related_many(decoded.data, "roles");
//!
//! // Both linkages name the same role: one node.
//! assert_eq!(roles.len(), 1);
//! assert_eq!(decoded.graph[roles[0]].attribute("title"), Some(&json!("ADMIN")));
//!
//! let encoded = encode_one_value(&registry, &decoded.graph, decoded.data).unwrap();
//! assert_eq!(encoded["data"]["relationships"]["roles"]["data"][0]["id"], "1");
//! ```
//!
//! # Failure policy
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | `errors` member present | [`DecodeError::ErrorDocument`] with parsed errors |
//! | `data` missing, scalar, or wrong cardinality | [`DecodeError::Shape`] |
//! | requested type not registered | [`DecodeError::UnregisteredType`] |
//! | bad linkage, unknown target type | relationship left unset |

mod cache;
mod decoder;
mod encoder;
mod error;
mod graph;
mod loader;
mod model;
mod registry;
mod types;
mod validator;

pub use decoder::{decode_many, decode_many_value, decode_one, decode_one_value, Decoded};
pub use encoder::{encode_many, encode_many_value, encode_one, encode_one_value};
pub use error::{
    DecodeError, EncodeError, ErrorObject, ErrorSource, LoadError, ModelError, RegistrationError,
    ShapeError, UnknownNode, UnregisteredType,
};
pub use graph::{NodeId, Related, Resource, ResourceGraph};
pub use loader::{
    is_url, load_document, load_document_auto, load_document_str, load_registry,
    load_registry_str,
};
pub use registry::{IdField, Registry, Relationship, ResourceType, TypeDefinition};
pub use types::{json_type_name, Cardinality, Id, IdKind, Identifier};
pub use validator::{
    ensure_collection_shape, ensure_not_error_document, ensure_object_shape,
    is_relationship_linkage_well_formed, parse_errors,
};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
