//! Resource type registry.
//!
//! Type metadata is declared up front as [`TypeDefinition`]s and validated
//! once by [`Registry::new`]. The resulting registry is immutable and can be
//! shared across threads and calls.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, UnregisteredType};
use crate::types::{Cardinality, IdKind};

/// Identity field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdField {
    pub name: String,
    #[serde(default)]
    pub kind: IdKind,
}

impl IdField {
    pub fn new(name: impl Into<String>, kind: IdKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Relationship descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    /// Wire type name of the related resources.
    pub target: String,
    pub cardinality: Cardinality,
    /// Embed related resources in `included` when encoding.
    #[serde(default)]
    pub included: bool,
}

impl Relationship {
    /// Single-valued relationship.
    pub fn one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::One,
            included: false,
        }
    }

    /// Multi-valued relationship.
    pub fn many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::Many,
            included: false,
        }
    }

    /// Mark the relationship for inclusion on encode.
    pub fn included(mut self) -> Self {
        self.included = true;
        self
    }
}

/// Unvalidated declaration of a resource type.
///
/// Both the type name and the identity field are optional here so that a
/// definition file with gaps deserializes and is rejected by
/// [`Registry::new`] with a precise error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub id: Option<IdField>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl TypeDefinition {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Default::default()
        }
    }

    /// Declare the identity field.
    pub fn id(mut self, name: impl Into<String>, kind: IdKind) -> Self {
        self.id = Some(IdField::new(name, kind));
        self
    }

    /// Append a relationship descriptor.
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }
}

/// Validated metadata for one registered resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType {
    type_name: String,
    id_field: IdField,
    relationships: Vec<Relationship>,
}

impl ResourceType {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id_field(&self) -> &IdField {
        &self.id_field
    }

    /// Relationship descriptors in declaration order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// True for fields that belong in `attributes`: neither the identity
    /// field nor a relationship.
    pub fn is_attribute(&self, field: &str) -> bool {
        field != self.id_field.name && self.relationship(field).is_none()
    }
}

/// Immutable set of registered resource types.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: Vec<ResourceType>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Validate definitions and build the registry.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError` for the first definition that lacks a type
    /// name or identity field, reuses a type name, or declares conflicting
    /// relationships.
    pub fn new(
        definitions: impl IntoIterator<Item = TypeDefinition>,
    ) -> Result<Self, RegistrationError> {
        let mut registry = Registry::default();

        for (index, definition) in definitions.into_iter().enumerate() {
            let resource_type = validate_definition(index, definition)?;

            if registry.by_name.contains_key(&resource_type.type_name) {
                return Err(RegistrationError::DuplicateTypeName {
                    type_name: resource_type.type_name,
                });
            }

            tracing::trace!(type_name = %resource_type.type_name, "registered resource type");
            registry
                .by_name
                .insert(resource_type.type_name.clone(), registry.types.len());
            registry.types.push(resource_type);
        }

        Ok(registry)
    }

    /// Look up a type by wire name.
    pub fn resolve_type(&self, type_name: &str) -> Option<&ResourceType> {
        self.by_name.get(type_name).map(|&i| &self.types[i])
    }

    /// Look up a type by wire name, failing if it is unknown.
    pub fn describe(&self, type_name: &str) -> Result<&ResourceType, UnregisteredType> {
        self.resolve_type(type_name).ok_or_else(|| UnregisteredType {
            type_name: type_name.to_string(),
        })
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.by_name.contains_key(type_name)
    }

    /// Registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn validate_definition(
    index: usize,
    definition: TypeDefinition,
) -> Result<ResourceType, RegistrationError> {
    let type_name = definition
        .type_name
        .filter(|name| !name.is_empty())
        .ok_or(RegistrationError::MissingTypeName { index })?;

    let id_field = definition
        .id
        .filter(|field| !field.name.is_empty())
        .ok_or_else(|| RegistrationError::MissingIdentityField {
            type_name: type_name.clone(),
        })?;

    let mut seen = HashSet::new();
    for relationship in &definition.relationships {
        if relationship.name == id_field.name {
            return Err(RegistrationError::RelationshipShadowsIdentity {
                type_name,
                relationship: relationship.name.clone(),
            });
        }
        if !seen.insert(relationship.name.as_str()) {
            return Err(RegistrationError::DuplicateRelationship {
                type_name,
                relationship: relationship.name.clone(),
            });
        }
    }

    Ok(ResourceType {
        type_name,
        id_field,
        relationships: definition.relationships,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> TypeDefinition {
        TypeDefinition::new("users")
            .id("id", IdKind::Integer)
            .relationship(Relationship::many("roles", "roles").included())
            .relationship(Relationship::one("manager", "users"))
    }

    #[test]
    fn registers_and_describes_types() {
        let registry = Registry::new([users()]).unwrap();

        assert!(registry.is_registered("users"));
        assert!(!registry.is_registered("roles"));

        let users = registry.describe("users").unwrap();
        assert_eq!(users.id_field().name, "id");
        assert_eq!(users.id_field().kind, IdKind::Integer);
        assert_eq!(users.relationships().len(), 2);
        assert!(users.relationship("roles").unwrap().included);
        assert_eq!(
            users.relationship("manager").unwrap().cardinality,
            Cardinality::One
        );
    }

    #[test]
    fn describe_unknown_type_errors() {
        let registry = Registry::new([users()]).unwrap();
        let err = registry.describe("ghosts").unwrap_err();
        assert_eq!(err.type_name, "ghosts");
        assert!(registry.resolve_type("ghosts").is_none());
    }

    #[test]
    fn missing_type_name_reports_position() {
        let anonymous = TypeDefinition::default().id("id", IdKind::String);
        let result = Registry::new([users(), anonymous]);
        assert_eq!(
            result.unwrap_err(),
            RegistrationError::MissingTypeName { index: 1 }
        );
    }

    #[test]
    fn missing_identity_field_names_type() {
        let result = Registry::new([TypeDefinition::new("roles")]);
        assert_eq!(
            result.unwrap_err(),
            RegistrationError::MissingIdentityField {
                type_name: "roles".into()
            }
        );
    }

    #[test]
    fn duplicate_type_name_rejected() {
        let result = Registry::new([users(), users()]);
        assert!(matches!(
            result,
            Err(RegistrationError::DuplicateTypeName { type_name }) if type_name == "users"
        ));
    }

    #[test]
    fn duplicate_relationship_rejected() {
        let definition = TypeDefinition::new("users")
            .id("id", IdKind::Integer)
            .relationship(Relationship::many("roles", "roles"))
            .relationship(Relationship::one("roles", "roles"));
        assert!(matches!(
            Registry::new([definition]),
            Err(RegistrationError::DuplicateRelationship { relationship, .. }) if relationship == "roles"
        ));
    }

    #[test]
    fn relationship_cannot_reuse_identity_name() {
        let definition = TypeDefinition::new("users")
            .id("id", IdKind::Integer)
            .relationship(Relationship::one("id", "users"));
        assert!(matches!(
            Registry::new([definition]),
            Err(RegistrationError::RelationshipShadowsIdentity { .. })
        ));
    }

    #[test]
    fn attribute_set_excludes_identity_and_relationships() {
        let registry = Registry::new([users()]).unwrap();
        let users = registry.describe("users").unwrap();
        assert!(users.is_attribute("name"));
        assert!(!users.is_attribute("id"));
        assert!(!users.is_attribute("roles"));
    }

    #[test]
    fn definitions_deserialize_from_json() {
        let definitions: Vec<TypeDefinition> = serde_json::from_value(json!([
            {
                "type": "users",
                "id": { "name": "id", "kind": "integer" },
                "relationships": [
                    { "name": "roles", "target": "roles", "cardinality": "many", "included": true }
                ]
            },
            { "type": "roles", "id": { "name": "id" } }
        ]))
        .unwrap();

        let registry = Registry::new(definitions).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.describe("roles").unwrap().id_field().kind,
            IdKind::String
        );
        let names: Vec<&str> = registry.types().map(|t| t.type_name()).collect();
        assert_eq!(names, ["users", "roles"]);
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
