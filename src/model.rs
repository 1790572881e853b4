//! Conversion between typed domain structs and resources.
//!
//! A model serializes to a flat JSON object holding its identity field and
//! attributes. The [`ResourceType`] descriptor decides which member is the
//! identity; relationships are kept in the graph rather than on the struct.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ModelError;
use crate::graph::Resource;
use crate::registry::ResourceType;

impl ResourceType {
    /// Build a resource from a typed model.
    ///
    /// The identity field member is converted to the declared id kind; a
    /// `null` or missing identity leaves the id unset. Members named like a
    /// relationship are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the model does not serialize to an object or
    /// its identity value cannot be converted.
    pub fn resource_from_model<T: Serialize>(&self, model: &T) -> Result<Resource, ModelError> {
        let value = serde_json::to_value(model).map_err(|source| ModelError::Json {
            type_name: self.type_name().to_string(),
            source,
        })?;
        let Value::Object(mut fields) = value else {
            return Err(ModelError::NotAnObject {
                type_name: self.type_name().to_string(),
            });
        };

        let id_field = self.id_field();
        let id = match fields.remove(&id_field.name) {
            None | Some(Value::Null) => None,
            Some(raw) => Some(id_field.kind.from_json(&raw).ok_or_else(|| {
                ModelError::InvalidId {
                    type_name: self.type_name().to_string(),
                    value: raw.to_string(),
                }
            })?),
        };

        fields.retain(|name, _| self.is_attribute(name));

        let mut resource = Resource::new(self.type_name()).with_attributes(fields);
        resource.set_id(id);
        Ok(resource)
    }

    /// Project a resource's identity and attributes onto a typed model.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Json` if the attributes do not deserialize into `T`.
    pub fn to_model<T: DeserializeOwned>(&self, resource: &Resource) -> Result<T, ModelError> {
        let mut fields = resource.attributes().clone();
        if let Some(id) = resource.id() {
            fields.insert(self.id_field().name.clone(), id.to_json());
        }

        serde_json::from_value(Value::Object(fields)).map_err(|source| ModelError::Json {
            type_name: self.type_name().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::registry::{Registry, Relationship, TypeDefinition};
    use crate::types::{Id, IdKind};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Role {
        id: Option<i64>,
        title: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        id: i64,
        name: String,
        #[serde(default, skip_deserializing)]
        roles: Vec<String>,
    }

    fn registry() -> Registry {
        Registry::new([
            TypeDefinition::new("roles").id("id", IdKind::Integer),
            TypeDefinition::new("users")
                .id("id", IdKind::Integer)
                .relationship(Relationship::many("roles", "roles")),
        ])
        .unwrap()
    }

    #[test]
    fn model_round_trip() {
        let registry = registry();
        let roles = registry.describe("roles").unwrap();
        let admin = Role {
            id: Some(1),
            title: "ADMIN".into(),
        };

        let resource = roles.resource_from_model(&admin).unwrap();
        assert_eq!(resource.id(), Some(&Id::Integer(1)));
        assert_eq!(resource.attribute("title"), Some(&json!("ADMIN")));
        assert!(resource.attribute("id").is_none());

        let back: Role = roles.to_model(&resource).unwrap();
        assert_eq!(back, admin);
    }

    #[test]
    fn null_identity_leaves_id_unset() {
        let registry = registry();
        let roles = registry.describe("roles").unwrap();
        let draft = Role {
            id: None,
            title: "DRAFT".into(),
        };

        let resource = roles.resource_from_model(&draft).unwrap();
        assert!(resource.id().is_none());

        let back: Role = roles.to_model(&resource).unwrap();
        assert_eq!(back.id, None);
    }

    #[test]
    fn relationship_members_are_not_attributes() {
        let registry = registry();
        let users = registry.describe("users").unwrap();
        let user = User {
            id: 3,
            name: "Ann".into(),
            roles: vec!["ignored".into()],
        };

        let resource = users.resource_from_model(&user).unwrap();
        assert!(resource.attribute("roles").is_none());
        assert_eq!(resource.attribute("name"), Some(&json!("Ann")));
    }

    #[test]
    fn non_object_model_rejected() {
        let registry = registry();
        let roles = registry.describe("roles").unwrap();
        assert!(matches!(
            roles.resource_from_model(&"just a string"),
            Err(ModelError::NotAnObject { .. })
        ));
    }

    #[test]
    fn invalid_identity_rejected() {
        let registry = registry();
        let roles = registry.describe("roles").unwrap();
        let model = json!({ "id": "not-a-number", "title": "X" });
        assert!(matches!(
            roles.resource_from_model(&model),
            Err(ModelError::InvalidId { .. })
        ));
    }

    #[test]
    fn missing_attribute_fails_projection() {
        let registry = registry();
        let roles = registry.describe("roles").unwrap();
        let resource = Resource::new("roles").with_id(1);
        let result: Result<Role, _> = roles.to_model(&resource);
        assert!(matches!(result, Err(ModelError::Json { .. })));
    }
}
