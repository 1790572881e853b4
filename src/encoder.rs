//! Encoding resource graphs into wire documents.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::EncodeError;
use crate::graph::{NodeId, Related, Resource, ResourceGraph};
use crate::registry::{Registry, Relationship, ResourceType};
use crate::types::{Cardinality, Identifier, ATTRIBUTES, DATA, ID, INCLUDED, RELATIONSHIPS, TYPE};

/// Encode `node` as a single-resource document.
///
/// Relationships marked as included also embed their targets, once each,
/// in the top-level `included` array.
///
/// # Errors
///
/// Returns `EncodeError` if a node is missing from the graph, a type is not
/// registered, a linked resource has no id, or a relationship value does not
/// match its declared cardinality or target type.
pub fn encode_one(
    registry: &Registry,
    graph: &ResourceGraph,
    node: NodeId,
) -> Result<Vec<u8>, EncodeError> {
    let document = encode_one_value(registry, graph, node)?;
    serde_json::to_vec(&document).map_err(|source| EncodeError::Json { source })
}

/// Encode `nodes` as a collection document.
///
/// Each resource carries its relationship linkages, but no `included`
/// section is produced for collections.
///
/// # Errors
///
/// Same conditions as [`encode_one`].
pub fn encode_many(
    registry: &Registry,
    graph: &ResourceGraph,
    nodes: &[NodeId],
) -> Result<Vec<u8>, EncodeError> {
    let document = encode_many_value(registry, graph, nodes)?;
    serde_json::to_vec(&document).map_err(|source| EncodeError::Json { source })
}

/// [`encode_one`] producing a JSON tree.
pub fn encode_one_value(
    registry: &Registry,
    graph: &ResourceGraph,
    node: NodeId,
) -> Result<Value, EncodeError> {
    let encoder = Encoder { registry, graph };
    let (resource, resource_type) = encoder.lookup(node)?;

    let mut document = Map::new();
    document.insert(
        DATA.to_string(),
        encoder.resource_object(resource, resource_type)?,
    );

    let included = encoder.included(resource, resource_type)?;
    if !included.is_empty() {
        document.insert(INCLUDED.to_string(), Value::Array(included));
    }

    Ok(Value::Object(document))
}

/// [`encode_many`] producing a JSON tree.
pub fn encode_many_value(
    registry: &Registry,
    graph: &ResourceGraph,
    nodes: &[NodeId],
) -> Result<Value, EncodeError> {
    let encoder = Encoder { registry, graph };

    let data = nodes
        .iter()
        .map(|&node| {
            let (resource, resource_type) = encoder.lookup(node)?;
            encoder.resource_object(resource, resource_type)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut document = Map::new();
    document.insert(DATA.to_string(), Value::Array(data));
    Ok(Value::Object(document))
}

struct Encoder<'a> {
    registry: &'a Registry,
    graph: &'a ResourceGraph,
}

impl<'a> Encoder<'a> {
    fn lookup(&self, node: NodeId) -> Result<(&'a Resource, &'a ResourceType), EncodeError> {
        let resource = self
            .graph
            .get(node)
            .ok_or(EncodeError::UnknownNode {
                index: node.index(),
            })?;
        let resource_type = self.registry.describe(resource.type_name())?;
        Ok((resource, resource_type))
    }

    fn identifier(&self, resource: &Resource) -> Result<Identifier, EncodeError> {
        resource
            .identifier()
            .ok_or_else(|| EncodeError::MissingIdentity {
                type_name: resource.type_name().to_string(),
            })
    }

    fn resource_object(
        &self,
        resource: &Resource,
        resource_type: &ResourceType,
    ) -> Result<Value, EncodeError> {
        let mut object = Map::new();
        object.insert(
            TYPE.to_string(),
            Value::String(resource_type.type_name().to_string()),
        );
        if let Some(id) = resource.id() {
            object.insert(ID.to_string(), Value::String(id.to_string()));
        }

        let attributes: Map<String, Value> = resource
            .attributes()
            .iter()
            .filter(|(name, _)| resource_type.is_attribute(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if !attributes.is_empty() {
            object.insert(ATTRIBUTES.to_string(), Value::Object(attributes));
        }

        let mut relationships = Map::new();
        for descriptor in resource_type.relationships() {
            let Some(related) = resource.related(&descriptor.name) else {
                continue;
            };

            let data = match (descriptor.cardinality, related) {
                (Cardinality::One, Related::One(node)) => {
                    self.linkage(resource_type, descriptor, *node)?
                }
                // Empty sequences are left out entirely.
                (Cardinality::Many, Related::Many(_)) if related.is_empty() => continue,
                (Cardinality::Many, Related::Many(nodes)) => Value::Array(
                    nodes
                        .iter()
                        .map(|&node| self.linkage(resource_type, descriptor, node))
                        .collect::<Result<_, _>>()?,
                ),
                (expected, _) => {
                    return Err(EncodeError::CardinalityMismatch {
                        type_name: resource_type.type_name().to_string(),
                        relationship: descriptor.name.clone(),
                        expected,
                    })
                }
            };

            let mut relationship = Map::new();
            relationship.insert(DATA.to_string(), data);
            relationships.insert(descriptor.name.clone(), Value::Object(relationship));
        }
        if !relationships.is_empty() {
            object.insert(RELATIONSHIPS.to_string(), Value::Object(relationships));
        }

        Ok(Value::Object(object))
    }

    /// Identifier object for `node`, which must be of the relationship's target type.
    fn linkage(
        &self,
        owner: &ResourceType,
        descriptor: &Relationship,
        node: NodeId,
    ) -> Result<Value, EncodeError> {
        let (resource, target_type) = self.lookup(node)?;
        if target_type.type_name() != descriptor.target {
            return Err(EncodeError::TargetMismatch {
                type_name: owner.type_name().to_string(),
                relationship: descriptor.name.clone(),
                expected: descriptor.target.clone(),
                found: target_type.type_name().to_string(),
            });
        }
        Ok(self.identifier(resource)?.to_linkage())
    }

    /// Full resource objects for every relationship marked as included.
    fn included(
        &self,
        primary: &Resource,
        resource_type: &ResourceType,
    ) -> Result<Vec<Value>, EncodeError> {
        let mut seen: HashSet<Identifier> = primary.identifier().into_iter().collect();
        let mut included = Vec::new();

        for descriptor in resource_type.relationships().iter().filter(|d| d.included) {
            let Some(related) = primary.related(&descriptor.name) else {
                continue;
            };
            for &node in related.nodes() {
                let (resource, target_type) = self.lookup(node)?;
                let identifier = self.identifier(resource)?;
                if seen.insert(identifier) {
                    included.push(self.resource_object(resource, target_type)?);
                }
            }
        }

        Ok(included)
    }
}
