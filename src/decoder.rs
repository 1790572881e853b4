//! Decoding wire documents into resource graphs.
//!
//! Decoding runs in three steps: shape validation, a two-phase pass over
//! `included` (create every bare resource, then resolve their
//! relationships), and finally the primary data. Every resource is cached
//! under its identifier before its relationships are resolved, so cyclic and
//! repeated references resolve to the node that already exists.
//!
//! Relationship problems never fail the document: a linkage that is
//! malformed, names an unregistered or unexpected type, or carries an
//! unconvertible id leaves that value empty.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cache::IdentifierCache;
use crate::error::{DecodeError, ShapeError};
use crate::graph::{NodeId, Related, Resource, ResourceGraph};
use crate::registry::{Registry, Relationship, ResourceType};
use crate::types::{
    json_type_name, scalar_text, Cardinality, Identifier, ATTRIBUTES, DATA, ID, INCLUDED,
    RELATIONSHIPS, TYPE,
};
use crate::validator::{
    ensure_collection_shape, ensure_not_error_document, ensure_object_shape,
    is_relationship_linkage_well_formed,
};

/// Result of a decode call: the graph and its primary node(s).
#[derive(Debug, Clone, Serialize)]
pub struct Decoded<T> {
    pub data: T,
    #[serde(rename = "resources")]
    pub graph: ResourceGraph,
}

impl Decoded<NodeId> {
    /// The primary resource.
    pub fn resource(&self) -> &Resource {
        &self.graph[self.data]
    }
}

impl Decoded<Vec<NodeId>> {
    /// Primary resources in document order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.data.iter().map(|&node| &self.graph[node])
    }
}

/// Decode a document whose `data` is a single resource of `type_name`.
///
/// # Errors
///
/// Returns `DecodeError` if the bytes are not JSON, the document is an error
/// document, the envelope is malformed, `type_name` is not registered, or the
/// primary id cannot be converted.
pub fn decode_one(
    registry: &Registry,
    bytes: &[u8],
    type_name: &str,
) -> Result<Decoded<NodeId>, DecodeError> {
    let document = parse_document(bytes)?;
    decode_one_value(registry, &document, type_name)
}

/// Decode a document whose `data` is an array of resources of `type_name`.
///
/// # Errors
///
/// Same conditions as [`decode_one`], with `data` required to be an array.
pub fn decode_many(
    registry: &Registry,
    bytes: &[u8],
    type_name: &str,
) -> Result<Decoded<Vec<NodeId>>, DecodeError> {
    let document = parse_document(bytes)?;
    decode_many_value(registry, &document, type_name)
}

/// [`decode_one`] over an already parsed document.
pub fn decode_one_value(
    registry: &Registry,
    document: &Value,
    type_name: &str,
) -> Result<Decoded<NodeId>, DecodeError> {
    ensure_not_error_document(document)?;
    let data = ensure_object_shape(document)?;
    let resource_type = registry.describe(type_name)?;

    let mut decoder = Decoder::new(registry);
    decoder.load_included(document)?;
    let node = decoder.decode_primary(data, resource_type, "/data")?;
    Ok(decoder.finish(node))
}

/// [`decode_many`] over an already parsed document.
pub fn decode_many_value(
    registry: &Registry,
    document: &Value,
    type_name: &str,
) -> Result<Decoded<Vec<NodeId>>, DecodeError> {
    ensure_not_error_document(document)?;
    let Some(items) = ensure_collection_shape(document)?.as_array() else {
        return Err(ShapeError::ExpectedArray.into());
    };
    let resource_type = registry.describe(type_name)?;

    let mut decoder = Decoder::new(registry);
    decoder.load_included(document)?;
    let mut nodes = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let pointer = format!("/data/{}", i);
        nodes.push(decoder.decode_primary(item, resource_type, &pointer)?);
    }
    Ok(decoder.finish(nodes))
}

fn parse_document(bytes: &[u8]) -> Result<Value, DecodeError> {
    serde_json::from_slice(bytes).map_err(|source| DecodeError::InvalidJson { source })
}

/// State of a single decode call.
struct Decoder<'r> {
    registry: &'r Registry,
    graph: ResourceGraph,
    cache: IdentifierCache,
}

impl<'r> Decoder<'r> {
    fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            graph: ResourceGraph::new(),
            cache: IdentifierCache::new(),
        }
    }

    fn finish<T>(self, data: T) -> Decoded<T> {
        Decoded {
            data,
            graph: self.graph,
        }
    }

    fn load_included(&mut self, document: &Value) -> Result<(), ShapeError> {
        let included = match document.get(INCLUDED) {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ShapeError::InvalidIncluded {
                    actual: json_type_name(other).to_string(),
                })
            }
        };

        // Phase A: every included resource exists and is cached before any
        // relationship is looked at.
        let mut pending = Vec::with_capacity(included.len());
        for (index, object) in included.iter().enumerate() {
            if let Some((node, resource_type)) = self.bare_included(index, object) {
                pending.push((node, resource_type, object));
            }
        }

        // Phase B
        for (node, resource_type, object) in pending {
            self.resolve_relationships(node, resource_type, object);
        }
        Ok(())
    }

    fn bare_included(
        &mut self,
        index: usize,
        object: &Value,
    ) -> Option<(NodeId, &'r ResourceType)> {
        let registry = self.registry;

        let Some(type_name) = object.get(TYPE).and_then(Value::as_str) else {
            debug!(index, "skipping included resource without a type");
            return None;
        };
        let Some(resource_type) = registry.resolve_type(type_name) else {
            debug!(index, type_name, "skipping included resource of unregistered type");
            return None;
        };
        let raw_id = object
            .get(ID)
            .and_then(scalar_text)
            .filter(|id| !id.is_empty());
        let Some(raw_id) = raw_id else {
            debug!(index, type_name, "skipping included resource without an id");
            return None;
        };
        let Some(id) = resource_type.id_field().kind.parse(&raw_id) else {
            debug!(index, type_name, id = %raw_id, "skipping included resource with invalid id");
            return None;
        };
        let Some(attributes) = attributes_of(object, resource_type) else {
            debug!(index, type_name, "skipping included resource with malformed attributes");
            return None;
        };

        let identifier = Identifier::new(type_name, raw_id);
        if self.cache.contains(&identifier) {
            debug!(index, %identifier, "skipping duplicate included resource");
            return None;
        }

        let node = self.graph.insert(
            Resource::new(type_name)
                .with_id(id)
                .with_attributes(attributes),
        );
        self.cache.insert(identifier, node);
        Some((node, resource_type))
    }

    fn decode_primary(
        &mut self,
        object: &Value,
        resource_type: &ResourceType,
        pointer: &str,
    ) -> Result<NodeId, DecodeError> {
        if !object.is_object() {
            return Err(ShapeError::MalformedResource {
                pointer: pointer.to_string(),
                message: format!("expected a resource object, got {}", json_type_name(object)),
            }
            .into());
        }

        let type_name = resource_type.type_name();
        if let Some(found) = object.get(TYPE) {
            if found.as_str() != Some(type_name) {
                return Err(ShapeError::TypeMismatch {
                    pointer: pointer.to_string(),
                    expected: type_name.to_string(),
                    found: scalar_text(found).unwrap_or_else(|| json_type_name(found).to_string()),
                }
                .into());
            }
        }

        let attributes =
            attributes_of(object, resource_type).ok_or_else(|| ShapeError::MalformedResource {
                pointer: format!("{}/{}", pointer, ATTRIBUTES),
                message: "'attributes' must be an object".to_string(),
            })?;

        let raw_id = object
            .get(ID)
            .and_then(scalar_text)
            .filter(|id| !id.is_empty());

        let node = match raw_id {
            Some(raw_id) => {
                let id = resource_type.id_field().kind.parse(&raw_id).ok_or_else(|| {
                    DecodeError::InvalidId {
                        pointer: format!("{}/{}", pointer, ID),
                        type_name: type_name.to_string(),
                        id: raw_id.clone(),
                    }
                })?;
                let identifier = Identifier::new(type_name, raw_id);
                match self.cache.get(&identifier) {
                    // Already seen in `included`, as a linkage, or earlier in
                    // `data`: the primary attributes take precedence.
                    Some(existing) => {
                        self.graph[existing].attributes_mut().extend(attributes);
                        existing
                    }
                    None => {
                        let node = self.graph.insert(
                            Resource::new(type_name)
                                .with_id(id)
                                .with_attributes(attributes),
                        );
                        self.cache.insert(identifier, node)
                    }
                }
            }
            None => self
                .graph
                .insert(Resource::new(type_name).with_attributes(attributes)),
        };

        self.resolve_relationships(node, resource_type, object);
        Ok(node)
    }

    fn resolve_relationships(
        &mut self,
        node: NodeId,
        resource_type: &ResourceType,
        object: &Value,
    ) {
        let Some(relationships) = object.get(RELATIONSHIPS).and_then(Value::as_object) else {
            return;
        };

        for (name, relationship) in relationships {
            let Some(descriptor) = resource_type.relationship(name) else {
                tracing::trace!(
                    type_name = resource_type.type_name(),
                    relationship = %name,
                    "ignoring undeclared relationship"
                );
                continue;
            };
            if let Some(related) = self.resolve_relationship(descriptor, relationship) {
                self.graph[node].set_related(name.clone(), related);
            }
        }
    }

    fn resolve_relationship(
        &mut self,
        descriptor: &Relationship,
        relationship: &Value,
    ) -> Option<Related> {
        let data = relationship.get(DATA)?;
        match (descriptor.cardinality, data) {
            (_, Value::Null) => None,
            (Cardinality::One, Value::Object(_)) => {
                self.resolve_linkage(descriptor, data).map(Related::One)
            }
            (Cardinality::Many, Value::Array(linkages)) => {
                let mut nodes: Vec<NodeId> = Vec::with_capacity(linkages.len());
                for linkage in linkages {
                    if let Some(node) = self.resolve_linkage(descriptor, linkage) {
                        // Repeated linkages name the same resource once.
                        if !nodes.contains(&node) {
                            nodes.push(node);
                        }
                    }
                }
                Some(Related::Many(nodes))
            }
            (cardinality, other) => {
                debug!(
                    relationship = %descriptor.name,
                    ?cardinality,
                    actual = json_type_name(other),
                    "relationship data does not match declared cardinality"
                );
                None
            }
        }
    }

    fn resolve_linkage(&mut self, descriptor: &Relationship, linkage: &Value) -> Option<NodeId> {
        if !is_relationship_linkage_well_formed(linkage) {
            debug!(relationship = %descriptor.name, "skipping malformed relationship linkage");
            return None;
        }
        let type_name = scalar_text(&linkage[TYPE])?;
        let raw_id = scalar_text(&linkage[ID])?;

        if type_name != descriptor.target {
            debug!(
                relationship = %descriptor.name,
                expected = %descriptor.target,
                found = %type_name,
                "relationship linkage names an unexpected type"
            );
            return None;
        }

        let identifier = Identifier::new(type_name, raw_id);
        if let Some(node) = self.cache.get(&identifier) {
            return Some(node);
        }

        // Not part of the document: decode the linkage itself into an
        // identity-only resource.
        let registry = self.registry;
        let Some(target) = registry.resolve_type(identifier.type_name()) else {
            debug!(%identifier, "relationship linkage names an unregistered type");
            return None;
        };
        let Some(id) = target.id_field().kind.parse(identifier.id()) else {
            debug!(%identifier, "relationship linkage has an invalid id");
            return None;
        };

        let node = self.graph.insert(Resource::new(target.type_name()).with_id(id));
        Some(self.cache.insert(identifier, node))
    }
}

/// Attribute members of a resource object, minus identity and relationships.
///
/// Returns `None` if `attributes` is present but not an object.
fn attributes_of(object: &Value, resource_type: &ResourceType) -> Option<Map<String, Value>> {
    match object.get(ATTRIBUTES) {
        None | Some(Value::Null) => Some(Map::new()),
        Some(Value::Object(attributes)) => Some(
            attributes
                .iter()
                .filter(|(name, _)| resource_type.is_attribute(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        ),
        Some(_) => None,
    }
}
