//! In-memory resource graph.
//!
//! Nodes live in an arena owned by [`ResourceGraph`] and refer to each other
//! through [`NodeId`] handles, so shared references and relationship cycles
//! need no reference counting. Two positions holding the same `NodeId` hold
//! the same instance.

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::UnknownNode;
use crate::types::{Id, Identifier};

/// Handle to a node in a [`ResourceGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Value of one relationship on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Related {
    One(NodeId),
    Many(Vec<NodeId>),
}

impl Related {
    /// Referenced nodes in order.
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Related::One(node) => std::slice::from_ref(node),
            Related::Many(nodes) => nodes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }
}

/// One resource instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Id>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    relationships: BTreeMap<String, Related>,
}

impl Resource {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: None,
            attributes: Map::new(),
            relationships: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Id>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Option<Id>) {
        self.id = id;
    }

    /// Document identifier, if the resource has an id.
    pub fn identifier(&self) -> Option<Identifier> {
        self.id
            .as_ref()
            .map(|id| Identifier::new(self.type_name.clone(), id.to_string()))
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn relationships(&self) -> &BTreeMap<String, Related> {
        &self.relationships
    }

    pub fn related(&self, name: &str) -> Option<&Related> {
        self.relationships.get(name)
    }

    pub fn set_related(&mut self, name: impl Into<String>, related: Related) {
        self.relationships.insert(name.into(), related);
    }
}

/// Arena of resources connected by relationships.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceGraph {
    nodes: Vec<Resource>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: Resource) -> NodeId {
        self.nodes.push(resource);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, node: NodeId) -> Option<&Resource> {
        self.nodes.get(node.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Resource)> {
        self.nodes.iter().enumerate().map(|(i, r)| (NodeId(i), r))
    }

    /// Point a single-valued relationship at `target`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` if either handle is not part of this graph.
    pub fn relate_one(
        &mut self,
        from: NodeId,
        name: impl Into<String>,
        target: NodeId,
    ) -> Result<(), UnknownNode> {
        self.ensure_contains(target)?;
        self.resource_mut(from)?.set_related(name, Related::One(target));
        Ok(())
    }

    /// Set a multi-valued relationship.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` if any handle is not part of this graph.
    pub fn relate_many(
        &mut self,
        from: NodeId,
        name: impl Into<String>,
        targets: Vec<NodeId>,
    ) -> Result<(), UnknownNode> {
        for &target in &targets {
            self.ensure_contains(target)?;
        }
        self.resource_mut(from)?.set_related(name, Related::Many(targets));
        Ok(())
    }

    /// Target of a single-valued relationship.
    pub fn related_one(&self, from: NodeId, name: &str) -> Option<NodeId> {
        match self.get(from)?.related(name)? {
            Related::One(node) => Some(*node),
            Related::Many(_) => None,
        }
    }

    /// Targets of a relationship; empty when unset.
    pub fn related_many(&self, from: NodeId, name: &str) -> &[NodeId] {
        self.get(from)
            .and_then(|resource| resource.related(name))
            .map(Related::nodes)
            .unwrap_or(&[])
    }

    fn ensure_contains(&self, node: NodeId) -> Result<(), UnknownNode> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(UnknownNode { index: node.0 })
        }
    }

    fn resource_mut(&mut self, node: NodeId) -> Result<&mut Resource, UnknownNode> {
        self.nodes
            .get_mut(node.0)
            .ok_or(UnknownNode { index: node.0 })
    }
}

impl Index<NodeId> for ResourceGraph {
    type Output = Resource;

    fn index(&self, node: NodeId) -> &Resource {
        &self.nodes[node.0]
    }
}

impl IndexMut<NodeId> for ResourceGraph {
    fn index_mut(&mut self, node: NodeId) -> &mut Resource {
        &mut self.nodes[node.0]
    }
}
