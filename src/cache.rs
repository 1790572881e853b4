//! Per-decode identifier cache.

use std::collections::HashMap;

use crate::graph::NodeId;
use crate::types::Identifier;

/// Maps document identifiers to the node decoded for them.
///
/// Lives for exactly one decode call. A node is inserted before its
/// relationships are resolved, so a cycle finds the live node on its second
/// visit instead of decoding it again.
#[derive(Debug, Default)]
pub(crate) struct IdentifierCache {
    entries: HashMap<Identifier, NodeId>,
}

impl IdentifierCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, identifier: &Identifier) -> Option<NodeId> {
        let hit = self.entries.get(identifier).copied();
        if hit.is_some() {
            tracing::trace!(%identifier, "identifier cache hit");
        }
        hit
    }

    pub(crate) fn contains(&self, identifier: &Identifier) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Record `node` for `identifier`. The first insert wins.
    pub(crate) fn insert(&mut self, identifier: Identifier, node: NodeId) -> NodeId {
        *self.entries.entry(identifier).or_insert(node)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Resource, ResourceGraph};

    #[test]
    fn first_insert_wins() {
        let mut graph = ResourceGraph::new();
        let first = graph.insert(Resource::new("roles").with_id(1));
        let second = graph.insert(Resource::new("roles").with_id(1));

        let mut cache = IdentifierCache::new();
        let key = Identifier::new("roles", "1");
        assert_eq!(cache.insert(key.clone(), first), first);
        assert_eq!(cache.insert(key.clone(), second), first);
        assert_eq!(cache.get(&key), Some(first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_distinguish_type_and_id() {
        let mut graph = ResourceGraph::new();
        let node = graph.insert(Resource::new("roles").with_id(1));

        let mut cache = IdentifierCache::new();
        cache.insert(Identifier::new("roles", "1"), node);

        assert!(cache.contains(&Identifier::new("roles", "1")));
        assert!(!cache.contains(&Identifier::new("users", "1")));
        assert!(!cache.contains(&Identifier::new("roles", "01")));
    }
}
