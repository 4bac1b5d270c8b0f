use std::collections::HashMap;

use super::types::{DeviceId, Node, NodeLookup};

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    nodes: HashMap<DeviceId, Node>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self { nodes: HashMap::new() }
    }

    pub fn insert(&mut self, node: Node) -> Option<Node> {
        let previous = self.nodes.insert(node.id, node);
        if let Some(ref old) = previous {
            tracing::trace!("Node {} updated", old.id);
        }
        previous
    }

    pub fn remove(&mut self, id: DeviceId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name.as_deref() == Some(name))
    }

    pub fn ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<_> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }
}

impl NodeLookup for DeviceRegistry {
    fn lookup_by_id(&self, id: DeviceId) -> Option<&Node> {
        self.nodes.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(id: u32, name: &str) -> Node {
        let mut node = Node::new(DeviceId(id));
        node.name = Some(name.to_string());
        node
    }

    #[test]
    fn test_registry_new() {
        let registry = DeviceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_registry_insert_and_lookup() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.insert(named(5, "speakers")).is_none());

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.lookup_by_id(DeviceId(5)).map(|n| n.label()), Some("speakers"));
    }

    #[test]
    fn test_registry_insert_replace() {
        let mut registry = DeviceRegistry::new();
        registry.insert(named(5, "speakers"));
        let old = registry.insert(named(5, "headphones"));

        assert_eq!(registry.count(), 1);
        assert_eq!(old.and_then(|n| n.name), Some("speakers".to_string()));
        assert_eq!(registry.find_by_name("headphones").map(|n| n.id), Some(DeviceId(5)));
    }

    #[test]
    fn test_registry_lookup_unknown() {
        let mut registry = DeviceRegistry::new();
        registry.insert(named(5, "speakers"));

        assert!(registry.lookup_by_id(DeviceId(6)).is_none());
        assert!(registry.lookup_by_id(DeviceId::INVALID).is_none());
    }

    #[test]
    fn test_registry_remove() {
        let mut registry = DeviceRegistry::new();
        registry.insert(named(5, "speakers"));
        registry.insert(named(7, "hdmi"));

        assert!(registry.remove(DeviceId(5)).is_some());
        assert!(registry.remove(DeviceId(5)).is_none());
        assert_eq!(registry.ids(), vec![DeviceId(7)]);
    }
}
