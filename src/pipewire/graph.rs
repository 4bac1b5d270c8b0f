use std::collections::HashMap;

use crate::session::{DefaultNodesApi, DeviceId, DeviceRegistry, MixerApi, Node, NodeLookup, SessionEvent};
use crate::volume::VolumeReading;

use super::dump::{DumpObject, MetadataEntry, NodeInfo};

pub const DEFAULT_METADATA: &str = "default";

/// Metadata key holding the default node for a media class, e.g.
/// `Audio/Sink` becomes `default.audio.sink`.
pub fn default_key(media_class: &str) -> String {
    format!("default.{}", media_class.to_ascii_lowercase().replace('/', "."))
}

#[derive(Debug, Default)]
pub struct Graph {
    registry: DeviceRegistry,
    default_metadata: Option<u32>,
    defaults: HashMap<String, String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn has_default_metadata(&self) -> bool {
        self.default_metadata.is_some()
    }

    /// Applies one batch and returns the change events it produced, in order
    /// and without duplicates.
    pub fn apply(&mut self, objects: Vec<DumpObject>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for object in objects {
            match object {
                DumpObject::Node { id, info } => self.apply_node(DeviceId(id), &info, &mut events),
                DumpObject::Metadata { id, name, entries } => {
                    if name.as_deref() == Some(DEFAULT_METADATA) {
                        self.apply_defaults(id, &entries);
                        push_unique(&mut events, SessionEvent::DefaultsChanged);
                    }
                }
                DumpObject::Removed(id) => self.apply_removal(id, &mut events),
                DumpObject::Other(_) => {}
            }
        }
        events
    }

    fn apply_node(&mut self, id: DeviceId, info: &NodeInfo, events: &mut Vec<SessionEvent>) {
        let mut node = self.registry.lookup_by_id(id).cloned().unwrap_or_else(|| Node::new(id));
        let old_name = node.name.clone();
        let old_volume = node.volume;

        if !info.props.is_empty() {
            node.name = info.prop_str("node.name").map(str::to_owned);
            node.description = info
                .prop_str("node.description")
                .or_else(|| info.prop_str("node.nick"))
                .map(str::to_owned);
            node.media_class = info.prop_str("media.class").map(str::to_owned);
        }
        if let Some(reading) = info.reading() {
            node.volume = reading;
        }

        if node.volume != old_volume && node.volume.is_some() {
            tracing::debug!("Volume of node {} is now {:?}", id, node.volume);
            push_unique(events, SessionEvent::MixerChanged(id));
        }
        if node.name != old_name && (self.is_default_name(&old_name) || self.is_default_name(&node.name)) {
            push_unique(events, SessionEvent::DefaultsChanged);
        }
        self.registry.insert(node);
    }

    fn apply_defaults(&mut self, id: u32, entries: &[MetadataEntry]) {
        self.default_metadata = Some(id);
        self.defaults = entries
            .iter()
            .filter(|e| e.subject == 0)
            .filter_map(|e| e.node_name().map(|name| (e.key.clone(), name)))
            .collect();
        tracing::debug!("Default nodes: {:?}", self.defaults);
    }

    fn apply_removal(&mut self, id: u32, events: &mut Vec<SessionEvent>) {
        if self.default_metadata == Some(id) {
            tracing::warn!("Default metadata object {} removed", id);
            self.default_metadata = None;
            self.defaults.clear();
            push_unique(events, SessionEvent::DefaultsChanged);
        }
        if let Some(node) = self.registry.remove(DeviceId(id)) {
            tracing::debug!("Node {} ({}) removed", node.id, node.label());
            if self.is_default_name(&node.name) {
                push_unique(events, SessionEvent::DefaultsChanged);
            }
        }
    }

    fn is_default_name(&self, name: &Option<String>) -> bool {
        name.as_ref().map_or(false, |n| self.defaults.values().any(|d| d == n))
    }
}

fn push_unique(events: &mut Vec<SessionEvent>, event: SessionEvent) {
    if !events.contains(&event) {
        events.push(event);
    }
}

impl NodeLookup for Graph {
    fn lookup_by_id(&self, id: DeviceId) -> Option<&Node> {
        self.registry.lookup_by_id(id)
    }
}

impl DefaultNodesApi for Graph {
    fn get_default_node(&self, media_class: &str) -> DeviceId {
        self.defaults
            .get(&default_key(media_class))
            .and_then(|name| self.registry.find_by_name(name))
            .map(|node| node.id)
            .unwrap_or(DeviceId::INVALID)
    }
}

impl MixerApi for Graph {
    fn get_volume(&self, id: DeviceId) -> Option<VolumeReading> {
        self.registry.lookup_by_id(id).and_then(|node| node.volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipewire::dump::{NodeParams, PropsParam};
    use serde_json::json;

    fn sink(id: u32, name: &str, volume: Option<f64>, mute: bool) -> DumpObject {
        let props = [
            ("node.name".to_string(), json!(name)),
            ("media.class".to_string(), json!("Audio/Sink")),
        ]
        .into_iter()
        .collect();
        let params = NodeParams {
            props: vec![PropsParam { volume, mute: Some(mute), channel_volumes: None }],
        };
        DumpObject::Node { id, info: NodeInfo { props, params: Some(params) } }
    }

    fn defaults(id: u32, sink: &str) -> DumpObject {
        DumpObject::Metadata {
            id,
            name: Some(DEFAULT_METADATA.to_string()),
            entries: vec![MetadataEntry {
                subject: 0,
                key: "default.audio.sink".to_string(),
                kind: Some("Spa:String:JSON".to_string()),
                value: json!({ "name": sink }),
            }],
        }
    }

    fn graph_with_two_sinks() -> Graph {
        let mut graph = Graph::new();
        graph.apply(vec![
            sink(5, "speakers", Some(1.0), false),
            sink(7, "headphones", Some(0.125), false),
            defaults(40, "speakers"),
        ]);
        graph
    }

    #[test]
    fn test_default_key() {
        assert_eq!(default_key("Audio/Sink"), "default.audio.sink");
        assert_eq!(default_key("Audio/Source"), "default.audio.source");
    }

    #[test]
    fn test_resolves_default_sink() {
        let graph = graph_with_two_sinks();
        assert!(graph.has_default_metadata());
        assert_eq!(graph.get_default_node("Audio/Sink"), DeviceId(5));
        assert_eq!(graph.get_default_node("Audio/Source"), DeviceId::INVALID);
        assert_eq!(graph.get_volume(DeviceId(7)), Some(VolumeReading::new(0.125)));
    }

    #[test]
    fn test_volume_change_emits_mixer_event() {
        let mut graph = graph_with_two_sinks();

        let events = graph.apply(vec![sink(7, "headphones", Some(0.5), false)]);
        assert_eq!(events, vec![SessionEvent::MixerChanged(DeviceId(7))]);

        let events = graph.apply(vec![sink(7, "headphones", Some(0.5), false)]);
        assert!(events.is_empty());

        let events = graph.apply(vec![sink(7, "headphones", Some(0.5), true)]);
        assert_eq!(events, vec![SessionEvent::MixerChanged(DeviceId(7))]);
    }

    #[test]
    fn test_metadata_update_always_emits() {
        let mut graph = graph_with_two_sinks();

        let events = graph.apply(vec![defaults(40, "speakers")]);
        assert_eq!(events, vec![SessionEvent::DefaultsChanged]);
        assert_eq!(graph.get_default_node("Audio/Sink"), DeviceId(5));

        graph.apply(vec![defaults(40, "headphones")]);
        assert_eq!(graph.get_default_node("Audio/Sink"), DeviceId(7));
    }

    #[test]
    fn test_removing_default_node() {
        let mut graph = graph_with_two_sinks();

        let events = graph.apply(vec![DumpObject::Removed(5)]);
        assert_eq!(events, vec![SessionEvent::DefaultsChanged]);
        assert_eq!(graph.get_default_node("Audio/Sink"), DeviceId::INVALID);
        assert!(graph.lookup_by_id(DeviceId(5)).is_none());

        let events = graph.apply(vec![DumpObject::Removed(7)]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_removing_default_metadata() {
        let mut graph = graph_with_two_sinks();
        let events = graph.apply(vec![DumpObject::Removed(40)]);

        assert_eq!(events, vec![SessionEvent::DefaultsChanged]);
        assert!(!graph.has_default_metadata());
        assert_eq!(graph.get_default_node("Audio/Sink"), DeviceId::INVALID);
    }

    #[test]
    fn test_node_without_volume() {
        let mut graph = Graph::new();
        let events = graph.apply(vec![sink(9, "dummy", None, false)]);

        assert!(events.is_empty());
        assert!(graph.lookup_by_id(DeviceId(9)).is_some());
        assert_eq!(graph.get_volume(DeviceId(9)), None);
    }

    #[test]
    fn test_update_without_params_keeps_volume() {
        let mut graph = graph_with_two_sinks();
        let info = NodeInfo { props: HashMap::new(), params: None };
        let events = graph.apply(vec![DumpObject::Node { id: 5, info }]);

        assert!(events.is_empty());
        assert_eq!(graph.get_volume(DeviceId(5)), Some(VolumeReading::new(1.0)));
        assert_eq!(graph.get_default_node("Audio/Sink"), DeviceId(5));
    }
}
