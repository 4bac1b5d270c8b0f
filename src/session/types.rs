use std::fmt;

use crate::error::LoadError;
use crate::volume::VolumeReading;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// `SPA_ID_INVALID`: no node assigned.
    pub const INVALID: DeviceId = DeviceId(u32::MAX);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("<none>")
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: DeviceId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub media_class: Option<String>,
    pub volume: Option<VolumeReading>,
}

impl Node {
    pub fn new(id: DeviceId) -> Self {
        Self { id, name: None, description: None, media_class: None, volume: None }
    }

    /// Id the mixer knows this node by. Same as the registry id for
    /// PipeWire globals.
    pub fn bound_id(&self) -> DeviceId {
        self.id
    }

    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("unnamed")
    }
}

pub trait NodeLookup {
    fn lookup_by_id(&self, id: DeviceId) -> Option<&Node>;
}

pub trait DefaultNodesApi {
    /// Returns [`DeviceId::INVALID`] when no default is set for the class.
    fn get_default_node(&self, media_class: &str) -> DeviceId;
}

pub trait MixerApi {
    fn get_volume(&self, id: DeviceId) -> Option<VolumeReading>;
}

pub trait SessionView: NodeLookup + DefaultNodesApi + MixerApi {}

impl<T: NodeLookup + DefaultNodesApi + MixerApi> SessionView for T {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    MixerChanged,
    DefaultsChanged,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Installed,
    PluginLoaded {
        name: String,
        result: Result<(), LoadError>,
    },
    MixerChanged(DeviceId),
    /// Default-node metadata was updated. The resolved id may be unchanged.
    DefaultsChanged,
    Disconnected,
}

impl SessionEvent {
    pub fn signal(&self) -> Option<Signal> {
        match self {
            SessionEvent::MixerChanged(_) => Some(Signal::MixerChanged),
            SessionEvent::DefaultsChanged => Some(Signal::DefaultsChanged),
            _ => None,
        }
    }
}
