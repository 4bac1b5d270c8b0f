pub mod types;
pub mod registry;
pub mod readiness;

use async_trait::async_trait;

use crate::error::ConnectionError;

pub use types::{DefaultNodesApi, DeviceId, MixerApi, Node, NodeLookup, SessionEvent, SessionView, Signal};
pub use registry::DeviceRegistry;
pub use readiness::Readiness;

pub const DEFAULT_NODES_API: &str = "default-nodes-api";
pub const MIXER_API: &str = "mixer-api";

#[async_trait]
pub trait SessionSource: Send {
    type View: SessionView + Sync;

    /// Requests a plugin. Completion arrives later as
    /// [`SessionEvent::PluginLoaded`].
    fn load_plugin(&mut self, name: &str);

    fn subscribe(&mut self, signal: Signal);

    async fn next_event(&mut self) -> Result<SessionEvent, ConnectionError>;

    fn view(&self) -> &Self::View;

    async fn close(&mut self);
}
