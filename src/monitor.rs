//! Keeps the display in step with the default node's volume.

use std::future::Future;
use std::ops::ControlFlow;

use crate::config::MonitorConfig;
use crate::curves::Curve;
use crate::display::DisplaySink;
use crate::error::{Error, LoadError};
use crate::session::{
    DefaultNodesApi, DeviceId, Readiness, SessionEvent, SessionSource, SessionView, Signal, DEFAULT_NODES_API,
    MIXER_API,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    WaitingForPlugins,
    Ready,
    Stopped,
}

pub struct SyncLoop<D> {
    sink: D,
    curve: Box<dyn Curve>,
    media_class: String,
    push_initial: bool,
    current_default: DeviceId,
    state: State,
}

impl<D: DisplaySink> SyncLoop<D> {
    pub fn new(sink: D, config: &MonitorConfig) -> Self {
        Self {
            sink,
            curve: config.curve.into_curve(),
            media_class: config.media_class.clone(),
            push_initial: config.push_initial,
            current_default: DeviceId::INVALID,
            state: State::Uninitialized,
        }
    }

    pub fn current_default(&self) -> DeviceId {
        self.current_default
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    /// Loads the plugins and waits for them and for the initial enumeration
    /// by pumping the session's own events, then subscribes to changes.
    pub async fn initialize<S: SessionSource>(&mut self, source: &mut S, plugins: &[String]) -> Result<(), Error> {
        self.state = State::WaitingForPlugins;

        let mut readiness = Readiness::new(0);
        for name in plugins {
            source.load_plugin(name);
            readiness.plugin_requested();
        }
        while !readiness.is_ready() {
            let event = source.next_event().await?;
            readiness.observe(&event)?;
        }
        for required in [DEFAULT_NODES_API, MIXER_API] {
            if !readiness.is_loaded(required) {
                return Err(LoadError::Unavailable {
                    name: required.to_string(),
                    reason: "not in the configured plugin list".to_string(),
                }
                .into());
            }
        }

        self.current_default = source.view().get_default_node(&self.media_class);
        tracing::info!("Default {} is node {}", self.media_class, self.current_default);

        source.subscribe(Signal::MixerChanged);
        source.subscribe(Signal::DefaultsChanged);
        self.state = State::Ready;

        if self.push_initial && self.current_default.is_valid() {
            self.notify_volume_change(self.current_default, source.view()).await;
        }
        Ok(())
    }

    pub async fn run<S, F>(&mut self, source: &mut S, plugins: &[String], shutdown: F) -> Result<(), Error>
    where
        S: SessionSource,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let started = tokio::select! {
            biased;
            _ = &mut shutdown => false,
            result = self.initialize(source, plugins) => {
                result?;
                true
            }
        };

        if started {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    event = source.next_event() => event?,
                };
                if self.dispatch(&event, source.view()).await.is_break() {
                    break;
                }
            }
        }

        tracing::info!("Monitor stopped");
        self.state = State::Stopped;
        Ok(())
    }

    pub async fn dispatch<V: SessionView>(&mut self, event: &SessionEvent, view: &V) -> ControlFlow<()> {
        match event {
            SessionEvent::MixerChanged(id) => self.on_mixer_changed(*id, view).await,
            SessionEvent::DefaultsChanged => self.on_default_changed(view).await,
            SessionEvent::Disconnected => {
                tracing::info!("Disconnected from PipeWire");
                return ControlFlow::Break(());
            }
            SessionEvent::Installed | SessionEvent::PluginLoaded { .. } => {
                tracing::debug!("Ignoring late startup event {:?}", event);
            }
        }
        ControlFlow::Continue(())
    }

    pub async fn on_mixer_changed<V: SessionView>(&mut self, id: DeviceId, view: &V) {
        if id == self.current_default {
            self.notify_volume_change(id, view).await;
        }
    }

    pub async fn on_default_changed<V: SessionView>(&mut self, view: &V) {
        let new_id = view.get_default_node(&self.media_class);
        if new_id == self.current_default {
            return;
        }
        tracing::info!("Default {} changed: {} -> {}", self.media_class, self.current_default, new_id);
        self.current_default = new_id;
        self.notify_volume_change(new_id, view).await;
    }

    pub async fn notify_volume_change<V: SessionView>(&mut self, id: DeviceId, view: &V) {
        let Some(node) = view.lookup_by_id(id) else {
            tracing::warn!("Node {} not found", id);
            return;
        };
        let bound_id = node.bound_id();
        let Some(reading) = view.get_volume(bound_id) else {
            tracing::warn!("Node {} ({}) does not support volume", bound_id, node.label());
            return;
        };

        let percent = reading.percent(self.curve.as_ref());
        tracing::debug!("Node {}: volume {:.3}, muted {} -> {}%", bound_id, reading.volume, reading.muted, percent);
        if let Err(e) = self.sink.show(percent).await {
            tracing::warn!("{}", e);
        }
    }

    pub async fn close(&mut self) {
        self.sink.close().await;
    }
}
