use crate::error::LoadError;

use super::types::SessionEvent;

/// Outstanding plugin loads plus the installed flag.
#[derive(Debug, Default)]
pub struct Readiness {
    pending_plugins: usize,
    installed: bool,
    loaded: Vec<String>,
}

impl Readiness {
    pub fn new(pending_plugins: usize) -> Self {
        Self { pending_plugins, installed: false, loaded: Vec::new() }
    }

    pub fn plugin_requested(&mut self) {
        self.pending_plugins += 1;
    }

    /// Applies a startup event. A failed plugin load is returned as an error
    /// and must abort startup.
    pub fn observe(&mut self, event: &SessionEvent) -> Result<(), LoadError> {
        match event {
            SessionEvent::Installed => {
                self.installed = true;
            }
            SessionEvent::PluginLoaded { name, result } => {
                result.clone()?;
                tracing::debug!("Plugin {} loaded", name);
                self.pending_plugins = self.pending_plugins.saturating_sub(1);
                self.loaded.push(name.clone());
            }
            SessionEvent::Disconnected if !self.is_ready() => {
                return Err(LoadError::Interrupted);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.installed && self.pending_plugins == 0
    }

    pub fn pending(&self) -> usize {
        self.pending_plugins
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(name: &str) -> SessionEvent {
        SessionEvent::PluginLoaded { name: name.to_string(), result: Ok(()) }
    }

    #[test]
    fn test_ready_needs_install_and_plugins() {
        let mut readiness = Readiness::new(2);
        assert!(!readiness.is_ready());

        readiness.observe(&loaded("mixer-api")).unwrap();
        readiness.observe(&SessionEvent::Installed).unwrap();
        assert!(!readiness.is_ready());
        assert_eq!(readiness.pending(), 1);

        readiness.observe(&loaded("default-nodes-api")).unwrap();
        assert!(readiness.is_ready());
        assert!(readiness.is_loaded("mixer-api"));
        assert!(readiness.is_loaded("default-nodes-api"));
    }

    #[test]
    fn test_installed_alone_is_not_ready() {
        let mut readiness = Readiness::new(0);
        readiness.plugin_requested();
        readiness.observe(&SessionEvent::Installed).unwrap();
        assert!(!readiness.is_ready());
    }

    #[test]
    fn test_failed_load_is_error() {
        let mut readiness = Readiness::new(1);
        let event = SessionEvent::PluginLoaded {
            name: "bogus".to_string(),
            result: Err(LoadError::UnknownPlugin("bogus".to_string())),
        };
        assert_eq!(readiness.observe(&event), Err(LoadError::UnknownPlugin("bogus".to_string())));
        assert_eq!(readiness.pending(), 1);
    }

    #[test]
    fn test_disconnect_while_loading() {
        let mut readiness = Readiness::new(1);
        assert_eq!(readiness.observe(&SessionEvent::Disconnected), Err(LoadError::Interrupted));
    }

    #[test]
    fn test_other_events_ignored() {
        let mut readiness = Readiness::new(1);
        readiness.observe(&SessionEvent::DefaultsChanged).unwrap();
        assert_eq!(readiness.pending(), 1);
    }
}
