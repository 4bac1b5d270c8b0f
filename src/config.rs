use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::curves::CurveConfig;
use crate::display::fifo::default_fifo_path;
use crate::session::{DEFAULT_NODES_API, MIXER_API};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Graph monitor command; must print `pw-dump --monitor` output.
    #[serde(default = "default_session_command")]
    pub command: Vec<String>,
    #[serde(default = "default_plugins")]
    pub plugins: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command: default_session_command(),
            plugins: default_plugins(),
        }
    }
}

fn default_session_command() -> Vec<String> {
    vec!["pw-dump".to_string(), "--monitor".to_string(), "--no-colors".to_string()]
}

fn default_plugins() -> Vec<String> {
    vec![DEFAULT_NODES_API.to_string(), MIXER_API.to_string()]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Wob,
    Fifo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub mode: DisplayMode,
    #[serde(default = "default_display_command")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::default(),
            command: default_display_command(),
            path: None,
        }
    }
}

fn default_display_command() -> Vec<String> {
    vec!["wob".to_string()]
}

impl DisplayConfig {
    /// Configured FIFO path with `~` and environment variables expanded,
    /// else `$XDG_RUNTIME_DIR/wob.sock`.
    pub fn fifo_path(&self) -> Option<PathBuf> {
        match self.path {
            Some(ref path) => {
                let expanded = shellexpand::full(path).map(|p| p.into_owned()).unwrap_or_else(|e| {
                    tracing::warn!("Cannot expand {}: {}", path, e);
                    shellexpand::tilde(path).into_owned()
                });
                Some(PathBuf::from(expanded))
            }
            None => default_fifo_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    #[serde(default = "default_media_class")]
    pub media_class: String,
    #[serde(default)]
    pub push_initial: bool,
    #[serde(default)]
    pub curve: CurveConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            media_class: default_media_class(),
            push_initial: false,
            curve: CurveConfig::default(),
        }
    }
}

fn default_media_class() -> String {
    "Audio/Sink".to_string()
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("org", "pipemon", "pipemon")?;
        Some(dirs.config_dir().join("config.toml"))
    }

    /// Layers the TOML file (the given one, else the default location) and
    /// `PIPEMON_` environment variables over the defaults. Nested keys use
    /// `__`, e.g. `PIPEMON_MONITOR__PUSH_INITIAL=true`.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new();
        if let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            tracing::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("PIPEMON_").split("__"));

        let config: Config = figment.extract()?;

        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
