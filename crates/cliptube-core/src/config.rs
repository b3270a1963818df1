use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CliptubeError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub history: HistoryConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub watch_clipboard: bool,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Playback volume, 0.0 to 1.0.
    pub volume: f32,
    pub command: String,
}

/// Receives configuration changes, synchronously, with both old and new values.
pub trait ConfigObserver {
    fn config_changed(&mut self, old: &AppConfig, new: &AppConfig);
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, CliptubeError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, CliptubeError> {
        if path.exists() {
            let user_str =
                std::fs::read_to_string(path).map_err(|e| CliptubeError::Config(e.to_string()))?;
            Self::from_toml(&user_str)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a config file body. Missing sections and keys fall back to the
    /// built-in defaults.
    pub fn from_toml(content: &str) -> Result<Self, CliptubeError> {
        let mut merged: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| CliptubeError::Config(e.to_string()))?;
        let user: toml::Table =
            toml::from_str(content).map_err(|e| CliptubeError::Config(e.to_string()))?;
        merge_tables(&mut merged, user);

        let config: AppConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| CliptubeError::Config(e.to_string()))?;
        Ok(config.sanitized())
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CliptubeError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), CliptubeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CliptubeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Clamp values into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        if !self.player.volume.is_finite() {
            self.player.volume = PlayerConfig::DEFAULT_VOLUME;
        }
        self.player.volume = self.player.volume.clamp(0.0, 1.0);
        self.general.poll_interval_ms = self.general.poll_interval_ms.max(50);
        self
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the persisted history file.
    pub fn history_path() -> PathBuf {
        Self::data_dir().join("history.json")
    }

    /// Directory for history and log files.
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "cliptube")
    }
}

impl PlayerConfig {
    pub const DEFAULT_VOLUME: f32 = 0.5;
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_sub) => match base.get_mut(&key) {
                Some(toml::Value::Table(base_sub)) => merge_tables(base_sub, overlay_sub),
                _ => {
                    base.insert(key, toml::Value::Table(overlay_sub));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
