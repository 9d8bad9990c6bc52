use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub account: AccountSettings,
    pub engine: EngineSettings,
}

/// Last-used identity fields. Unvalidated until a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub uid: String,
    pub email: String,
    pub device_id: String,
    pub interval: u64,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            uid: String::new(),
            email: String::new(),
            device_id: String::new(),
            interval: DEFAULT_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub base_url: String,
    pub settle_delay_ms: u64,
    pub allow_overlap: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            allow_overlap: true,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("points-poller").join("config.toml"))
    }

    /// Loads settings from the default location. Never fails: a missing or
    /// unreadable file means "no saved settings".
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(?path, "Config file not found, using defaults");
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(?path, error = %e, "Failed to read config file, using defaults");
                return Self::default();
            }
        };

        match toml::from_str::<Settings>(&content) {
            Ok(settings) => {
                tracing::info!(?path, "Loaded config");
                settings
            }
            Err(e) => {
                tracing::warn!(?path, error = %e, "Config file is corrupt, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("Could not determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!(?path, "Saved config");
        Ok(())
    }
}
