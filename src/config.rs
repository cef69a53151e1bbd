use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::credentials::{ProviderConfig, DEFAULT_FRESHNESS_WINDOW};
use crate::duration::{deserialize_duration, serialize_duration};
use crate::policy::InterceptionConfig;

const CONFIG_FILE_NAME: &str = "keyring-gcloud.toml";
const CONFIG_DIR_NAME: &str = "keyring-gcloud";

fn default_freshness_window() -> Duration {
    DEFAULT_FRESHNESS_WINDOW
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a newly obtained token is trusted before refreshing.
    #[serde(
        default = "default_freshness_window",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub freshness_window: Duration,

    /// Which lookups go through the cache.
    #[serde(default)]
    pub interception: InterceptionConfig,

    /// How new tokens are obtained.
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            freshness_window: default_freshness_window(),
            interception: InterceptionConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides on top of the loaded settings.
    pub fn apply_env(mut self) -> Self {
        self.interception.apply_env();
        self
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./keyring-gcloud.toml` if it exists in current directory
/// 2. `<config_dir>/keyring-gcloud/config.toml` (`~/.config` on Linux)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join(CONFIG_DIR_NAME).join("config.toml");
    }

    local_config
}
