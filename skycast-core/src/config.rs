use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Landmark;

/// Environment variable that overrides the stored relay credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_RELAY_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_RELAY_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_LOOKUP_ENDPOINT: &str = "https://ipapi.co/json/";

/// Settings for the chat relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    /// Base URL, without the `/models/...` suffix.
    pub endpoint: String,
    pub model: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_RELAY_ENDPOINT.to_string(),
            model: DEFAULT_RELAY_MODEL.to_string(),
        }
    }
}

/// Settings for finding the visitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// When false, lookups fail as if the user had denied access.
    pub geolocation: bool,
    pub lookup_endpoint: Option<String>,
    pub timeout_secs: u64,
    /// Example TOML:
    /// [location.default]
    /// name = "New Delhi"
    /// country_code = "IN"
    /// label = "New Delhi, India"
    /// latitude = 28.6139
    /// longitude = 77.2090
    pub default: Landmark,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            geolocation: true,
            lookup_endpoint: Some(DEFAULT_LOOKUP_ENDPOINT.to_string()),
            timeout_secs: 10,
            default: Landmark::default(),
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Artificial delay before each weather generation.
    pub simulated_latency_ms: u64,
    pub relay: RelayConfig,
    pub location: LocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulated_latency_ms: 1500,
            relay: RelayConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Store the relay credential; an empty key clears it.
    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.relay.api_key = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
    }

    /// Credential for the relay: the environment wins over the stored key.
    pub fn relay_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.relay.api_key.as_deref())
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

fn pick_api_key(env: Option<String>, stored: Option<&str>) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| stored.filter(|k| !k.trim().is_empty()).map(str::to_string))
}
