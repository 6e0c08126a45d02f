//! Configuration management for vfchat.
//!
//! Configuration is loaded from `~/.config/vfchat/config.toml` and then
//! overridden by `VOICEFLOW_*` environment variables.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Every Dialog Manager API key starts with this prefix.
pub const API_KEY_PREFIX: &str = "VF.DM.";

const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";
const PLACEHOLDER_PROJECT_ID: &str = "YOUR_PROJECT_ID_HERE";
const PLACEHOLDER_VERSION_ID: &str = "YOUR_VERSION_ID_HERE";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dialog Manager API key (prefer VOICEFLOW_API_KEY env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Project ID, needed for transcripts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Version ID, needed for transcripts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    /// Dialog runtime base URL.
    #[serde(default = "default_runtime_url")]
    pub runtime_url: String,
    /// Transcripts endpoint.
    #[serde(default = "default_transcripts_url")]
    pub transcripts_url: String,
    /// Version alias sent in the `versionID` header.
    #[serde(default = "default_version_alias")]
    pub version_alias: String,
    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            project_id: None,
            version_id: None,
            runtime_url: default_runtime_url(),
            transcripts_url: default_transcripts_url(),
            version_alias: default_version_alias(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_runtime_url() -> String {
    "https://general-runtime.voiceflow.com".to_string()
}

fn default_transcripts_url() -> String {
    "https://api.voiceflow.com/v2/transcripts".to_string()
}

fn default_version_alias() -> String {
    "production".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Result of validating a configuration that is usable for chatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    /// Chat and transcripts are both available.
    Valid,
    /// Chat works, but project/version IDs are missing so transcripts are off.
    Partial,
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("vfchat"))
            .context("Could not determine config directory")
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from `path`, using defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Load from `path` (or the default location) and apply environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        let mut config = Self::load(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `VOICEFLOW_*` variables. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("VOICEFLOW_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = get("VOICEFLOW_PROJECT_ID") {
            self.project_id = Some(v);
        }
        if let Some(v) = get("VOICEFLOW_VERSION_ID") {
            self.version_id = Some(v);
        }
        if let Some(v) = get("VOICEFLOW_RUNTIME_URL") {
            self.runtime_url = v;
        }
        if let Some(v) = get("VOICEFLOW_TRANSCRIPTS_URL") {
            self.transcripts_url = v;
        }
        if let Some(v) = get("VOICEFLOW_VERSION_ALIAS") {
            self.version_alias = v;
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// A starter config with placeholders for the user to fill in.
    pub fn template() -> Self {
        Self {
            api_key: Some(PLACEHOLDER_API_KEY.to_string()),
            project_id: Some(PLACEHOLDER_PROJECT_ID.to_string()),
            version_id: Some(PLACEHOLDER_VERSION_ID.to_string()),
            ..Self::default()
        }
    }

    /// Check the configuration before any request is sent.
    pub fn validate(&self) -> Result<ConfigStatus, ConfigError> {
        let api_key = self.api_key().ok_or(ConfigError::MissingApiKey)?;
        if !api_key.starts_with(API_KEY_PREFIX) {
            return Err(ConfigError::MalformedApiKey {
                expected: API_KEY_PREFIX,
            });
        }

        for (field, value) in [
            ("runtime_url", &self.runtime_url),
            ("transcripts_url", &self.transcripts_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if self.project_id().is_some() && self.version_id().is_some() {
            Ok(ConfigStatus::Valid)
        } else {
            Ok(ConfigStatus::Partial)
        }
    }

    /// The API key, unless missing, blank or still the placeholder.
    pub fn api_key(&self) -> Option<&str> {
        configured(&self.api_key, PLACEHOLDER_API_KEY)
    }

    /// The project ID, unless missing, blank or still the placeholder.
    pub fn project_id(&self) -> Option<&str> {
        configured(&self.project_id, PLACEHOLDER_PROJECT_ID)
    }

    /// The version ID, unless missing, blank or still the placeholder.
    pub fn version_id(&self) -> Option<&str> {
        configured(&self.version_id, PLACEHOLDER_VERSION_ID)
    }

    /// API key safe to print: a short prefix followed by a fixed mask.
    pub fn masked_api_key(&self) -> String {
        match self.api_key() {
            Some(key) => {
                let prefix: String = key.chars().take(15).collect();
                format!("{}...{}", prefix, "*".repeat(20))
            }
            None => "Not provided".to_string(),
        }
    }
}

fn configured<'a>(value: &'a Option<String>, placeholder: &str) -> Option<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != placeholder)
}
