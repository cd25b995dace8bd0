//! Configuration Management
//!
//! Handles persistent configuration storage for ytvideo. The access token is
//! deliberately not part of it: it comes from the command line or the
//! environment and is never written to disk.

use crate::youtube::client::ClientOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override of the YouTube Data API base URL
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Override of the HTTP user agent
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ytvideo").join("config.json"))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("No config directory on this platform")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Client options with config overrides applied
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default();
        if let Some(url) = &self.api_base_url {
            options.base_url = url.clone();
        }
        if let Some(agent) = &self.user_agent {
            options.user_agent = agent.clone();
        }
        if let Some(secs) = self.timeout_secs {
            options.timeout = Duration::from_secs(secs);
        }
        options
    }
}
