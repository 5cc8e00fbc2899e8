use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::prompts;

/// Environment variable that points the widget at a backend
pub const BACKEND_URL_ENV: &str = "CHAT_API_URL";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat backend
    pub backend_url: String,

    /// Client-side request timeout. `None` leaves the transport default in place.
    pub request_timeout_secs: Option<u64>,

    /// Where named tabs keep their session state
    pub data_dir: PathBuf,

    /// Widget copy
    pub widget: WidgetConfig,
}

/// Text the widget shows before any conversation happens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub owner_name: String,
    pub greeting: String,
    pub suggested_questions: Vec<String>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        let owner = prompts::DEFAULT_OWNER_NAME;
        Self {
            owner_name: owner.to_string(),
            greeting: prompts::default_greeting(owner),
            suggested_questions: prompts::default_suggested_questions(owner),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: None,
            data_dir: default_data_dir(),
            widget: WidgetConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".folio-chat")
}

impl Config {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        default_data_dir().join("config.toml")
    }

    /// Load configuration from the default location, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.backend_url = url.to_string();
            }
        }
    }

    /// Override the backend from the command line; wins over file and env
    pub fn with_backend(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.backend_url = url;
        }
        self
    }

    /// Directory holding per-tab session files
    pub fn tabs_dir(&self) -> PathBuf {
        self.data_dir.join("tabs")
    }
}
