//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::{Project, TenantContext};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_MIN_EXAMPLES: usize = 5;
pub const DEFAULT_GENERATE_COUNT: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Botadmin configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chatbot backend REST API
    pub api_url: Option<String>,

    /// Chatbot every request is scoped to
    pub bot_id: Option<String>,

    /// Bearer token sent with every request
    pub token: Option<String>,

    /// Minimum non-empty examples per intent
    pub min_examples: Option<usize>,

    /// Paraphrases requested per generation call
    pub generate_count: Option<usize>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let project = Project::discover().ok();
        Self::load_for(project.as_ref())
    }

    /// Load configuration using an explicit project (or none)
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (accessors below)

        // 2. Global user config
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_layer(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.botadmin/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_layer(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        if let Ok(url) = std::env::var("BOTADMIN_API_URL") {
            config.api_url = Some(url);
        }
        if let Ok(bot_id) = std::env::var("BOTADMIN_BOT_ID") {
            config.bot_id = Some(bot_id);
        }
        if let Ok(token) = std::env::var("BOTADMIN_TOKEN") {
            config.token = Some(token);
        }

        config
    }

    /// Parse one YAML layer; unreadable or malformed layers are skipped
    fn read_layer(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::from_yaml(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    /// Parse a config document. An empty document yields the default config.
    pub fn from_yaml(contents: &str) -> Result<Config, ConfigError> {
        let has_content = contents
            .lines()
            .map(str::trim)
            .any(|l| !l.is_empty() && !l.starts_with('#'));
        if !has_content {
            return Ok(Config::default());
        }
        let parsed: Option<Config> =
            serde_yml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(parsed.unwrap_or_default())
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "botadmin")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.bot_id.is_some() {
            self.bot_id = other.bot_id;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.min_examples.is_some() {
            self.min_examples = other.min_examples;
        }
        if other.generate_count.is_some() {
            self.generate_count = other.generate_count;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Apply command-line overrides (highest priority)
    pub fn with_overrides(mut self, api_url: Option<String>, bot_id: Option<String>) -> Self {
        if api_url.is_some() {
            self.api_url = api_url;
        }
        if bot_id.is_some() {
            self.bot_id = bot_id;
        }
        self
    }

    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Examples an intent needs before import. Values below the default are
    /// an explicit operator override; zero is treated as one.
    pub fn min_examples(&self) -> usize {
        self.min_examples.unwrap_or(DEFAULT_MIN_EXAMPLES).max(1)
    }

    pub fn generate_count(&self) -> usize {
        self.generate_count.unwrap_or(DEFAULT_GENERATE_COUNT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// The chatbot every backend call is scoped to
    pub fn tenant(&self) -> Result<TenantContext, ConfigError> {
        self.bot_id
            .as_deref()
            .and_then(TenantContext::new)
            .ok_or(ConfigError::MissingBotId)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no chatbot selected: set bot_id in config, BOTADMIN_BOT_ID, or pass --bot")]
    MissingBotId,

    #[error("invalid config: {0}")]
    Parse(String),
}
