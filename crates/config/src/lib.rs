//! Configuration loading, validation, and management for termagent.
//!
//! Loads configuration from `~/.termagent/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The Gemini OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Model candidates, most capable first. Later entries are fallbacks.
pub const DEFAULT_MODELS: [&str; 5] = [
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.0-flash-exp",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
];

/// The root configuration structure.
///
/// Maps directly to `~/.termagent/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Ordered model candidates for fallback
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Sampling temperature (endpoint default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// HTTP timeout for one completion request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// Tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// System prompt settings
    #[serde(default)]
    pub identity: IdentityConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}
fn default_request_timeout() -> u64 {
    120
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("identity", &self.identity)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model requests per query
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Invalid model responses tolerated per query before aborting
    #[serde(default = "default_max_protocol_errors")]
    pub max_protocol_errors: u32,
}

fn default_max_iterations() -> u32 {
    25
}
fn default_max_protocol_errors() -> u32 {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_protocol_errors: default_max_protocol_errors(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Wall-clock limit for `executeCommand`
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_command_timeout() -> u64 {
    10
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: default_command_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Replace the built-in system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.termagent/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TERMAGENT_API_KEY`, `GEMINI_API_KEY`, `OPENAI_API_KEY` (first found,
    ///   only when the file has no key)
    /// - `TERMAGENT_BASE_URL`
    /// - `TERMAGENT_MODELS` (comma separated)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = non_empty("TERMAGENT_API_KEY")
                .or_else(|| non_empty("GEMINI_API_KEY"))
                .or_else(|| non_empty("OPENAI_API_KEY"));
        }

        if let Some(url) = non_empty("TERMAGENT_BASE_URL") {
            self.base_url = url;
        }

        if let Some(models) = non_empty("TERMAGENT_MODELS") {
            self.models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".termagent")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one model candidate is required".into(),
            ));
        }

        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be > 0".into(),
            ));
        }

        if self.tools.command_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tools.command_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            models: default_models(),
            temperature: None,
            request_timeout_secs: default_request_timeout(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
