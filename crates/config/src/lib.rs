//! Configuration loading, validation, and management for tether.
//!
//! Loads configuration from `~/.tether/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The `[mcp_servers]` table is a convenience for the CLI host: it lets a
//! local user declare tool servers once instead of passing them with every
//! turn. The chat node itself never reads it; its default is the empty map.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tether_core::McpConfig;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `~/.tether/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model identifier sent with every completion request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum reasoning iterations per turn (safety limit)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// MCP tool servers the CLI passes into the agent state
    #[serde(default)]
    pub mcp_servers: McpConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_iterations() -> u32 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
            mcp_servers: McpConfig::new(),
        }
    }
}

/// Redact a secret string for Debug output.
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
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_iterations", &self.max_iterations)
            .field("mcp_servers", &self.mcp_servers)
            .finish()
    }
}

impl AppConfig {
    /// The configuration directory: `~/.tether`.
    pub fn config_dir() -> PathBuf {
        std::env::var_os("TETHER_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(|h| PathBuf::from(h).join(".tether"))
                    .unwrap_or_else(|| PathBuf::from(".tether"))
            })
    }

    /// Load configuration from the default location with env overrides.
    ///
    /// A missing config file is not an error: defaults apply and env
    /// variables can still supply the API key.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_dir().join("config.toml");
        let mut config = if path.is_file() {
            Self::load_from(&path)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file (no env overrides).
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        for key in ["TETHER_API_KEY", "OPENAI_API_KEY"] {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    self.api_key = Some(value);
                    break;
                }
            }
        }
        if let Ok(url) = std::env::var("TETHER_API_URL") {
            if !url.is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(model) = std::env::var("TETHER_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }
    }

    /// Reject settings that cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} out of range 0.0-2.0",
                self.temperature
            )));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.api_url.is_empty() {
            return Err(ConfigError::Invalid("api_url must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tether_core::ServerConnection;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "gpt-4o");
        assert!(config.mcp_servers.is_empty());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
model = "gpt-4o-mini"
temperature = 0.2

[mcp_servers.fetch]
transport = "stdio"
command = "uvx"
args = ["mcp-server-fetch"]

[mcp_servers.search]
transport = "sse"
url = "http://localhost:8000/sse"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.mcp_servers.len(), 2);
        assert!(matches!(
            config.mcp_servers["fetch"],
            ServerConnection::Stdio { .. }
        ));
        assert!(matches!(
            config.mcp_servers["search"],
            ServerConnection::Sse { .. }
        ));
    }

    #[test]
    fn malformed_server_entry_rejected_at_parse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // No transport tag, must fail before anything tries to connect.
        write!(
            file,
            r#"
[mcp_servers.broken]
command = "uvx"
"#
        )
        .unwrap();

        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(msg)) if msg.contains("temperature")
        ));
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = AppConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
