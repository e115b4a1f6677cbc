//! Relay configuration types (relay.json).
//!
//! Every section is optional; a missing section or field takes its built-in
//! default, so `{}` is a valid configuration.

use anon_redact::{DetectionPolicy, RestoreMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::validate::ValidationError;

/// Complete relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub detection: DetectionPolicy,

    #[serde(default)]
    pub transformer: TransformerConfig,

    #[serde(default)]
    pub restore: RestoreConfig,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            server: ServerConfig::default(),
            detection: DetectionPolicy::default(),
            transformer: TransformerConfig::default(),
            restore: RestoreConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request-handling threads.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Send permissive CORS headers.
    #[serde(default = "default_cors")]
    pub cors: bool,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_workers() -> usize {
    4
}

fn default_cors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            workers: default_workers(),
            cors: default_cors(),
        }
    }
}

impl ServerConfig {
    /// `bind:port` for the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Which transformer runs between redaction and restoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformerKind {
    /// Return the redacted text unchanged.
    #[default]
    Echo,
    /// OpenAI-compatible chat-completions endpoint.
    Chat,
}

impl fmt::Display for TransformerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformerKind::Echo => write!(f, "echo"),
            TransformerKind::Chat => write!(f, "chat"),
        }
    }
}

impl FromStr for TransformerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "echo" => Ok(TransformerKind::Echo),
            "chat" => Ok(TransformerKind::Chat),
            _ => Err(format!("unknown transformer kind: {}", s)),
        }
    }
}

/// Transformer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerConfig {
    #[serde(default)]
    pub kind: TransformerKind,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key. The key itself never
    /// appears in the file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Overrides the built-in system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    150
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            kind: TransformerKind::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}

/// Restoration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreConfig {
    #[serde(default)]
    pub mode: RestoreMode,
}
