//! Configuration loading for the relay binary.
//!
//! This module handles:
//! - Locating relay.json (CLI > env > XDG > system > defaults)
//! - Parsing it into [`RelayConfig`]
//! - Semantic validation before anything is started

pub use anon_config::{RelayConfig, ValidationError};

use anon_config::resolve::{resolve_config, ConfigSource};
use anon_config::validate_config;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit relay.json path (highest priority). Must exist.
    pub config_path: Option<PathBuf>,
}

/// A loaded, validated configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub relay: RelayConfig,
    /// Path to relay.json (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    /// Locations examined while resolving.
    pub searched: Vec<PathBuf>,
}

impl ResolvedConfig {
    /// Summary for `check` output.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            path: self.path.clone(),
            source: self.source.to_string(),
            searched: self.searched.clone(),
            schema_version: self.relay.schema_version.clone(),
            transformer: self.relay.transformer.kind.to_string(),
            restore_mode: self.relay.restore.mode.to_string(),
            recognizers: self
                .relay
                .detection
                .recognizer_specs()
                .into_iter()
                .map(|spec| spec.entity_type)
                .collect(),
        }
    }
}

/// Serializable description of the active configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub path: Option<PathBuf>,
    pub source: String,
    pub searched: Vec<PathBuf>,
    pub schema_version: String,
    pub transformer: String,
    pub restore_mode: String,
    pub recognizers: Vec<String>,
}

/// Load configuration with the standard resolution order, then validate it.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = &options.config_path {
        if !path.is_file() {
            return Err(ConfigError::NotFound { path: path.clone() });
        }
    }

    let paths = resolve_config(options.config_path.as_deref());
    let relay = match &paths.relay {
        Some(path) => RelayConfig::from_file(path).map_err(|source| ConfigError::Invalid {
            path: path.clone(),
            source,
        })?,
        None => RelayConfig::default(),
    };

    validate_config(&relay)?;

    tracing::debug!(
        event = crate::logging::event_names::CONFIG_LOADED,
        source = %paths.relay_source,
        path = ?paths.relay,
        "configuration loaded"
    );

    Ok(ResolvedConfig {
        relay,
        path: paths.relay,
        source: paths.relay_source,
        searched: paths.searched,
    })
}
