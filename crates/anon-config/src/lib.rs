//! Anonymizing relay configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for relay.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod relay;
pub mod resolve;
pub mod validate;

pub use relay::{RelayConfig, RestoreConfig, ServerConfig, TransformerConfig, TransformerKind};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
