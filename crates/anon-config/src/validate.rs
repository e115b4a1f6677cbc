//! Configuration validation errors and semantic validation.

use anon_redact::policy::BUILTIN_RECOGNIZERS;
use anon_redact::PatternDetector;
use thiserror::Error;

use crate::relay::{RelayConfig, TransformerKind};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a relay configuration semantically.
pub fn validate_config(config: &RelayConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_server(config)?;
    validate_detection(config)?;
    validate_transformer(config)?;

    Ok(())
}

fn validate_server(config: &RelayConfig) -> ValidationResult<()> {
    let server = &config.server;

    if server.bind.trim().is_empty() {
        return Err(ValidationError::MissingField("server.bind".to_string()));
    }

    if server.port == 0 {
        return Err(ValidationError::InvalidValue {
            field: "server.port".to_string(),
            message: "Must be non-zero".to_string(),
        });
    }

    if server.workers == 0 {
        return Err(ValidationError::InvalidValue {
            field: "server.workers".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    Ok(())
}

fn validate_detection(config: &RelayConfig) -> ValidationResult<()> {
    let detection = &config.detection;

    validate_unit_interval("detection.score_threshold", detection.score_threshold)?;

    for name in &detection.builtin {
        if !BUILTIN_RECOGNIZERS.contains(&name.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "detection.builtin".to_string(),
                message: format!(
                    "Unknown recognizer '{}' (known: {})",
                    name,
                    BUILTIN_RECOGNIZERS.join(", ")
                ),
            });
        }
    }

    for (i, spec) in detection.custom.iter().enumerate() {
        if spec.entity_type.trim().is_empty() {
            return Err(ValidationError::MissingField(format!(
                "detection.custom[{}].entity_type",
                i
            )));
        }
        if spec.patterns.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("detection.custom[{}].patterns", i),
                message: "Must contain at least one pattern".to_string(),
            });
        }
        for (j, pattern) in spec.patterns.iter().enumerate() {
            validate_unit_interval(
                &format!("detection.custom[{}].patterns[{}].score", i, j),
                pattern.score,
            )?;
        }
    }

    let context = &detection.context;
    validate_unit_interval(
        "detection.context.min_score_with_context",
        context.min_score_with_context,
    )?;
    if context.similarity_factor < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "detection.context.similarity_factor".to_string(),
            message: format!("Must be non-negative, got {}", context.similarity_factor),
        });
    }

    // Compiles every regex.
    PatternDetector::from_policy(detection)
        .map_err(|e| ValidationError::SemanticError(e.to_string()))?;

    Ok(())
}

fn validate_transformer(config: &RelayConfig) -> ValidationResult<()> {
    let transformer = &config.transformer;

    if transformer.timeout_secs == 0 {
        return Err(ValidationError::InvalidValue {
            field: "transformer.timeout_secs".to_string(),
            message: "Must be positive".to_string(),
        });
    }

    if transformer.kind == TransformerKind::Chat {
        if transformer.endpoint.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "transformer.endpoint".to_string(),
            ));
        }
        if transformer.model.trim().is_empty() {
            return Err(ValidationError::MissingField("transformer.model".to_string()));
        }
        if transformer.max_tokens == 0 {
            return Err(ValidationError::InvalidValue {
                field: "transformer.max_tokens".to_string(),
                message: "Must be positive".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_unit_interval(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be in [0, 1], got {}", value),
        });
    }
    Ok(())
}
