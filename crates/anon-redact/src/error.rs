//! Error types for the pseudonymization engine.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Broad classification of a [`RedactionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument was absent. Always caller-fixable.
    Configuration,
    /// A placeholder could not be mapped back to a raw value.
    Lookup,
    /// The detection step rejected its input or produced unusable spans.
    Detection,
    /// The external transformation step failed or timed out.
    Transform,
    /// I/O or serialization failure.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Lookup => "lookup",
            ErrorKind::Detection => "detection",
            ErrorKind::Transform => "transform",
            ErrorKind::Io => "io",
        };
        write!(f, "{}", s)
    }
}

/// Errors that can occur while pseudonymizing or restoring text.
///
/// Messages may name entity types and placeholder tokens, never raw values.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// A required argument (the mapping store or the entity type) was not supplied.
    #[error("configuration error: `{field}` is required")]
    Configuration { field: &'static str },

    /// The resolver was asked about an entity type the store has never seen.
    #[error("entity type {entity_type} not found in entity mapping")]
    UnknownEntityType { entity_type: String },

    /// The entity type is known but no raw value produced this placeholder.
    #[error("placeholder {placeholder} not found in entity mapping for entity type {entity_type}")]
    PlaceholderNotFound {
        placeholder: String,
        entity_type: String,
    },

    /// A detected span does not address a valid, non-empty slice of the input.
    #[error("invalid span {start}..{end} for {entity_type} over text of length {len}")]
    InvalidSpan {
        entity_type: String,
        start: usize,
        end: usize,
        len: usize,
    },

    /// Failed to compile a recognizer pattern.
    #[error("pattern error: {0}")]
    Pattern(String),

    /// The transformation step failed.
    #[error("transform failed: {0}")]
    Transform(String),

    /// The transformation step did not answer within its deadline.
    #[error("transform timed out after {secs}s")]
    Timeout { secs: u64 },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RedactionError {
    /// Shorthand for a missing-argument error.
    pub fn missing(field: &'static str) -> Self {
        RedactionError::Configuration { field }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RedactionError::Configuration { .. } => ErrorKind::Configuration,
            RedactionError::UnknownEntityType { .. }
            | RedactionError::PlaceholderNotFound { .. } => ErrorKind::Lookup,
            RedactionError::InvalidSpan { .. } | RedactionError::Pattern(_) => {
                ErrorKind::Detection
            }
            RedactionError::Transform(_) | RedactionError::Timeout { .. } => ErrorKind::Transform,
            RedactionError::Io(_) | RedactionError::Json(_) => ErrorKind::Io,
        }
    }

    /// True for resolver lookup failures.
    pub fn is_lookup(&self) -> bool {
        self.kind() == ErrorKind::Lookup
    }
}
