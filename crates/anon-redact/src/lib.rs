//! Reversible pseudonymization engine for the anonymizing relay.
//!
//! Sensitive spans are swapped for type-scoped placeholder tokens before text
//! leaves the trust boundary, and swapped back when the transformed text
//! returns.
//!
//! # Key Features
//!
//! - **Stable placeholders**: `<{ENTITY_TYPE}_{index}>`, indexed per type in
//!   order of first appearance. The same raw value always gets the same token
//!   within a cycle.
//! - **Strict restoration**: a placeholder maps back to exactly one raw value,
//!   byte-for-byte, or resolution fails with a lookup error.
//! - **Per-cycle isolation**: every cycle owns a fresh [`MappingStore`].
//! - **Pluggable collaborators**: detection and transformation sit behind the
//!   [`EntityDetector`] and [`Transformer`] traits.
//!
//! # Example
//!
//! ```
//! use anon_redact::{allocate, resolve, MappingStore};
//!
//! let mut store = MappingStore::new();
//! let token = allocate("12345", Some("TEST"), Some(&mut store)).unwrap();
//! assert_eq!(token, "<TEST_0>");
//! assert_eq!(resolve(&token, Some("TEST"), Some(&store)).unwrap(), "12345");
//! ```

pub mod allocator;
pub mod detect;
pub mod error;
pub mod pipeline;
pub mod placeholder;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod transform;

pub use allocator::allocate;
pub use detect::{DetectedSpan, EntityDetector, PatternDetector, PatternRecognizer};
pub use error::{ErrorKind, RedactionError, Result};
pub use pipeline::{
    redact_text, restore_text, CycleOutcome, Pipeline, PipelineOptions, Redaction, RestoreMode,
    Restored,
};
pub use placeholder::{
    find_placeholders, format_placeholder, parse_placeholder, PlaceholderMatch, PlaceholderScanner,
};
pub use policy::{ContextPolicy, DetectionPolicy, PatternSpec, RecognizerSpec};
pub use resolver::resolve;
pub use store::{MappingEntry, MappingStore, TypeTable};
pub use transform::{EchoTransformer, Transformer, DEFAULT_SYSTEM_PROMPT};

#[cfg(feature = "llm")]
pub use transform::{ChatTransformer, ChatTransformerConfig};
