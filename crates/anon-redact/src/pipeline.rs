//! Redact -> transform -> restore cycle.
//!
//! A [`Pipeline`] borrows a detector and a transformer that live for the whole
//! process and runs one cycle per call to [`Pipeline::process`]. Each cycle
//! builds its own [`MappingStore`] and drops it on return, so concurrent
//! cycles never see each other's mappings.

use crate::allocator::allocate_in;
use crate::detect::{DetectedSpan, EntityDetector};
use crate::placeholder::PlaceholderScanner;
use crate::resolver::resolve_in;
use crate::transform::Transformer;
use crate::{MappingStore, RedactionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What to do with placeholder-shaped tokens that cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// Leave them in the output verbatim.
    #[default]
    Lenient,
    /// Fail the cycle.
    Strict,
}

impl std::str::FromStr for RestoreMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(RestoreMode::Lenient),
            "strict" => Ok(RestoreMode::Strict),
            _ => Err(format!("unknown restore mode: {}", s)),
        }
    }
}

impl std::fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreMode::Lenient => write!(f, "lenient"),
            RestoreMode::Strict => write!(f, "strict"),
        }
    }
}

/// Output of [`restore_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub text: String,
    /// Number of placeholders replaced by their raw value.
    pub restored: usize,
    /// Placeholder-shaped tokens left in place (lenient mode only).
    pub unresolved: Vec<String>,
}

/// Replace every span in `text` with its placeholder, allocating into `store`.
///
/// Spans are applied leftmost first, so indices follow order of appearance.
/// A span overlapping an earlier one is skipped. A span that is empty, out of
/// bounds, or not on a char boundary fails the whole redaction.
pub fn redact_text(text: &str, spans: &[DetectedSpan], store: &mut MappingStore) -> Result<String> {
    for span in spans {
        validate_span(text, span)?;
    }

    let mut ordered: Vec<&DetectedSpan> = spans.iter().collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in ordered {
        if span.start < cursor {
            debug!(
                entity_type = %span.entity_type,
                start = span.start,
                end = span.end,
                "skipping overlapping span"
            );
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        let placeholder = allocate_in(store, &text[span.start..span.end], &span.entity_type);
        out.push_str(&placeholder);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn validate_span(text: &str, span: &DetectedSpan) -> Result<()> {
    if span.entity_type.is_empty() {
        return Err(RedactionError::missing("entity_type"));
    }
    let valid = span.start < span.end
        && span.end <= text.len()
        && text.is_char_boundary(span.start)
        && text.is_char_boundary(span.end);
    if valid {
        Ok(())
    } else {
        Err(RedactionError::InvalidSpan {
            entity_type: span.entity_type.clone(),
            start: span.start,
            end: span.end,
            len: text.len(),
        })
    }
}

/// Replace every resolvable placeholder in `text` with its raw value.
///
/// Tokens issued by `store` are found whatever their label; anything else of
/// the `<TYPE_n>` shape counts as a placeholder too and must resolve (strict)
/// or is reported as unresolved (lenient).
///
/// Inserted raw values are never rescanned, even if they look like placeholders.
pub fn restore_text(text: &str, store: &MappingStore, mode: RestoreMode) -> Result<Restored> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut restored = 0;
    let mut unresolved = Vec::new();

    let scanner = PlaceholderScanner::for_store(store)?;
    for found in scanner.find(text) {
        out.push_str(&text[cursor..found.start]);
        match resolve_in(store, found.token, found.entity_type) {
            Ok(raw) => {
                out.push_str(raw);
                restored += 1;
            }
            Err(err) if mode == RestoreMode::Lenient => {
                debug!(placeholder = %found.token, error = %err, "leaving placeholder unresolved");
                out.push_str(found.token);
                unresolved.push(found.token.to_string());
            }
            Err(err) => return Err(err),
        }
        cursor = found.end;
    }
    out.push_str(&text[cursor..]);

    Ok(Restored {
        text: out,
        restored,
        unresolved,
    })
}

/// Pipeline settings.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub restore_mode: RestoreMode,
}

/// Redacted text together with the store that can restore it.
#[derive(Debug, Clone)]
pub struct Redaction {
    pub text: String,
    pub store: MappingStore,
    pub spans_detected: usize,
}

/// Result of one full cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    /// Restored text returned to the caller.
    pub text: String,
    /// Distinct raw values redacted, per entity type.
    pub entities: BTreeMap<String, usize>,
    /// Spans the detector reported.
    pub spans_detected: usize,
    /// Placeholders restored after transformation.
    pub restored: usize,
    /// Tokens left unresolved.
    pub unresolved: Vec<String>,
}

/// Detector and transformer wired together for redact/transform/restore cycles.
pub struct Pipeline<'a> {
    detector: &'a dyn EntityDetector,
    transformer: &'a dyn Transformer,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        detector: &'a dyn EntityDetector,
        transformer: &'a dyn Transformer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            detector,
            transformer,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Detect and redact `text` into a fresh store.
    pub fn redact(&self, text: &str) -> Result<Redaction> {
        let spans = self.detector.analyze(text)?;
        let mut store = MappingStore::new();
        let redacted = redact_text(text, &spans, &mut store)?;
        Ok(Redaction {
            text: redacted,
            store,
            spans_detected: spans.len(),
        })
    }

    /// Run one complete cycle over `text`.
    ///
    /// A transformer failure ends the cycle before any restoration; the store
    /// is dropped with it.
    pub fn process(&self, text: &str) -> Result<CycleOutcome> {
        let Redaction {
            text: redacted,
            store,
            spans_detected,
        } = self.redact(text)?;
        info!(
            spans = spans_detected,
            entities = ?store.counts(),
            "text redacted"
        );

        let transformed = match self.transformer.transform(&redacted) {
            Ok(t) => t,
            Err(err) => {
                warn!(transformer = self.transformer.name(), error = %err, "transform failed");
                return Err(err);
            }
        };

        let restored = restore_text(&transformed, &store, self.options.restore_mode)?;
        if !restored.unresolved.is_empty() {
            warn!(
                unresolved = ?restored.unresolved,
                "placeholders left unresolved"
            );
        }
        info!(restored = restored.restored, "text restored");

        Ok(CycleOutcome {
            text: restored.text,
            entities: store.counts(),
            spans_detected,
            restored: restored.restored,
            unresolved: restored.unresolved,
        })
    }
}
