//! Placeholder token format.
//!
//! A placeholder is `<` + entity type + `_` + decimal index + `>`, e.g. `<PERSON_0>`.
//! The index never has leading zeros. The entity type is copied verbatim, so
//! parsing splits on the *last* underscore: `<CREDIT_CARD_3>` is type
//! `CREDIT_CARD`, index 3.

use crate::{MappingStore, RedactionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Generic token shape. Capture 1 is the entity type.
const PLACEHOLDER_SHAPE: &str = r"<([^<>\s]+)_(0|[1-9][0-9]*)>";

static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(PLACEHOLDER_SHAPE).unwrap());

/// Format the placeholder token for `entity_type` at `index`.
pub fn format_placeholder(entity_type: &str, index: usize) -> String {
    format!("<{}_{}>", entity_type, index)
}

/// Split a complete placeholder token into its entity type and index.
///
/// Returns `None` when `token` is not exactly one well-formed placeholder.
pub fn parse_placeholder(token: &str) -> Option<(&str, usize)> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    let (entity_type, digits) = inner.rsplit_once('_')?;
    if entity_type.is_empty() || digits.is_empty() {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    let index = digits.parse().ok()?;
    Some((entity_type, index))
}

/// A placeholder occurrence found inside a larger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderMatch<'a> {
    /// The full token, angle brackets included.
    pub token: &'a str,
    /// Entity type portion of the token.
    pub entity_type: &'a str,
    /// Byte offset of `<`.
    pub start: usize,
    /// Byte offset one past `>`.
    pub end: usize,
}

/// Find every placeholder-shaped token in `text`, left to right.
///
/// Only entity types without whitespace or angle brackets can be found this way.
pub fn find_placeholders(text: &str) -> Vec<PlaceholderMatch<'_>> {
    PLACEHOLDER_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let entity_type = caps.get(1)?.as_str();
            Some(PlaceholderMatch {
                token: whole.as_str(),
                entity_type,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Finds the placeholders a store issued, whatever their label, plus any
/// other token of the generic shape.
///
/// Labels may contain whitespace or angle brackets, which the generic shape
/// cannot see, so issued tokens are matched literally. Longer tokens are tried
/// first so a token that prefixes another never shadows it.
pub struct PlaceholderScanner<'s> {
    regex: Regex,
    issued: HashMap<&'s str, &'s str>,
}

impl<'s> PlaceholderScanner<'s> {
    /// Build a scanner for the tokens in `store`.
    pub fn for_store(store: &'s MappingStore) -> Result<Self> {
        let issued: HashMap<&str, &str> = store
            .tables()
            .flat_map(|(entity_type, table)| {
                table
                    .entries()
                    .iter()
                    .map(move |e| (e.placeholder.as_str(), entity_type))
            })
            .collect();

        if issued.is_empty() {
            return Ok(Self {
                regex: PLACEHOLDER_PATTERN.clone(),
                issued,
            });
        }

        let mut tokens: Vec<&str> = issued.keys().copied().collect();
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let mut pattern = tokens
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        pattern.push('|');
        pattern.push_str(PLACEHOLDER_SHAPE);

        let regex = Regex::new(&pattern)
            .map_err(|e| RedactionError::Pattern(format!("placeholder scanner: {}", e)))?;
        Ok(Self { regex, issued })
    }

    /// Every placeholder occurrence in `text`, left to right.
    pub fn find<'a>(&'a self, text: &'a str) -> Vec<PlaceholderMatch<'a>> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let token = whole.as_str();
                let entity_type = match self.issued.get(token) {
                    Some(t) => *t,
                    None => caps.get(1)?.as_str(),
                };
                Some(PlaceholderMatch {
                    token,
                    entity_type,
                    start: whole.start(),
                    end: whole.end(),
                })
            })
            .collect()
    }
}
