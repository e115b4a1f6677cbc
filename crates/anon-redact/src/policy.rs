//! Detection policy configuration.
//!
//! Declares which recognizers run, how context words boost scores, and the
//! score threshold below which detected spans are ignored.

use serde::{Deserialize, Serialize};

/// Names of the recognizers that ship with the engine.
pub const BUILTIN_RECOGNIZERS: &[&str] = &[
    "SORTCODE",
    "EMAIL_ADDRESS",
    "PHONE_NUMBER",
    "CREDIT_CARD",
    "IP_ADDRESS",
];

/// Detection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPolicy {
    /// Spans scoring below this are dropped before redaction.
    #[serde(default)]
    pub score_threshold: f64,

    /// Built-in recognizers to enable, by entity type. Empty means none.
    #[serde(default = "default_builtin")]
    pub builtin: Vec<String>,

    /// Additional recognizers.
    #[serde(default)]
    pub custom: Vec<RecognizerSpec>,

    /// Context-word score enhancement.
    #[serde(default)]
    pub context: ContextPolicy,
}

fn default_builtin() -> Vec<String> {
    BUILTIN_RECOGNIZERS.iter().map(|s| s.to_string()).collect()
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            score_threshold: 0.0,
            builtin: default_builtin(),
            custom: Vec::new(),
            context: ContextPolicy::default(),
        }
    }
}

impl DetectionPolicy {
    /// Create a new policy with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognizer specs this policy enables, built-ins first.
    pub fn recognizer_specs(&self) -> Vec<RecognizerSpec> {
        let mut specs: Vec<RecognizerSpec> = builtin_specs()
            .into_iter()
            .filter(|spec| self.builtin.iter().any(|b| b == &spec.entity_type))
            .collect();
        specs.extend(self.custom.iter().cloned());
        specs
    }
}

/// How context words near a match raise its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPolicy {
    /// Added to a pattern score when a context word precedes the match.
    #[serde(default = "default_similarity_factor")]
    pub similarity_factor: f64,

    /// Floor applied to a context-boosted score.
    #[serde(default = "default_min_score_with_context")]
    pub min_score_with_context: f64,

    /// Number of words before a match searched for context words.
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_similarity_factor() -> f64 {
    0.75
}

fn default_min_score_with_context() -> f64 {
    0.4
}

fn default_window() -> usize {
    5
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self {
            similarity_factor: default_similarity_factor(),
            min_score_with_context: default_min_score_with_context(),
            window: default_window(),
        }
    }
}

/// A recognizer: one entity type, scored patterns, optional context words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerSpec {
    /// Entity type reported for matches.
    pub entity_type: String,

    /// Patterns, each with its own base score.
    pub patterns: Vec<PatternSpec>,

    /// Words that, appearing shortly before a match, raise its score.
    #[serde(default)]
    pub context: Vec<String>,
}

/// A named regex with a base confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub name: String,
    pub regex: String,
    pub score: f64,
}

impl PatternSpec {
    pub fn new(name: &str, regex: &str, score: f64) -> Self {
        Self {
            name: name.to_string(),
            regex: regex.to_string(),
            score,
        }
    }
}

/// Specs for every built-in recognizer.
pub fn builtin_specs() -> Vec<RecognizerSpec> {
    vec![
        RecognizerSpec {
            entity_type: "SORTCODE".to_string(),
            patterns: vec![
                PatternSpec::new("Sort Code (weak)", r"\b\d{6}\b", 0.001),
                PatternSpec::new("Sort Code (perfect)", r"\b\d{2}[-\s]\d{2}[-\s]\d{2}\b", 1.0),
            ],
            context: vec!["sortcode".to_string(), "sort".to_string()],
        },
        RecognizerSpec {
            entity_type: "EMAIL_ADDRESS".to_string(),
            patterns: vec![PatternSpec::new(
                "Email",
                r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b",
                1.0,
            )],
            context: vec!["email".to_string(), "mail".to_string()],
        },
        RecognizerSpec {
            entity_type: "PHONE_NUMBER".to_string(),
            patterns: vec![PatternSpec::new(
                "Phone",
                r"(?:\+?\d{1,3}[-.\s]?)?\(?\b\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
                0.4,
            )],
            context: vec![
                "phone".to_string(),
                "call".to_string(),
                "mobile".to_string(),
                "tel".to_string(),
            ],
        },
        RecognizerSpec {
            entity_type: "CREDIT_CARD".to_string(),
            patterns: vec![PatternSpec::new(
                "Credit card",
                r"\b(?:\d{4}[-\s]?){3}\d{4}\b|\b\d{4}[-\s]?\d{6}[-\s]?\d{5}\b",
                0.5,
            )],
            context: vec!["card".to_string(), "credit".to_string(), "visa".to_string()],
        },
        RecognizerSpec {
            entity_type: "IP_ADDRESS".to_string(),
            patterns: vec![PatternSpec::new(
                "IPv4",
                r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
                0.6,
            )],
            context: vec!["ip".to_string(), "address".to_string()],
        },
    ]
}
