//! Entity detection using scored regex recognizers.
//!
//! The pipeline only depends on the [`EntityDetector`] trait. [`PatternDetector`]
//! is the bundled implementation: per-entity regex recognizers, a context-word
//! score boost, overlap removal, and a score threshold.

use crate::policy::{ContextPolicy, DetectionPolicy, RecognizerSpec};
use crate::{RedactionError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A sensitive span over the analyzed text. Offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSpan {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl DetectedSpan {
    pub fn new(entity_type: &str, start: usize, end: usize, score: f64) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            start,
            end,
            score,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn overlaps(&self, other: &DetectedSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Anything that can find sensitive spans in a text.
pub trait EntityDetector: Send + Sync {
    /// Return detected spans over `text`, in any order.
    fn analyze(&self, text: &str) -> Result<Vec<DetectedSpan>>;
}

/// A compiled regex with its base score.
#[derive(Debug, Clone)]
struct ScoredPattern {
    regex: Regex,
    score: f64,
}

/// Compiled form of a [`RecognizerSpec`].
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    entity_type: String,
    patterns: Vec<ScoredPattern>,
    context: Vec<String>,
}

impl PatternRecognizer {
    /// Compile a recognizer. Fails on an invalid regex.
    pub fn from_spec(spec: &RecognizerSpec) -> Result<Self> {
        let patterns = spec
            .patterns
            .iter()
            .map(|p| {
                Regex::new(&p.regex)
                    .map(|regex| ScoredPattern {
                        regex,
                        score: p.score,
                    })
                    .map_err(|e| {
                        RedactionError::Pattern(format!(
                            "{} pattern '{}': {}",
                            spec.entity_type, p.name, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entity_type: spec.entity_type.clone(),
            patterns,
            context: spec.context.iter().map(|w| w.to_lowercase()).collect(),
        })
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Raw matches for every pattern, with context boosting applied.
    fn matches(&self, text: &str, context: &ContextPolicy) -> Vec<DetectedSpan> {
        let mut spans = Vec::new();
        for pattern in &self.patterns {
            for m in pattern.regex.find_iter(text) {
                if m.start() == m.end() {
                    continue;
                }
                let mut score = pattern.score;
                if self.has_context(&text[..m.start()], context.window) {
                    score = (score + context.similarity_factor)
                        .max(context.min_score_with_context)
                        .min(1.0);
                }
                spans.push(DetectedSpan::new(&self.entity_type, m.start(), m.end(), score));
            }
        }
        spans
    }

    /// True if one of the last `window` words of `prefix` contains a context word,
    /// so `sort` also counts after `sorting`.
    fn has_context(&self, prefix: &str, window: usize) -> bool {
        if self.context.is_empty() || window == 0 {
            return false;
        }
        prefix
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .rev()
            .take(window)
            .any(|w| {
                let w = w.to_lowercase();
                self.context.iter().any(|c| w.contains(c.as_str()))
            })
    }
}

/// Regex-based detector.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    recognizers: Vec<PatternRecognizer>,
    context: ContextPolicy,
    score_threshold: f64,
}

impl PatternDetector {
    /// Build a detector from a policy, compiling every enabled recognizer.
    pub fn from_policy(policy: &DetectionPolicy) -> Result<Self> {
        let recognizers = policy
            .recognizer_specs()
            .iter()
            .map(PatternRecognizer::from_spec)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            recognizers,
            context: policy.context.clone(),
            score_threshold: policy.score_threshold,
        })
    }

    /// Detector with the default policy.
    pub fn with_defaults() -> Result<Self> {
        Self::from_policy(&DetectionPolicy::default())
    }

    /// Entity types this detector can report.
    pub fn entity_types(&self) -> Vec<&str> {
        self.recognizers.iter().map(|r| r.entity_type()).collect()
    }
}

impl EntityDetector for PatternDetector {
    fn analyze(&self, text: &str) -> Result<Vec<DetectedSpan>> {
        let candidates: Vec<DetectedSpan> = self
            .recognizers
            .iter()
            .flat_map(|r| r.matches(text, &self.context))
            .filter(|s| s.score >= self.score_threshold)
            .collect();
        Ok(remove_overlaps(candidates))
    }
}

/// Keep the best of each group of overlapping spans and order by start.
///
/// Preference: higher score, then longer span, then earlier start.
pub fn remove_overlaps(mut spans: Vec<DetectedSpan>) -> Vec<DetectedSpan> {
    spans.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.start.cmp(&b.start))
    });

    let mut kept: Vec<DetectedSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if !kept.iter().any(|k| k.overlaps(&span)) {
            kept.push(span);
        }
    }
    kept.sort_by_key(|s| s.start);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PatternSpec;

    fn sortcode_only() -> PatternDetector {
        let policy = DetectionPolicy {
            builtin: vec!["SORTCODE".to_string()],
            ..DetectionPolicy::default()
        };
        PatternDetector::from_policy(&policy).unwrap()
    }

    #[test]
    fn test_perfect_sort_code() {
        let results = sortcode_only().analyze("My sort code is 12-34-56.").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entity_type, "SORTCODE");
        assert_eq!(results[0].start, 16);
        assert_eq!(results[0].end, 24);
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_weak_sort_code_with_context() {
        let results = sortcode_only().analyze("My sort code is 123456.").unwrap();
        assert_eq!(results[0].entity_type, "SORTCODE");
        assert_eq!(results[0].start, 16);
        assert_eq!(results[0].end, 22);
        assert!(results[0].score > 0.01);
    }

    #[test]
    fn test_weak_sort_code_without_context() {
        let results = sortcode_only().analyze("Here is a number: 123456.").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0.001);
    }

    #[test]
    fn test_no_sort_code() {
        let results = PatternDetector::with_defaults()
            .unwrap()
            .analyze("This text does not contain any sort codes or personal information.")
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_multiple_sort_codes() {
        let text = "First sort code: 12-34-56. Second sort code: 123456.";
        let results = sortcode_only().analyze(text).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!((results[0].start, results[0].end), (17, 25));
        assert_eq!(results[0].score, 1.0);
        assert_eq!((results[1].start, results[1].end), (45, 51));
        assert!(results[1].score > 0.01);
    }

    #[test]
    fn test_score_threshold_drops_weak_matches() {
        let policy = DetectionPolicy {
            builtin: vec!["SORTCODE".to_string()],
            score_threshold: 0.5,
            ..DetectionPolicy::default()
        };
        let detector = PatternDetector::from_policy(&policy).unwrap();
        assert!(detector.analyze("a number: 123456").unwrap().is_empty());
        assert_eq!(detector.analyze("sort code 123456").unwrap().len(), 1);
    }

    #[test]
    fn test_email_detection() {
        let detector = PatternDetector::with_defaults().unwrap();
        let text = "Mail jane.doe@example.com today";
        let results = detector.analyze(text).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entity_type, "EMAIL_ADDRESS");
        assert_eq!(&text[results[0].start..results[0].end], "jane.doe@example.com");
    }

    #[test]
    fn test_remove_overlaps_prefers_score_then_length() {
        let spans = vec![
            DetectedSpan::new("A", 0, 6, 0.5),
            DetectedSpan::new("B", 2, 10, 0.9),
            DetectedSpan::new("C", 12, 14, 0.1),
            DetectedSpan::new("D", 12, 16, 0.1),
        ];
        let kept = remove_overlaps(spans);
        let types: Vec<&str> = kept.iter().map(|s| s.entity_type.as_str()).collect();
        assert_eq!(types, vec!["B", "D"]);
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let policy = DetectionPolicy {
            custom: vec![RecognizerSpec {
                entity_type: "BROKEN".to_string(),
                patterns: vec![PatternSpec::new("bad", r"(unclosed", 0.5)],
                context: Vec::new(),
            }],
            ..DetectionPolicy::default()
        };
        let err = PatternDetector::from_policy(&policy).unwrap_err();
        assert!(matches!(err, RedactionError::Pattern(_)));
        assert!(err.to_string().contains("BROKEN"));
    }

    #[test]
    fn test_context_window_limits_lookbehind() {
        let recognizer = PatternRecognizer::from_spec(&RecognizerSpec {
            entity_type: "X".to_string(),
            patterns: vec![PatternSpec::new("x", r"\d+", 0.1)],
            context: vec!["code".to_string()],
        })
        .unwrap();
        assert!(recognizer.has_context("the Code is ", 5));
        assert!(!recognizer.has_context("code a b c d e f ", 5));
    }

    #[test]
    fn test_context_word_inside_longer_word() {
        let results = sortcode_only().analyze("Sorting number 123456").unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].score >= 0.4);

        let results = sortcode_only().analyze("Unrelated number 123456").unwrap();
        assert_eq!(results[0].score, 0.001);
    }
}
