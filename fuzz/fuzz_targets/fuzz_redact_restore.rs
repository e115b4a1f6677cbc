//! Fuzz target for redaction followed by restoration.
//!
//! Arbitrary spans over arbitrary text must either be rejected or redact
//! cleanly. When the input holds no placeholder-shaped tokens of its own,
//! restoring the redacted text must give back the input exactly.

#![no_main]

use anon_redact::{
    find_placeholders, redact_text, restore_text, DetectedSpan, MappingStore, RestoreMode,
};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

const ENTITY_TYPES: &[&str] = &["PERSON", "SORTCODE", "EMAIL_ADDRESS", "CREDIT_CARD"];

#[derive(Debug, Arbitrary)]
struct FuzzSpan {
    type_choice: u8,
    start: u16,
    len: u8,
}

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    spans: Vec<FuzzSpan>,
}

fuzz_target!(|input: Input| {
    let spans: Vec<DetectedSpan> = input
        .spans
        .iter()
        .map(|s| {
            let entity_type = ENTITY_TYPES[s.type_choice as usize % ENTITY_TYPES.len()];
            let start = s.start as usize;
            DetectedSpan::new(entity_type, start, start + s.len as usize, 1.0)
        })
        .collect();

    let mut store = MappingStore::new();
    let redacted = match redact_text(&input.text, &spans, &mut store) {
        Ok(r) => r,
        Err(_) => return,
    };

    let restored = restore_text(&redacted, &store, RestoreMode::Strict);
    if find_placeholders(&input.text).is_empty() {
        let restored = restored.expect("own placeholders must resolve");
        assert_eq!(restored.text, input.text);
        assert!(restored.unresolved.is_empty());
    }
});
