//! Fuzz target for placeholder scanning.
//!
//! Every token `find_placeholders` reports must parse back with
//! `parse_placeholder` (unless its index overflows `usize`) and re-format to
//! the same text.

#![no_main]

use anon_redact::{find_placeholders, format_placeholder, parse_placeholder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    for m in find_placeholders(data) {
        assert_eq!(&data[m.start..m.end], m.token);
        if let Some((entity_type, index)) = parse_placeholder(m.token) {
            assert_eq!(entity_type, m.entity_type);
            assert_eq!(format_placeholder(entity_type, index), m.token);
        }
    }
    let _ = parse_placeholder(data);
});
