//! Fuzz target for relay.json configuration parsing.
//!
//! Parsing and validation must reject bad input with an error, never panic.
//! Validation also compiles every custom regex.

#![no_main]

use anon_config::{validate_config, RelayConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(config) = RelayConfig::parse_json(data) {
        let _ = validate_config(&config);
    }
});
