//! Anonymizing relay library.
//!
//! This library provides the pieces behind the `anon-core` binary:
//! - Exit codes for CLI operations
//! - Configuration loading and validation
//! - Structured logging
//! - The long-lived [`runtime::Relay`] shared by every cycle
//! - The HTTP server
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod runtime;
pub mod server;
