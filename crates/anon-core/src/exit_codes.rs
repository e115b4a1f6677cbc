//! Exit codes for the anon-core CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-9: Success/operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal and upstream errors

use anon_redact::{ErrorKind, RedactionError};

/// Exit codes for anon-core operations.
///
/// These codes are a stable contract for automation. Changes require
/// a major version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Success / Operational Outcomes (0-9)
    // ========================================================================
    /// Success
    Clean = 0,

    /// Cycle completed, but some placeholder-shaped tokens were left unresolved
    Unresolved = 1,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Configuration missing, malformed, or failing validation
    ConfigError = 11,

    /// Input could not be read or was not valid UTF-8
    InputError = 12,

    /// A placeholder could not be resolved (strict restore)
    LookupError = 13,

    /// Feature required by the configuration was not compiled in
    CapabilityError = 14,

    // ========================================================================
    // Internal / Upstream Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// Transformer exceeded its deadline
    TimeoutError = 22,

    /// Transformer failed
    TransformError = 23,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Check if this exit code indicates operational outcome (codes 0-9).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal or upstream error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Check if this exit code indicates any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Unresolved => "OK_UNRESOLVED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::LookupError => "ERR_LOOKUP",
            ExitCode::CapabilityError => "ERR_CAPABILITY",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::TimeoutError => "ERR_TIMEOUT",
            ExitCode::TransformError => "ERR_TRANSFORM",
        }
    }

    /// Map an engine error onto the exit code contract.
    pub fn from_error(err: &RedactionError) -> Self {
        match err {
            RedactionError::Timeout { .. } => ExitCode::TimeoutError,
            RedactionError::Pattern(_) => ExitCode::ConfigError,
            RedactionError::Io(_) => ExitCode::IoError,
            _ => match err.kind() {
                ErrorKind::Configuration => ExitCode::ArgsError,
                ErrorKind::Lookup => ExitCode::LookupError,
                ErrorKind::Transform => ExitCode::TransformError,
                ErrorKind::Io => ExitCode::IoError,
                ErrorKind::Detection => ExitCode::InternalError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
