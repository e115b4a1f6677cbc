//! Event vocabulary shared by the CLI and the server.

use serde::{Deserialize, Serialize};

/// Log level as written to JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Where in the relay an event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// HTTP accept loop.
    Serve,
    /// One redact -> transform -> restore cycle.
    Cycle,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Serve => "serve",
            Stage::Cycle => "cycle",
        };
        write!(f, "{}", s)
    }
}

/// Stable event names, recorded in the `event` field.
pub mod event_names {
    pub const CONFIG_LOADED: &str = "config.loaded";

    pub const SERVER_STARTED: &str = "server.started";
    pub const SERVER_STOPPED: &str = "server.stopped";

    pub const REQUEST_RECEIVED: &str = "request.received";
    pub const REQUEST_REJECTED: &str = "request.rejected";

    pub const CYCLE_FINISHED: &str = "cycle.finished";
    pub const CYCLE_FAILED: &str = "cycle.failed";
}
