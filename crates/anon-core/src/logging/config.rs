//! Logging configuration.
//!
//! Supports configuration via:
//! - Environment variables (ANON_LOG, ANON_LOG_FORMAT, RUST_LOG)
//! - CLI flags (-v/-q, --log-format)

use serde::{Deserialize, Serialize};

/// Crates whose events are shown at the configured level.
const LOG_TARGETS: &[&str] = &["anon_core", "anon_redact", "anon_config"];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" | "structured" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Completely silent.
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

impl LogLevel {
    /// Level implied by `-v` count and `-q`.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Include timestamps in human output.
    pub timestamps: bool,
    /// Raw RUST_LOG directives, passed to the filter untouched.
    pub directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
            directives: None,
        }
    }
}

impl LogConfig {
    /// Create config from the process environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Create config from an arbitrary variable lookup and CLI overrides.
    ///
    /// Precedence: CLI > ANON_LOG > RUST_LOG > default.
    pub fn from_lookup<F>(lookup: F, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        if let Some(level) = lookup("ANON_LOG").and_then(|v| v.parse::<LogLevel>().ok()) {
            config.level = level;
        } else if let Some(val) = lookup("RUST_LOG") {
            config.directives = Some(val);
        }

        if let Some(format) = lookup("ANON_LOG_FORMAT").and_then(|v| v.parse::<LogFormat>().ok()) {
            config.format = format;
        }

        if let Some(level) = cli_level {
            config.level = level;
            config.directives = None;
        }
        if let Some(format) = cli_format {
            config.format = format;
        }

        config
    }

    /// Directive string for `EnvFilter`.
    pub fn filter_directive(&self) -> String {
        if let Some(raw) = &self.directives {
            return raw.clone();
        }
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("jsonl".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("quiet".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_from_verbosity() {
        assert_eq!(LogLevel::from_verbosity(0, false), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1, false), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(3, false), LogLevel::Trace);
        assert_eq!(LogLevel::from_verbosity(2, true), LogLevel::Error);
    }

    #[test]
    fn test_anon_log_beats_rust_log() {
        let config = LogConfig::from_lookup(
            lookup_from(&[("ANON_LOG", "debug"), ("RUST_LOG", "trace")]),
            None,
            None,
        );
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.directives.is_none());
        assert_eq!(
            config.filter_directive(),
            "anon_core=debug,anon_redact=debug,anon_config=debug"
        );
    }

    #[test]
    fn test_rust_log_passes_through() {
        let config = LogConfig::from_lookup(
            lookup_from(&[("RUST_LOG", "anon_redact=trace")]),
            None,
            None,
        );
        assert_eq!(config.filter_directive(), "anon_redact=trace");
    }

    #[test]
    fn test_cli_overrides_env() {
        let config = LogConfig::from_lookup(
            lookup_from(&[
                ("ANON_LOG", "debug"),
                ("RUST_LOG", "trace"),
                ("ANON_LOG_FORMAT", "human"),
            ]),
            Some(LogLevel::Warn),
            Some(LogFormat::Jsonl),
        );
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert!(config.filter_directive().starts_with("anon_core=warn"));
    }

    #[test]
    fn test_format_from_env() {
        let config = LogConfig::from_lookup(lookup_from(&[("ANON_LOG_FORMAT", "json")]), None, None);
        assert_eq!(config.format, LogFormat::Jsonl);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::default()
            .with_format(LogFormat::Jsonl)
            .with_level(LogLevel::Debug)
            .with_timestamps(false);

        assert_eq!(config.format, LogFormat::Jsonl);
        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.timestamps);
    }
}
