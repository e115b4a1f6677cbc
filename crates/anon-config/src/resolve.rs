//! Configuration resolution and path discovery.
//!
//! relay.json is looked up on the command line, then in the environment, then
//! in the user and system config directories. Nothing found means defaults.

use std::path::{Path, PathBuf};

/// Result of looking for relay.json.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// The file to load, or None to run on built-in defaults.
    pub relay: Option<PathBuf>,

    pub relay_source: ConfigSource,

    /// Every location examined, in order, up to and including the hit.
    pub searched: Vec<PathBuf>,
}

/// Where relay.json was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` on the command line.
    CliArgument,

    /// `ANON_RELAY_CONFIG` or `ANON_RELAY_CONFIG_DIR`.
    Environment,

    /// `$XDG_CONFIG_HOME/anon-relay/`.
    XdgConfig,

    /// `/etc/anon-relay/`.
    SystemConfig,

    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Path to relay.json, or to a directory holding it.
pub const ENV_RELAY_CONFIG: &str = "ANON_RELAY_CONFIG";
/// Directory holding relay.json.
pub const ENV_CONFIG_DIR: &str = "ANON_RELAY_CONFIG_DIR";

pub const RELAY_FILENAME: &str = "relay.json";

const APP_NAME: &str = "anon-relay";

/// Locate relay.json.
///
/// Candidates, first existing file wins:
/// 1. `cli_relay`
/// 2. `ANON_RELAY_CONFIG` (a directory there means `<dir>/relay.json`)
/// 3. `ANON_RELAY_CONFIG_DIR/relay.json`
/// 4. `~/.config/anon-relay/relay.json`
/// 5. `/etc/anon-relay/relay.json`
///
/// With no hit the relay runs on built-in defaults.
pub fn resolve_config(cli_relay: Option<&Path>) -> ConfigPaths {
    resolve_with(cli_relay, |var| std::env::var(var).ok())
}

fn resolve_with<F>(cli_relay: Option<&Path>, lookup: F) -> ConfigPaths
where
    F: Fn(&str) -> Option<String>,
{
    let mut paths = ConfigPaths::default();
    for (candidate, source) in candidates(cli_relay, lookup) {
        paths.searched.push(candidate.clone());
        if candidate.is_file() {
            paths.relay = Some(candidate);
            paths.relay_source = source;
            return paths;
        }
    }
    paths
}

fn candidates<F>(cli_relay: Option<&Path>, lookup: F) -> Vec<(PathBuf, ConfigSource)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = Vec::new();
    if let Some(path) = cli_relay {
        out.push((path.to_path_buf(), ConfigSource::CliArgument));
    }
    if let Some(value) = lookup(ENV_RELAY_CONFIG).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(value);
        let path = if path.is_dir() {
            path.join(RELAY_FILENAME)
        } else {
            path
        };
        out.push((path, ConfigSource::Environment));
    }
    if let Some(dir) = lookup(ENV_CONFIG_DIR).filter(|v| !v.is_empty()) {
        out.push((PathBuf::from(dir).join(RELAY_FILENAME), ConfigSource::Environment));
    }
    if let Some(dir) = xdg_config_dir() {
        out.push((dir.join(RELAY_FILENAME), ConfigSource::XdgConfig));
    }
    out.push((
        system_config_dir().join(RELAY_FILENAME),
        ConfigSource::SystemConfig,
    ));
    out
}

/// `~/.config/anon-relay` (platform equivalent via `dirs`).
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
