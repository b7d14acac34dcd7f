//! Server configuration.
//!
//! Read from the TOML file named by `GAME_SERVER_CONFIG` (default
//! `game-server.toml`); a missing file means every default applies.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "GAME_SERVER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "game-server.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub runtime: RuntimeConfig,
    /// Content directory (`game.toml`, `skills/`, `maps/`). When unset the
    /// content compiled into `game-content` is used and `runtime.game_config`
    /// applies as written.
    pub data_dir: Option<PathBuf>,
    /// Map loaded from `{data_dir}/maps/{map}.ron`.
    pub map: String,
    /// Write every published event to a JSON lines file.
    pub event_log: bool,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub filter: String,
    /// Also log to a daily rolling file.
    pub file: bool,
    /// Overrides the platform cache directory for log files.
    pub dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let mut runtime = RuntimeConfig::default();
        runtime.auto_tick = true;
        Self {
            runtime,
            data_dir: None,
            map: "training_field".to_string(),
            event_log: false,
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: true,
            dir: None,
        }
    }
}

impl ServerConfig {
    /// Load from the path in `GAME_SERVER_CONFIG`, or the default path.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read server config {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse server config {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert!(config.runtime.auto_tick);
    }

    #[test]
    fn nested_sections_override_defaults() {
        let config = ServerConfig::parse(
            r#"
            data_dir = "content"
            event_log = true

            [runtime]
            command_buffer_size = 64

            [runtime.game_config]
            tick_ms = 40
            world_seed = 7

            [log]
            filter = "skill=debug"
            file = false
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir.as_deref(), Some(Path::new("content")));
        assert!(config.event_log);
        assert_eq!(config.runtime.command_buffer_size, 64);
        assert_eq!(config.runtime.game_config.tick_ms, 40);
        assert_eq!(config.runtime.game_config.world_seed, 7);
        assert_eq!(config.map, "training_field");
        assert_eq!(config.log.filter, "skill=debug");
        assert!(!config.log.file);
    }

    #[test]
    fn unknown_value_types_are_errors() {
        assert!(ServerConfig::parse("event_log = \"yes\"").is_err());
    }
}
