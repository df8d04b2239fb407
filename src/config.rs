//! Configuration module for the command, poll intervals and tool filtering
//!
//! Reads/writes configuration from ~/.config/rmcp-picpu/picpu.toml

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sensors::provider::DEFAULT_COMMAND;

const DEFAULT_READ_TIMEOUT_SECS: u64 = 5;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Diagnostic command used for every reading
    #[serde(default = "default_command")]
    pub command: String,

    /// How long a tool waits for the command before giving up
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// List of disabled tool names (all others are enabled)
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Poll interval overrides in seconds, keyed by value uuid
    #[serde(default)]
    pub poll: BTreeMap<String, u64>,
}

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: default_command(),
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            disabled: Vec::new(),
            poll: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rmcp-picpu").join("picpu.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!("Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Never zero, a read always gets at least one second
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs.max(1))
    }

    /// Check if a tool is enabled
    pub fn is_enabled(&self, tool_name: &str) -> bool {
        !self.disabled.iter().any(|t| t == tool_name)
    }

    /// Get set of disabled tools for fast lookup
    pub fn disabled_set(&self) -> HashSet<String> {
        self.disabled.iter().cloned().collect()
    }

    /// Record a poll interval, keyed by the value uuid
    pub fn set_poll(&mut self, uuid: &str, seconds: u64) {
        let target = uuid.strip_suffix("_poll").unwrap_or(uuid);
        self.poll.insert(target.to_string(), seconds);
    }
}

/// Get list of all available tool names (compile-time known)
pub fn all_tool_names() -> Vec<&'static str> {
    vec![
        "get_cpu_temperature",
        "get_cpu_frequency",
        "get_cpu_voltage",
        "get_cpu_info",
        "list_values",
        "get_poll_interval",
        "set_poll_interval",
    ]
}
