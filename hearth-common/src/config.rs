//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a TOML file. A missing file is not fatal:
//! a warning is logged and built-in defaults are used. Every field has a
//! default, so partial files are accepted.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `HEARTH_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent default (fallback)

use crate::session::{write_atomic, SessionStore};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "HEARTH_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HearthConfig {
    /// Folder holding session state (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub functions: FunctionsConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hosted backend functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionsConfig {
    /// Base URL; each function is served at `<base_url>/<name>`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FunctionsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Generation-job polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8888/.netlify/functions".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl HearthConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config, origin) = Self::load_with_origin(path)?;
        origin.log();
        Ok(config)
    }

    /// Same as [`HearthConfig::load`] but reports where the values came from
    /// instead of logging it, for callers that load before tracing is set up.
    pub fn load_with_origin(path: Option<&Path>) -> Result<(Self, ConfigOrigin)> {
        let path = match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        explicit.display()
                    )));
                }
                explicit.to_path_buf()
            }
            None => match default_config_path() {
                Some(default) if default.exists() => default,
                expected => {
                    return Ok((Self::default(), ConfigOrigin::Defaults { expected }));
                }
            },
        };

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)?;
        Ok((config, ConfigOrigin::File(path)))
    }

    /// Resolve the root folder using the priority order above
    pub fn resolve_root_folder(&self, cli_arg: Option<&Path>) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.root_folder {
            return path.clone();
        }

        // Priority 4: OS-dependent default
        default_root_folder()
    }

    /// Session store inside the resolved root folder
    pub fn session_store(&self, cli_arg: Option<&Path>) -> SessionStore {
        SessionStore::in_root_folder(&self.resolve_root_folder(cli_arg))
    }
}

/// Where a loaded [`HearthConfig`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from this file
    File(PathBuf),
    /// Built-in defaults; `expected` is the default file that was missing
    Defaults { expected: Option<PathBuf> },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigOrigin::Defaults {
                expected: Some(path),
            } => warn!("Config file not found at {}, using defaults", path.display()),
            ConfigOrigin::Defaults { expected: None } => {
                warn!("Could not determine config directory, using defaults")
            }
        }
    }
}

/// `<config dir>/hearth/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hearth").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hearth"))
        .unwrap_or_else(|| PathBuf::from("./hearth_data"))
}

/// Write a config file atomically (temp file + rename, 0600 on Unix)
pub fn write_toml_config(config: &HearthConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    write_atomic(target, content.as_bytes())
}
