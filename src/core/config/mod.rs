//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Shelfwork reads one user-scope config file plus environment overrides.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment (`SHELFWORK_STORE_URL`, `SHELFWORK_TOKEN`)
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$SHELFWORK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/shelfwork/config.toml`
//! 3. `~/.shelfwork/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use shelfwork::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! if let Some(url) = config.store_url() {
//!     println!("Store: {}", url);
//! }
//! println!("Timeout: {:?}", config.request_timeout());
//! ```

pub mod schema;

pub use schema::{CommitDefaults, GlobalConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::engine::collection::CommitStrategy;

/// Default per-request timeout when the config does not set one.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with environment overrides applied on read.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File-backed configuration
    pub global: GlobalConfig,
    /// Path the config was loaded from (if the file existed)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read,
    /// parsed, or validated.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or
    /// validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let global: GlobalConfig =
            toml::from_str(&text).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        global.validate()?;
        Ok(Self {
            global,
            path: Some(path.to_path_buf()),
        })
    }

    /// Write the configuration back to its canonical location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::WriteError` if the file cannot be written.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Self::config_path()?,
        };
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write the configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.global.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let text = toml::to_string_pretty(&self.global).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, text).map_err(|source| ConfigError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the config file location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoHomeDir` if no home directory can be found.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("SHELFWORK_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        if let Some(config_dir) = dirs::config_dir() {
            let xdg = config_dir.join("shelfwork").join("config.toml");
            if xdg.exists() {
                return Ok(xdg);
            }
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".shelfwork").join("config.toml"))
    }

    /// The store base URL, with `SHELFWORK_STORE_URL` taking precedence.
    pub fn store_url(&self) -> Option<String> {
        std::env::var("SHELFWORK_STORE_URL")
            .ok()
            .or_else(|| self.global.store_url.clone())
    }

    /// The admin API token, with `SHELFWORK_TOKEN` taking precedence.
    pub fn token(&self) -> Option<String> {
        std::env::var("SHELFWORK_TOKEN")
            .ok()
            .or_else(|| self.global.token.clone())
    }

    /// The per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.global
                .request_timeout_secs
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// The default commit strategy.
    pub fn commit_strategy(&self) -> CommitStrategy {
        self.global
            .commit
            .as_ref()
            .and_then(|commit| commit.strategy.as_deref())
            .and_then(CommitStrategy::from_name)
            .unwrap_or(CommitStrategy::Batch)
    }

    /// Read a config value by dotted key (for `shelf config get`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` for unrecognized keys.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match key {
            "store_url" => Ok(self.global.store_url.clone()),
            "token" => Ok(self.global.token.clone()),
            "request_timeout_secs" => {
                Ok(self.global.request_timeout_secs.map(|t| t.to_string()))
            }
            "commit.strategy" => Ok(self
                .global
                .commit
                .as_ref()
                .and_then(|commit| commit.strategy.clone())),
            _ => Err(ConfigError::UnknownKey(key.to_string())),
        }
    }

    /// Set a config value by dotted key (for `shelf config set`).
    ///
    /// The new value is validated before it sticks.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` for unrecognized keys and
    /// `ConfigError::InvalidValue` for rejected values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.global.clone();
        match key {
            "store_url" => updated.store_url = Some(value.to_string()),
            "token" => updated.token = Some(value.to_string()),
            "request_timeout_secs" => {
                let parsed: u64 = value.parse().map_err(|_| {
                    ConfigError::InvalidValue(format!(
                        "request_timeout_secs must be an integer, got '{value}'"
                    ))
                })?;
                updated.request_timeout_secs = Some(parsed);
            }
            "commit.strategy" => {
                updated.commit.get_or_insert_with(CommitDefaults::default).strategy =
                    Some(value.to_string());
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        updated.validate()?;
        self.global = updated;
        Ok(())
    }

    /// All keys understood by [`Config::get`] / [`Config::set`].
    pub fn keys() -> &'static [&'static str] {
        &["store_url", "token", "request_timeout_secs", "commit.strategy"]
    }
}
