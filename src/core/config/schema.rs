//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$SHELFWORK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/shelfwork/config.toml`
//! 3. `~/.shelfwork/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the store URL must be http(s), the commit
//! strategy must be a known name).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::engine::collection::CommitStrategy;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// store_url = "https://admin.example.test/api/v1"
/// token = "swk_xxx"
/// request_timeout_secs = 30
///
/// [commit]
/// strategy = "batch"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Base URL of the content store's admin API
    pub store_url: Option<String>,

    /// Static bearer token for the admin API
    pub token: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,

    /// Commit defaults
    pub commit: Option<CommitDefaults>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.store_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "store_url must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if let Some(timeout) = self.request_timeout_secs {
            if timeout == 0 {
                return Err(ConfigError::InvalidValue(
                    "request_timeout_secs must be greater than zero".to_string(),
                ));
            }
        }

        if let Some(commit) = &self.commit {
            commit.validate()?;
        }

        Ok(())
    }
}

/// Commit defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommitDefaults {
    /// Default commit strategy ("batch" or "per-item")
    pub strategy: Option<String>,
}

impl CommitDefaults {
    /// Validate the commit defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the strategy is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(strategy) = &self.strategy {
            if CommitStrategy::from_name(strategy).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid commit strategy '{}', must be one of: {}",
                    strategy,
                    CommitStrategy::NAMES.join(", ")
                )));
            }
        }
        Ok(())
    }
}
