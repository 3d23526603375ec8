//! jsonbatch Configuration Module
//!
//! Defaults for dispatching and logging, stored in
//! `~/.config/jsonbatch/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`JSONBATCH_CONNECT_TIMEOUT_MS`, `JSONBATCH_READ_TIMEOUT_MS`, `JSONBATCH_LOG`)
//! 2. Config file (`~/.config/jsonbatch/config.toml`)
//! 3. Defaults
//!
//! A template's own `dispatch_options` always win over the `[dispatch]` section.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dispatch::DispatchOptions;
use crate::error::{BatchError, Result};
use crate::util::{REDIRECT_LIMIT, USER_AGENT};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchConfig {
    /// Dispatch options for templates that carry none
    #[serde(default)]
    pub dispatch: DispatchOptions,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub redirect_limit: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            redirect_limit: REDIRECT_LIMIT,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing-subscriber` filter directive, e.g. `info` or `jsonbatch=debug`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl BatchConfig {
    /// Returns `~/.config/jsonbatch/` on Unix, `%APPDATA%/jsonbatch/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jsonbatch")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default location
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BatchError::Config {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| BatchError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BatchError::Config {
            reason: format!("Failed to serialize config: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Empty or unparsable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Some(ms) = env_millis("JSONBATCH_CONNECT_TIMEOUT_MS") {
            self.dispatch.connect_timeout_ms = ms;
        }
        if let Some(ms) = env_millis("JSONBATCH_READ_TIMEOUT_MS") {
            self.dispatch.read_timeout_ms = ms;
        }
        if let Ok(filter) = std::env::var("JSONBATCH_LOG") {
            if !filter.is_empty() {
                self.log.filter = filter;
            }
        }
        self
    }
}

fn env_millis(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok().filter(|v| !v.is_empty())?;
    match raw.trim().parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring non-numeric timeout");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path_contains_jsonbatch() {
        let path = BatchConfig::config_path();
        assert!(path.to_string_lossy().contains("jsonbatch"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
        assert_eq!(path.parent().unwrap(), BatchConfig::config_dir());
    }

    #[test]
    fn test_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.dispatch, DispatchOptions::default());
        assert_eq!(config.http.redirect_limit, 5);
        assert!(config.http.user_agent.starts_with("jsonbatch/"));
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = BatchConfig::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, BatchConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[dispatch]\nread_timeout_ms = 1500\n\n[log]\nfilter = \"debug\"\n").unwrap();

        let config = BatchConfig::load_from(&path).unwrap();
        assert_eq!(config.dispatch.read_timeout_ms, 1500);
        assert_eq!(config.dispatch.connect_timeout_ms, 10_000);
        assert_eq!(config.log.filter, "debug");
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[dispatch\n").unwrap();
        assert_eq!(BatchConfig::load_from(&path).unwrap_err().code(), "JB-060");
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = BatchConfig::default();
        config.dispatch.fail_back_as_string = false;
        config.http.redirect_limit = 2;
        let loaded: BatchConfig = toml::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_env_overrides_config() {
        env::set_var("JSONBATCH_CONNECT_TIMEOUT_MS", "250");
        env::set_var("JSONBATCH_READ_TIMEOUT_MS", "soon");
        env::set_var("JSONBATCH_LOG", "");

        let config = BatchConfig::default().with_env();
        assert_eq!(config.dispatch.connect_timeout_ms, 250);
        // Unparsable and empty values are ignored
        assert_eq!(config.dispatch.read_timeout_ms, 30_000);
        assert_eq!(config.log.filter, "info");

        env::remove_var("JSONBATCH_CONNECT_TIMEOUT_MS");
        env::remove_var("JSONBATCH_READ_TIMEOUT_MS");
        env::remove_var("JSONBATCH_LOG");
    }
}
