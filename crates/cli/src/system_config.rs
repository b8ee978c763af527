//! Daemon configuration file
//!
//! `config.toml` holds tuning for the sync engine and logging. Every field
//! is optional; missing values take their defaults.
//!
//! ```toml
//! [sync]
//! retry_attempts = 5
//! retry_backoff_ms = 300
//! max_parallel_ops = 16
//! repeat_window_ms = 100
//!
//! [log]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use mirror_watcher::{RetryPolicy, SessionOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Keys accepted by [`SystemConfig::get_key`] and [`SystemConfig::set_key`]
pub const KEYS: &[&str] = &[
    "sync.retry_attempts",
    "sync.retry_backoff_ms",
    "sync.max_parallel_ops",
    "sync.repeat_window_ms",
    "log.directory",
    "log.level",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemConfigError {
    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },

    #[error("log.level must be one of trace, debug, info, warn, error; got '{0}'")]
    InvalidLevel(String),

    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub sync: SyncConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Attempts per copy/delete/rename before giving up
    pub retry_attempts: u32,
    /// Pause between attempts
    pub retry_backoff_ms: u64,
    /// Operations in flight during reconciliation
    pub max_parallel_ops: usize,
    /// Same-path change events within this window are dropped
    pub repeat_window_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Where `run` writes daemon.log; `<data dir>/logs` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    pub level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 5,
            retry_backoff_ms: 300,
            max_parallel_ops: 16,
            repeat_window_ms: 100,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: None,
            level: "info".to_string(),
        }
    }
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), SystemConfigError> {
    if value < min || value > max {
        return Err(SystemConfigError::OutOfRange { key, min, max, value });
    }
    Ok(())
}

impl SystemConfig {
    /// Check every value against its valid range
    pub fn validate(&self) -> Result<(), SystemConfigError> {
        check_range("sync.retry_attempts", self.sync.retry_attempts as u64, 1, 50)?;
        check_range("sync.retry_backoff_ms", self.sync.retry_backoff_ms, 10, 60_000)?;
        check_range("sync.max_parallel_ops", self.sync.max_parallel_ops as u64, 1, 256)?;
        check_range("sync.repeat_window_ms", self.sync.repeat_window_ms, 0, 10_000)?;

        if tracing::Level::from_str(&self.log.level).is_err() {
            return Err(SystemConfigError::InvalidLevel(self.log.level.clone()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.sync.retry_attempts,
            backoff: Duration::from_millis(self.sync.retry_backoff_ms),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            retry: self.retry_policy(),
            max_parallel_ops: self.sync.max_parallel_ops,
            repeat_window: Duration::from_millis(self.sync.repeat_window_ms),
            ..SessionOptions::default()
        }
    }

    /// Log directory, falling back to `<data_dir>/logs`
    pub fn log_directory(&self, data_dir: &Path) -> PathBuf {
        self.log
            .directory
            .clone()
            .unwrap_or_else(|| data_dir.join("logs"))
    }

    /// Current value of `key` as text
    pub fn get_key(&self, key: &str) -> Result<String, SystemConfigError> {
        let value = match key {
            "sync.retry_attempts" => self.sync.retry_attempts.to_string(),
            "sync.retry_backoff_ms" => self.sync.retry_backoff_ms.to_string(),
            "sync.max_parallel_ops" => self.sync.max_parallel_ops.to_string(),
            "sync.repeat_window_ms" => self.sync.repeat_window_ms.to_string(),
            "log.directory" => self
                .log
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
            "log.level" => self.log.level.clone(),
            _ => return Err(SystemConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Parse `value` into `key`, then validate the whole config
    ///
    /// Leaves the config untouched on error.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        next.apply_key(key, value)?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn apply_key(&mut self, key: &str, value: &str) -> Result<()> {
        let number = || -> Result<u64> {
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for {}: must be a non-negative integer", key))
        };

        match key {
            "sync.retry_attempts" => {
                self.sync.retry_attempts = u32::try_from(number()?).context("Value too large")?
            }
            "sync.retry_backoff_ms" => self.sync.retry_backoff_ms = number()?,
            "sync.max_parallel_ops" => {
                self.sync.max_parallel_ops = usize::try_from(number()?).context("Value too large")?
            }
            "sync.repeat_window_ms" => self.sync.repeat_window_ms = number()?,
            "log.directory" => {
                // Empty clears the override
                self.log.directory = Some(value.trim())
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from);
            }
            "log.level" => self.log.level = value.trim().to_ascii_lowercase(),
            _ => return Err(SystemConfigError::UnknownKey(key.to_string()).into()),
        }
        Ok(())
    }
}

/// `<config dir>/mirror/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mirror").join(CONFIG_FILE))
}

/// Load the config at `path`; a missing file gives the defaults
pub fn load(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(SystemConfig::default());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;

    Ok(config)
}

pub fn save(path: &Path, config: &SystemConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, text).with_context(|| format!("Failed to write config file {}", path.display()))?;
    debug!("Saved config to {}", path.display());
    Ok(())
}

/// Write the defaults unless a file already exists; true if written
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save(path, &SystemConfig::default())?;
    info!("Created default config at {}", path.display());
    Ok(true)
}

/// Commented example config with every key at its default
pub fn example_config() -> String {
    let defaults = SystemConfig::default();
    format!(
        r#"# Mirror daemon configuration

[sync]
# Attempts per copy/delete/rename before giving up (1-50)
retry_attempts = {}

# Pause between attempts in milliseconds (10-60000)
retry_backoff_ms = {}

# Operations in flight during a full reconciliation (1-256)
max_parallel_ops = {}

# Change events for the same path within this window are dropped (0-10000)
repeat_window_ms = {}

[log]
# Directory for daemon.log; defaults to <data dir>/logs
# directory = "/var/log/mirror"

# One of trace, debug, info, warn, error
level = "{}"
"#,
        defaults.sync.retry_attempts,
        defaults.sync.retry_backoff_ms,
        defaults.sync.max_parallel_ops,
        defaults.sync.repeat_window_ms,
        defaults.log.level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy().attempts, 5);
        assert_eq!(config.retry_policy().backoff, Duration::from_millis(300));

        let options = config.session_options();
        assert_eq!(options.max_parallel_ops, 16);
        assert_eq!(options.repeat_window, Duration::from_millis(100));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut config = SystemConfig::default();
        config.sync.retry_attempts = 0;
        assert_eq!(
            config.validate(),
            Err(SystemConfigError::OutOfRange {
                key: "sync.retry_attempts",
                min: 1,
                max: 50,
                value: 0
            })
        );

        let mut config = SystemConfig::default();
        config.sync.max_parallel_ops = 1000;
        assert!(config.validate().is_err());

        let mut config = SystemConfig::default();
        config.log.level = "loud".to_string();
        assert_eq!(
            config.validate(),
            Err(SystemConfigError::InvalidLevel("loud".to_string()))
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "[sync]\nretry_attempts = 9\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.sync.retry_attempts, 9);
        assert_eq!(config.sync.retry_backoff_ms, 300);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = load(&temp_dir.path().join("none.toml")).unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "[sync]\nretry_attempts = 500\n").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = SystemConfig::default();
        config.set_key("sync.retry_backoff_ms", "1000").unwrap();
        config.set_key("log.directory", "/tmp/mirror-logs").unwrap();
        save(&path, &config).unwrap();

        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn test_set_and_get_keys() {
        let mut config = SystemConfig::default();
        for key in KEYS {
            assert!(config.get_key(key).is_ok(), "{}", key);
        }

        config.set_key("log.level", "DEBUG").unwrap();
        assert_eq!(config.get_key("log.level").unwrap(), "debug");

        assert!(config.set_key("sync.retry_attempts", "abc").is_err());
        assert!(config.set_key("sync.retry_attempts", "99").is_err());
        assert!(config.set_key("sync.nope", "1").is_err());
        assert!(config.get_key("sync.nope").is_err());

        config.set_key("log.directory", "").unwrap();
        assert_eq!(config.log.directory, None);
    }

    #[test]
    fn test_init_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);

        assert!(init_if_missing(&path).unwrap());
        assert!(!init_if_missing(&path).unwrap());
        assert_eq!(load(&path).unwrap(), SystemConfig::default());
    }

    #[test]
    fn test_example_parses_to_defaults() {
        let parsed: SystemConfig = toml::from_str(&example_config()).unwrap();
        assert_eq!(parsed, SystemConfig::default());
    }

    #[test]
    fn test_log_directory_fallback() {
        let config = SystemConfig::default();
        assert_eq!(
            config.log_directory(Path::new("/data")),
            PathBuf::from("/data/logs")
        );
    }
}
