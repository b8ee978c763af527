//! Watch definitions and their validation
//!
//! A [`WatchConfig`] pairs one watched directory with one sync directory.
//! User input arrives as a [`WatchRequest`] and is validated into a config;
//! every problem found is reported together in a [`ConfigError`].

use crate::escape::split_escapable;
use crate::filter::{Filter, FilterChain};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Delimiter for pattern lists in request text
pub const PATTERN_DELIMITER: char = ';';

/// Validation failure for a watch request
///
/// Holds every message found, in the order checks ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid watch: {}", .messages.join("; "))]
pub struct ConfigError {
    pub messages: Vec<String>,
}

impl ConfigError {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// A single watched directory and how it is mirrored
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    /// Display name, unique per installation
    pub name: String,
    /// Source directory
    pub watch_dir: PathBuf,
    /// Destination directory
    pub sync_dir: PathBuf,
    /// Copy created/changed files
    pub auto_add: bool,
    /// Delete files removed from the source
    pub auto_delete: bool,
    /// Include subdirectories
    pub recursive: bool,
    /// Quiet period before a batched sync, 0 for none
    pub delay_ms: u32,
    /// Filters applied to every candidate path
    pub filters: FilterChain,
    /// Events are injected by hand instead of coming from the OS
    pub observe: bool,
}

impl WatchConfig {
    /// Create a config with all flags off and no filters
    ///
    /// The name defaults to the watch directory.
    pub fn new(watch_dir: impl Into<PathBuf>, sync_dir: impl Into<PathBuf>) -> Self {
        let watch_dir = watch_dir.into();
        Self {
            name: watch_dir.display().to_string(),
            watch_dir,
            sync_dir: sync_dir.into(),
            auto_add: false,
            auto_delete: false,
            recursive: false,
            delay_ms: 0,
            filters: FilterChain::new(),
            observe: false,
        }
    }

    /// Quiet period, if delayed syncing is configured
    pub fn delay(&self) -> Option<Duration> {
        (self.delay_ms > 0).then(|| Duration::from_millis(u64::from(self.delay_ms)))
    }

    /// Whether reconciliation or events would do anything at all
    pub fn is_active(&self) -> bool {
        self.auto_add || self.auto_delete
    }
}

impl fmt::Display for WatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {})",
            self.name,
            self.watch_dir.display(),
            self.sync_dir.display()
        )
    }
}

/// Raw watch parameters as entered by a user
#[derive(Debug, Clone, Default)]
pub struct WatchRequest {
    pub name: Option<String>,
    pub watch_dir: PathBuf,
    pub sync_dir: PathBuf,
    pub auto_add: bool,
    pub auto_delete: bool,
    pub recursive: bool,
    pub delay_ms: u32,
    /// `;`-separated patterns excluded by full path
    pub exclude: String,
    /// `;`-separated patterns that paths must match
    pub include: String,
    pub observe: bool,
}

impl WatchRequest {
    /// Validate the request and build a config
    pub fn validate(self) -> Result<WatchConfig, ConfigError> {
        let mut messages = Vec::new();

        check_directory("Watch", &self.watch_dir, &mut messages);
        check_directory("Sync", &self.sync_dir, &mut messages);

        if same_directory(&self.watch_dir, &self.sync_dir) {
            messages.push("Watch and sync directory must be different".to_string());
        }

        if !messages.is_empty() {
            return Err(ConfigError { messages });
        }

        let mut filters = FilterChain::new();
        let exclude = split_escapable(&self.exclude, PATTERN_DELIMITER);
        if !exclude.is_empty() {
            filters.push(Filter::ExcludePath(exclude));
        }
        let include = split_escapable(&self.include, PATTERN_DELIMITER);
        if !include.is_empty() {
            filters.push(Filter::IncludeOnly(include));
        }

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.watch_dir.display().to_string());

        Ok(WatchConfig {
            name,
            watch_dir: self.watch_dir,
            sync_dir: self.sync_dir,
            auto_add: self.auto_add,
            auto_delete: self.auto_delete,
            recursive: self.recursive,
            delay_ms: self.delay_ms,
            filters,
            observe: self.observe,
        })
    }
}

fn check_directory(label: &str, path: &Path, messages: &mut Vec<String>) {
    if path.as_os_str().is_empty() {
        messages.push(format!("{} directory is required", label));
    } else if !path.exists() {
        messages.push(format!("{} directory does not exist: {}", label, path.display()));
    } else if !path.is_dir() {
        messages.push(format!("{} directory is not a directory: {}", label, path.display()));
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    if a.as_os_str().is_empty() || b.as_os_str().is_empty() {
        return false;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
