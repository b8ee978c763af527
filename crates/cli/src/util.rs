//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use mirror_core::WatchConfig;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resolved locations of the snapshot and the config file
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
}

impl AppPaths {
    /// Explicit paths win; otherwise the platform data and config dirs
    pub fn resolve(data_dir: Option<PathBuf>, config_file: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::data_dir()
                .context("Could not determine the data directory; pass --data-dir")?
                .join("mirror"),
        };
        let config_file = match config_file {
            Some(file) => file,
            None => crate::system_config::default_config_path()
                .context("Could not determine the config directory; pass --config")?,
        };
        Ok(Self { data_dir, config_file })
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Log to stderr; `RUST_LOG` overrides `default_level`
pub fn init_logging(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

/// Log to stdout and to `<log_dir>/daemon.log`
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init_daemon_logging(level: &str, log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, "daemon.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(fmt::layer().with_target(false).with_writer(std::io::stdout))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

/// Short description of a watch's flags ("recursive, add, delete, 500ms delay")
pub fn format_flags(config: &WatchConfig) -> String {
    let mut flags = Vec::new();
    if config.recursive {
        flags.push("recursive".to_string());
    }
    if config.auto_add {
        flags.push("add".to_string());
    }
    if config.auto_delete {
        flags.push("delete".to_string());
    }
    if config.delay_ms > 0 {
        flags.push(format!("{} delay", format_delay(config.delay_ms)));
    }
    if config.observe {
        flags.push("observe".to_string());
    }

    if flags.is_empty() {
        "manual".to_string()
    } else {
        flags.join(", ")
    }
}

/// Milliseconds as "750ms", "2s" or "1.5s"
pub fn format_delay(ms: u32) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

/// Print a watch as an indented block
pub fn display_watch(config: &WatchConfig, running: bool) {
    let state = if running {
        "running".green().to_string()
    } else {
        "stopped".dimmed().to_string()
    };
    println!("{} {}", config.name.bold(), format!("[{}]", state).dimmed());
    println!("  {} {}", "watch:".dimmed(), config.watch_dir.display());
    println!("  {} {}", "sync: ".dimmed(), config.sync_dir.display());
    println!("  {} {}", "flags:".dimmed(), format_flags(config).cyan());
    for filter in config.filters.filters() {
        println!("  {} {}", "filter:".dimmed(), filter);
    }
}
