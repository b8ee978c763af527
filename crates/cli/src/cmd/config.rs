//! Configuration management command
//!
//! Provides CLI interface to view and edit the daemon configuration.

use anyhow::{Context, Result};
use mirror_cli::{system_config, AppPaths};
use owo_colors::OwoColorize;

/// List all configuration values
pub async fn run_list(paths: &AppPaths) -> Result<()> {
    let config = system_config::load(&paths.config_file)?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), paths.config_file.display().dimmed());

    println!("{}", "[sync]".yellow());
    println!("  {} = {}", "retry_attempts".cyan(), config.sync.retry_attempts);
    println!(
        "  {} = {} {}",
        "retry_backoff_ms".cyan(),
        config.sync.retry_backoff_ms,
        format!("({}ms between attempts)", config.sync.retry_backoff_ms).dimmed()
    );
    println!("  {} = {}", "max_parallel_ops".cyan(), config.sync.max_parallel_ops);
    println!(
        "  {} = {} {}",
        "repeat_window_ms".cyan(),
        config.sync.repeat_window_ms,
        if config.sync.repeat_window_ms == 0 {
            "(repeats never dropped)".dimmed().to_string()
        } else {
            format!("({}ms)", config.sync.repeat_window_ms).dimmed().to_string()
        }
    );

    println!("\n{}", "[log]".yellow());
    println!(
        "  {} = {}",
        "directory".cyan(),
        config.log_directory(&paths.data_dir).display()
    );
    println!("  {} = {}", "level".cyan(), config.log.level);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  retry_attempts: 1-50");
    println!("  retry_backoff_ms: 10-60,000");
    println!("  max_parallel_ops: 1-256");
    println!("  repeat_window_ms: 0-10,000 (0 = never drop)");
    println!("  level: trace, debug, info, warn, error");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(paths: &AppPaths, key: &str) -> Result<()> {
    let config = system_config::load(&paths.config_file)?;
    let value = config
        .get_key(key)
        .context("Use 'mirror config list' to see available keys")?;
    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(paths: &AppPaths, key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load(&paths.config_file)?;
    config
        .set_key(key, value)
        .context("Invalid configuration value")?;
    system_config::save(&paths.config_file, &config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    println!(
        "{}",
        "Note: Restart 'mirror run' for changes to take effect".yellow()
    );
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(paths: &AppPaths, create: bool) -> Result<()> {
    let config_path = &paths.config_file;

    if create && system_config::init_if_missing(config_path)? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}
