//! Daemon configuration commands

use crate::common::TestDirs;
use crate::mirror;
use anyhow::Result;
use std::fs;

#[test]
fn test_defaults_without_file() -> Result<()> {
    let dirs = TestDirs::new()?;

    let value = mirror!(&dirs.root, "config", "get", "sync.retry_attempts").assert_success()?;
    assert_eq!(value.trimmed(), "5");

    let listed = mirror!(&dirs.root, "config", "list").assert_success()?;
    assert!(listed.contains_stdout("retry_backoff_ms"));
    assert!(listed.contains_stdout("repeat_window_ms"));
    Ok(())
}

#[test]
fn test_set_persists_and_validates() -> Result<()> {
    let dirs = TestDirs::new()?;
    let config_file = dirs.root.join("config.toml");

    mirror!(&dirs.root, "config", "set", "sync.max_parallel_ops", "4").assert_success()?;
    assert!(fs::read_to_string(&config_file)?.contains("max_parallel_ops = 4"));

    let value = mirror!(&dirs.root, "config", "get", "sync.max_parallel_ops").assert_success()?;
    assert_eq!(value.trimmed(), "4");

    mirror!(&dirs.root, "config", "set", "sync.max_parallel_ops", "0").assert_failure()?;
    mirror!(&dirs.root, "config", "set", "log.level", "chatty").assert_failure()?;
    mirror!(&dirs.root, "config", "get", "sync.unknown").assert_failure()?;

    let value = mirror!(&dirs.root, "config", "get", "sync.max_parallel_ops").assert_success()?;
    assert_eq!(value.trimmed(), "4");
    Ok(())
}

#[test]
fn test_path_create_and_example() -> Result<()> {
    let dirs = TestDirs::new()?;
    let config_file = dirs.root.join("config.toml");

    let result = mirror!(&dirs.root, "config", "path").assert_success()?;
    assert!(result.contains_stdout("does not exist"));

    mirror!(&dirs.root, "config", "path", "--create").assert_success()?;
    assert!(config_file.exists());

    let example = mirror!(&dirs.root, "config", "example").assert_success()?;
    assert!(example.contains_stdout("[sync]"));
    assert!(example.contains_stdout("retry_attempts = 5"));
    Ok(())
}
