//! Key/value settings through the CLI

use crate::common::TestDirs;
use crate::mirror;
use anyhow::Result;
use std::fs;

#[test]
fn test_set_get_unset() -> Result<()> {
    let dirs = TestDirs::new()?;

    mirror!(&dirs.root, "kv", "set", "greeting", "hello world").assert_success()?;
    mirror!(&dirs.root, "kv", "set", "retries", "3", "--type", "int").assert_success()?;
    mirror!(&dirs.root, "kv", "set", "ratio", "0.5", "--type", "float").assert_success()?;
    mirror!(&dirs.root, "kv", "set", "enabled", "true", "-t", "bool").assert_success()?;

    assert_eq!(mirror!(&dirs.root, "kv", "get", "greeting").assert_success()?.trimmed(), "hello world");
    assert_eq!(mirror!(&dirs.root, "kv", "get", "retries").assert_success()?.trimmed(), "3");
    assert_eq!(mirror!(&dirs.root, "kv", "get", "ratio").assert_success()?.trimmed(), "0.5");
    assert_eq!(mirror!(&dirs.root, "kv", "get", "enabled").assert_success()?.trimmed(), "true");

    let listed = mirror!(&dirs.root, "kv", "list").assert_success()?;
    assert!(listed.contains_stdout("greeting"));
    assert!(listed.contains_stdout("int"));

    mirror!(&dirs.root, "kv", "unset", "retries").assert_success()?;
    mirror!(&dirs.root, "kv", "get", "retries").assert_failure()?;
    mirror!(&dirs.root, "kv", "unset", "retries").assert_failure()?;
    Ok(())
}

#[test]
fn test_bad_type_or_value_rejected() -> Result<()> {
    let dirs = TestDirs::new()?;

    mirror!(&dirs.root, "kv", "set", "n", "abc", "--type", "int").assert_failure()?;
    mirror!(&dirs.root, "kv", "set", "n", "1", "--type", "decimal").assert_failure()?;
    mirror!(&dirs.root, "kv", "get", "n").assert_failure()?;
    Ok(())
}

#[test]
fn test_corrupt_store_starts_empty() -> Result<()> {
    let dirs = TestDirs::new()?;
    mirror!(&dirs.root, "kv", "set", "key", "value").assert_success()?;

    let store = dirs.root.join("data").join("watchdata");
    fs::write(&store, b"garbage")?;

    let listed = mirror!(&dirs.root, "kv", "list").assert_success()?;
    assert!(listed.contains_stdout("No settings stored"));
    assert!(!store.exists());
    Ok(())
}
