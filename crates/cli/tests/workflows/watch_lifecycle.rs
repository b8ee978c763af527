//! Add, list, sync and remove a watch

use crate::common::TestDirs;
use crate::mirror;
use anyhow::Result;
use std::fs;

#[test]
fn test_add_list_remove() -> Result<()> {
    let dirs = TestDirs::new()?;
    let watch = dirs.watch_arg();
    let sync = dirs.sync_arg();

    let added = mirror!(&dirs.root, "add", &watch, &sync, "--name", "docs", "--recursive", "--auto-add")
        .assert_success()?;
    assert!(added.contains_stdout("Added watch"));
    assert!(added.contains_stdout("docs"));
    assert!(dirs.root.join("data").join("watchdata").exists());

    let listed = mirror!(&dirs.root, "list").assert_success()?;
    assert!(listed.contains_stdout("docs"));
    assert!(listed.contains_stdout("recursive, add"));

    mirror!(&dirs.root, "remove", "docs").assert_success()?;
    let listed = mirror!(&dirs.root, "list").assert_success()?;
    assert!(listed.contains_stdout("No watches"));

    mirror!(&dirs.root, "remove", "docs").assert_failure()?;
    Ok(())
}

#[test]
fn test_add_reports_every_problem() -> Result<()> {
    let dirs = TestDirs::new()?;
    let missing = dirs.root.join("nowhere").display().to_string();
    let watch = dirs.watch_arg();

    let result = mirror!(&dirs.root, "add", &watch, &watch).assert_failure()?;
    assert!(result.contains_stderr("must be different"));

    let result = mirror!(&dirs.root, "add", &missing, &missing).assert_failure()?;
    assert!(result.contains_stderr("Watch directory does not exist"));
    assert!(result.contains_stderr("Sync directory does not exist"));

    let listed = mirror!(&dirs.root, "list").assert_success()?;
    assert!(listed.contains_stdout("No watches"));
    Ok(())
}

#[test]
fn test_duplicate_name_rejected() -> Result<()> {
    let dirs = TestDirs::new()?;
    let watch = dirs.watch_arg();
    let sync = dirs.sync_arg();

    mirror!(&dirs.root, "add", &watch, &sync, "--name", "one").assert_success()?;
    let result = mirror!(&dirs.root, "add", &watch, &sync, "--name", "one").assert_failure()?;
    assert!(result.contains_stderr("already exists"));
    Ok(())
}

#[test]
fn test_sync_mirrors_with_filters() -> Result<()> {
    let dirs = TestDirs::new()?;
    dirs.write_source("hello.txt", "hello")?;
    dirs.write_source("test.ini", "[a]")?;
    dirs.write_source("othertest.bork", "bork")?;
    dirs.write_source("nested/deep.bork", "deep")?;
    fs::write(dirs.synced("stale.bork"), "old")?;

    let watch = dirs.watch_arg();
    let sync = dirs.sync_arg();
    mirror!(
        &dirs.root,
        "add",
        &watch,
        &sync,
        "--name",
        "filtered",
        "--recursive",
        "--auto-add",
        "--auto-delete",
        "--exclude",
        "*.txt;*.ini"
    )
    .assert_success()?;

    let result = mirror!(&dirs.root, "sync", "filtered").assert_success()?;
    assert!(result.contains_stdout("Reconciled"));

    assert!(dirs.synced("othertest.bork").exists());
    assert_eq!(fs::read_to_string(dirs.synced("nested/deep.bork"))?, "deep");
    assert!(!dirs.synced("hello.txt").exists());
    assert!(!dirs.synced("test.ini").exists());
    assert!(!dirs.synced("stale.bork").exists());
    Ok(())
}

#[test]
fn test_add_now_reconciles() -> Result<()> {
    let dirs = TestDirs::new()?;
    dirs.write_source("a.md", "a")?;

    let watch = dirs.watch_arg();
    let sync = dirs.sync_arg();
    mirror!(&dirs.root, "add", &watch, &sync, "--auto-add", "--now").assert_success()?;

    assert!(dirs.synced("a.md").exists());
    Ok(())
}

#[test]
fn test_sync_without_flags_does_nothing() -> Result<()> {
    let dirs = TestDirs::new()?;
    dirs.write_source("a.md", "a")?;

    let watch = dirs.watch_arg();
    let sync = dirs.sync_arg();
    mirror!(&dirs.root, "add", &watch, &sync, "--name", "manual").assert_success()?;

    let result = mirror!(&dirs.root, "sync", "manual").assert_success()?;
    assert!(result.contains_stdout("nothing to do"));
    assert!(!dirs.synced("a.md").exists());

    mirror!(&dirs.root, "sync", "unknown").assert_failure()?;
    Ok(())
}

#[test]
fn test_add_remembers_form_values() -> Result<()> {
    let dirs = TestDirs::new()?;
    let watch = dirs.watch_arg();
    let sync = dirs.sync_arg();
    mirror!(&dirs.root, "add", &watch, &sync, "--exclude", "*.log", "--auto-delete").assert_success()?;

    let result = mirror!(&dirs.root, "kv", "get", "last_watch_dir").assert_success()?;
    assert_eq!(result.trimmed(), watch);
    let result = mirror!(&dirs.root, "kv", "get", "last_exclude").assert_success()?;
    assert_eq!(result.trimmed(), "*.log");
    let result = mirror!(&dirs.root, "kv", "get", "last_auto_delete").assert_success()?;
    assert_eq!(result.trimmed(), "true");
    Ok(())
}
