//! CLI command execution helpers with automatic timing
//!
//! Wraps the `mirror` binary, pointing it at an isolated data directory
//! and config file, and provides convenient assertion methods.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct MirrorCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl MirrorCommand {
    /// Create a command whose data and config live under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let mut env = HashMap::new();
        env.insert(
            "MIRROR_DATA_DIR".to_string(),
            root.join("data").display().to_string(),
        );
        env.insert(
            "MIRROR_CONFIG".to_string(),
            root.join("config.toml").display().to_string(),
        );
        env.insert("RUST_LOG".to_string(), "warn".to_string());

        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_mirror")),
            working_dir: root.to_path_buf(),
            args: Vec::new(),
            env,
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// Stdout without the trailing newline
    pub fn trimmed(&self) -> &str {
        self.stdout.trim_end()
    }
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// mirror!(root, "list").assert_success()?;
/// mirror!(root, "kv", "set", "retries", "3", "--type", "int").assert_success()?;
/// ```
#[macro_export]
macro_rules! mirror {
    ($root:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::MirrorCommand::new($root);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
