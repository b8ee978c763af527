//! Copy, delete and rename of single paths between watch and sync root
//!
//! Every operation is idempotent and retried a bounded number of times
//! with a fixed backoff. Exhausted retries are logged and dropped; the next
//! event or reconciliation picks the path up again.

use filetime::FileTime;
use std::future::Future;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error, warn};

/// Retry bound and backoff for file operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Wait between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_millis(300),
        }
    }
}

/// Result of a file operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    /// The destination now reflects the source
    Applied,
    /// Gave up; the reason was logged
    Abandoned,
}

impl OpOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Applies single-path changes from `watch_root` to `sync_root`
#[derive(Debug, Clone)]
pub struct SyncExecutor {
    watch_root: PathBuf,
    sync_root: PathBuf,
    policy: RetryPolicy,
}

impl SyncExecutor {
    pub fn new(watch_root: impl Into<PathBuf>, sync_root: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            watch_root: watch_root.into(),
            sync_root: sync_root.into(),
            policy,
        }
    }

    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    pub fn sync_root(&self) -> &Path {
        &self.sync_root
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Path relative to the watch root
    ///
    /// Relative input is taken as-is; absolute input must lie under the
    /// watch root.
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        if path.is_absolute() {
            path.strip_prefix(&self.watch_root)
                .ok()
                .filter(|rel| !rel.as_os_str().is_empty())
                .map(Path::to_path_buf)
        } else if path.as_os_str().is_empty() {
            None
        } else {
            Some(path.to_path_buf())
        }
    }

    /// Copy a path from the watch root over its destination
    ///
    /// Directories are created rather than copied. Files keep their source
    /// modification time.
    pub async fn add(&self, path: &Path) -> OpOutcome {
        let Some(rel) = self.resolve("copy", path) else {
            return OpOutcome::Abandoned;
        };
        self.with_retry("copy", &rel, || self.try_add(&rel)).await
    }

    /// Remove a path from the sync root; an absent path counts as removed
    pub async fn delete(&self, path: &Path) -> OpOutcome {
        let Some(rel) = self.resolve("delete", path) else {
            return OpOutcome::Abandoned;
        };
        self.with_retry("delete", &rel, || self.try_delete(&rel)).await
    }

    /// Move `old` to `new` inside the sync root
    ///
    /// When `old` is missing at the destination but `new` exists at the
    /// source, `new` is copied instead.
    pub async fn rename(&self, old: &Path, new: &Path) -> OpOutcome {
        let (Some(old_rel), Some(new_rel)) = (self.resolve("rename", old), self.resolve("rename", new))
        else {
            return OpOutcome::Abandoned;
        };
        self.with_retry("rename", &old_rel, || self.try_rename(&old_rel, &new_rel))
            .await
    }

    fn resolve(&self, op: &str, path: &Path) -> Option<PathBuf> {
        let rel = self.relative(path);
        if rel.is_none() {
            warn!(
                "Skipping {} of {}: not under {}",
                op,
                path.display(),
                self.watch_root.display()
            );
        }
        rel
    }

    async fn with_retry<F, Fut>(&self, op: &str, rel: &Path, mut attempt: F) -> OpOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = io::Result<()>>,
    {
        let attempts = self.policy.attempts.max(1);

        for n in 1..=attempts {
            match attempt().await {
                Ok(()) => {
                    debug!("{} {}", op, rel.display());
                    return OpOutcome::Applied;
                }
                Err(e) => {
                    warn!(
                        "An error occurred during {} of {} (attempt {}/{}): {}",
                        op,
                        rel.display(),
                        n,
                        attempts,
                        e
                    );
                    if n < attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        error!("Giving up on {} of {} after {} attempts", op, rel.display(), attempts);
        OpOutcome::Abandoned
    }

    async fn try_add(&self, rel: &Path) -> io::Result<()> {
        let source = self.watch_root.join(rel);
        let target = self.sync_root.join(rel);

        let metadata = fs::metadata(&source).await?;
        if metadata.is_dir() {
            return fs::create_dir_all(&target).await;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&source, &target).await?;

        let mtime = FileTime::from_last_modification_time(&metadata);
        filetime::set_file_mtime(&target, mtime)
    }

    async fn try_delete(&self, rel: &Path) -> io::Result<()> {
        let target = self.sync_root.join(rel);

        let result = match fs::symlink_metadata(&target).await {
            Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(&target).await,
            Ok(_) => fs::remove_file(&target).await,
            Err(e) => Err(e),
        };

        match result {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    async fn try_rename(&self, old_rel: &Path, new_rel: &Path) -> io::Result<()> {
        let old_target = self.sync_root.join(old_rel);
        let new_target = self.sync_root.join(new_rel);

        if fs::symlink_metadata(&old_target).await.is_ok() {
            if let Some(parent) = new_target.parent() {
                fs::create_dir_all(parent).await?;
            }
            return fs::rename(&old_target, &new_target).await;
        }

        if fs::symlink_metadata(self.watch_root.join(new_rel)).await.is_ok() {
            debug!(
                "{} missing in sync root, copying {} instead",
                old_rel.display(),
                new_rel.display()
            );
            return self.try_add(new_rel).await;
        }

        Err(io::Error::new(
            ErrorKind::NotFound,
            format!(
                "unable to rename {}: neither a file nor a directory",
                old_target.display()
            ),
        ))
    }
}
