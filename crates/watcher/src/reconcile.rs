//! Full-tree reconciliation
//!
//! One-shot pass that makes the sync root match the watch root: every
//! eligible source file is copied, and files only present in the sync root
//! are deleted. Runs at startup or on demand, independent of events.

use crate::executor::{OpOutcome, SyncExecutor};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use mirror_core::FilterChain;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Counts from one reconciliation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Files copied to the sync root
    pub copied: usize,
    /// Copied files whose destination already had the same mtime
    pub unchanged: usize,
    /// Files removed from the sync root
    pub deleted: usize,
    /// Operations abandoned after retries
    pub failed: usize,
}

/// Converges a sync root onto its watch root
pub struct Reconciler {
    executor: Arc<SyncExecutor>,
    filters: FilterChain,
    recursive: bool,
    auto_add: bool,
    auto_delete: bool,
    /// Operations in flight at once
    max_parallel: usize,
}

/// Relative path -> last modification time
type Listing = BTreeMap<PathBuf, Option<SystemTime>>;

impl Reconciler {
    pub fn new(
        executor: Arc<SyncExecutor>,
        filters: FilterChain,
        recursive: bool,
        auto_add: bool,
        auto_delete: bool,
    ) -> Self {
        Self {
            executor,
            filters,
            recursive,
            auto_add,
            auto_delete,
            max_parallel: 16,
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Run the pass, waiting for every scheduled operation
    pub async fn run(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        // 1. Nothing to do without an auto flag
        if !self.auto_add && !self.auto_delete {
            debug!(
                "Skipping reconciliation of {}: add and delete disabled",
                self.executor.watch_root().display()
            );
            return Ok(report);
        }

        // 2. List the watch root
        let watch_root = self.executor.watch_root();
        let present = self.list(watch_root)?;

        // 3. Ensure the sync root exists
        let sync_root = self.executor.sync_root();
        tokio::fs::create_dir_all(sync_root)
            .await
            .with_context(|| format!("Failed to create {}", sync_root.display()))?;

        // 4. List the sync root
        let existing = self.list(sync_root)?;

        info!(
            "Reconciling {} -> {} ({} source files, {} destination files)",
            watch_root.display(),
            sync_root.display(),
            present.len(),
            existing.len()
        );

        // 5. Copy every source file
        if self.auto_add {
            report.unchanged = present
                .iter()
                .filter(|(rel, mtime)| mtime.is_some() && existing.get(*rel) == Some(*mtime))
                .count();

            let outcomes = self
                .run_all(present.keys(), |rel| async move { self.executor.add(&rel).await })
                .await;
            report.copied = count(&outcomes, OpOutcome::Applied);
            report.failed += count(&outcomes, OpOutcome::Abandoned);
        }

        // 6. Delete destination files with no source
        if self.auto_delete {
            let stale: Vec<&PathBuf> = existing
                .keys()
                .filter(|rel| !present.contains_key(*rel))
                .collect();

            let outcomes = self
                .run_all(stale, |rel| async move { self.executor.delete(&rel).await })
                .await;
            report.deleted = count(&outcomes, OpOutcome::Applied);
            report.failed += count(&outcomes, OpOutcome::Abandoned);
        }

        info!(
            "Reconciliation finished: {} copied ({} unchanged), {} deleted, {} failed",
            report.copied, report.unchanged, report.deleted, report.failed
        );
        Ok(report)
    }

    async fn run_all<'a, I, F, Fut>(&self, paths: I, op: F) -> Vec<OpOutcome>
    where
        I: IntoIterator<Item = &'a PathBuf>,
        F: Fn(PathBuf) -> Fut,
        Fut: std::future::Future<Output = OpOutcome>,
    {
        stream::iter(paths.into_iter().cloned().map(op))
            .buffer_unordered(self.max_parallel)
            .collect()
            .await
    }

    /// Files under `root`, relative to it, minus filtered paths
    ///
    /// Filters always see the watch-root form of the path so source and
    /// destination entries are judged the same way.
    fn list(&self, root: &Path) -> Result<Listing> {
        let mut listing = Listing::new();
        let max_depth = if self.recursive { usize::MAX } else { 1 };

        for entry in WalkDir::new(root).min_depth(1).max_depth(max_depth).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            // Only files
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = entry.path().strip_prefix(root)?.to_path_buf();
            if self.filters.should_exclude(&self.executor.watch_root().join(&rel)) {
                continue;
            }

            let mtime = entry.metadata().ok().and_then(|m| m.modified().ok());
            listing.insert(rel, mtime);
        }

        Ok(listing)
    }
}

fn count(outcomes: &[OpOutcome], wanted: OpOutcome) -> usize {
    outcomes.iter().filter(|o| **o == wanted).count()
}
