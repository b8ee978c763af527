//! Directory mirroring engine for Mirror
//!
//! This crate provides:
//! - Copy/delete/rename of single paths with bounded retry (`executor`)
//! - One-shot full-tree reconciliation (`reconcile`)
//! - Deduplicated pending change sets (`pending`)
//! - Resettable single-shot delay timer (`debounce`)
//! - Watch sessions consuming filesystem events (`session`)
//! - The OS event source built on notify (`platform`)
//! - User-facing notification sink (`notification`)

pub mod debounce;
pub mod executor;
pub mod notification;
pub mod pending;
pub mod platform;
pub mod reconcile;
pub mod session;

use std::path::PathBuf;

// Re-exports
pub use debounce::{DelayController, DelayState};
pub use executor::{OpOutcome, RetryPolicy, SyncExecutor};
pub use notification::{NotificationKind, Notifier, TracingNotifier};
pub use pending::{DrainedChanges, PendingChangeSet};
pub use reconcile::{ReconcileReport, Reconciler};
pub use session::{SessionOptions, SyncSummary, WatchSession};

/// Result type for watcher operations
pub type Result<T> = anyhow::Result<T>;

/// File system event for a path under a watched root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path that changed (the new path for renames)
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
}

/// Type of file system event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// File created
    Create,
    /// File modified
    Modify,
    /// File deleted
    Delete,
    /// File renamed from another path
    Rename { from: PathBuf },
}

impl WatchEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EventKind::Create,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EventKind::Modify,
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EventKind::Delete,
        }
    }

    pub fn renamed(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            path: to.into(),
            kind: EventKind::Rename { from: from.into() },
        }
    }
}
