//! OS file watching through notify
//!
//! The notify callback runs on its own thread; events are translated and
//! pushed onto the session's channel.

use crate::{WatchEvent, Result};
use anyhow::Context;
use notify::event::{EventKind as NotifyKind, MetadataKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, trace};

/// Live OS watcher for one root; dropping it stops events
pub struct EventSource {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl EventSource {
    /// Start watching `root`, sending events to `tx`
    pub fn start(root: &Path, recursive: bool, tx: mpsc::Sender<WatchEvent>) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for watch_event in translate(event) {
                        if let Err(e) = tx.blocking_send(watch_event) {
                            debug!("Event channel closed: {}", e);
                        }
                    }
                }
                Err(e) => error!("Watch error: {}", e),
            },
        )
        .context("Failed to create file watcher")?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(root, mode)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        debug!("Started watching: {}", root.display());
        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        debug!("Stopped watching: {}", self.root.display());
    }
}

/// Map a notify event onto zero or more watch events
pub fn translate(event: Event) -> Vec<WatchEvent> {
    trace!("notify event: {:?}", event);
    let mut paths = event.paths.into_iter();

    match event.kind {
        NotifyKind::Create(_) => paths.map(WatchEvent::created).collect(),
        NotifyKind::Remove(_) => paths.map(WatchEvent::deleted).collect(),

        NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            match (paths.next(), paths.next()) {
                (Some(from), Some(to)) => vec![WatchEvent::renamed(from, to)],
                (Some(path), None) => vec![changed_or_deleted(path)],
                _ => Vec::new(),
            }
        }
        NotifyKind::Modify(ModifyKind::Name(RenameMode::From)) => paths.map(WatchEvent::deleted).collect(),
        NotifyKind::Modify(ModifyKind::Name(RenameMode::To)) => paths.map(WatchEvent::created).collect(),
        NotifyKind::Modify(ModifyKind::Name(_)) => paths.map(changed_or_deleted).collect(),

        NotifyKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))
        | NotifyKind::Modify(ModifyKind::Data(_))
        | NotifyKind::Modify(ModifyKind::Any)
        | NotifyKind::Modify(ModifyKind::Other) => paths.map(WatchEvent::modified).collect(),

        // Access and other metadata changes don't alter content
        _ => Vec::new(),
    }
}

/// Rename halves without a partner: decide by whether the path still exists
fn changed_or_deleted(path: PathBuf) -> WatchEvent {
    if path.exists() {
        WatchEvent::modified(path)
    } else {
        WatchEvent::deleted(path)
    }
}
