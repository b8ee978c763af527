//! Watch sessions
//!
//! A session pairs one watched directory with one sync directory. It
//! consumes [`WatchEvent`]s from a channel, drops filtered paths, and either
//! applies each change right away or marks it in its [`PendingChangeSet`]
//! until a synchronise pass (manual or delay-triggered) drains the marks.
//!
//! Event flow:
//! ```text
//! notify / sender() -> channel -> filters -> executor            (no delay, flag set)
//!                                         -> pending -> synchronise -> executor
//! ```

use crate::debounce::{DelayController, DelayState, DelayedAction};
use crate::executor::{OpOutcome, RetryPolicy, SyncExecutor};
use crate::notification::{NotificationKind, Notifier};
use crate::pending::{DrainedChanges, PendingChangeSet};
use crate::platform::EventSource;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::{EventKind, Result, WatchEvent};
use anyhow::Context;
use futures::future::join_all;
use mirror_core::WatchConfig;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Tuning shared by all sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub retry: RetryPolicy,
    /// Operations in flight during reconciliation
    pub max_parallel_ops: usize,
    /// A change event for the same path within this window is dropped
    pub repeat_window: Duration,
    /// Capacity of the event channel
    pub channel_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_parallel_ops: 16,
            repeat_window: Duration::from_millis(100),
            channel_capacity: 1024,
        }
    }
}

/// Operations dispatched by one synchronise pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub copied: usize,
    pub deleted: usize,
    pub renamed: usize,
    /// Operations that gave up; only known when the pass was awaited
    pub abandoned: usize,
}

impl SyncSummary {
    pub fn total(&self) -> usize {
        self.copied + self.deleted + self.renamed
    }
}

/// A running watch
pub struct WatchSession {
    inner: Arc<SessionInner>,
    event_tx: mpsc::Sender<WatchEvent>,
    event_task: Mutex<Option<JoinHandle<()>>>,
    source: Mutex<Option<EventSource>>,
}

struct SessionInner {
    config: RwLock<WatchConfig>,
    executor: Arc<SyncExecutor>,
    /// Guards every read-modify-write of the marks
    pending: Mutex<PendingChangeSet>,
    last_change: Mutex<Option<(PathBuf, Instant)>>,
    delay: Option<DelayController>,
    notifier: Arc<dyn Notifier>,
    options: SessionOptions,
    handle: Handle,
}

impl WatchSession {
    /// Start a session for `config`
    ///
    /// Must be called from within a tokio runtime. Unless the config is in
    /// observe mode, the OS event source is started too.
    pub fn start(config: WatchConfig, options: SessionOptions, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let handle = Handle::try_current().context("Watch sessions need a tokio runtime")?;
        let (event_tx, mut event_rx) = mpsc::channel(options.channel_capacity.max(1));

        let name = config.name.clone();
        let watch_dir = config.watch_dir.clone();
        let recursive = config.recursive;
        let observe = config.observe;

        let inner = Arc::new_cyclic(|weak: &Weak<SessionInner>| {
            let delay = config.delay().map(|interval| {
                let weak = weak.clone();
                let action: DelayedAction = Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.synchronise(true);
                    }
                });
                DelayController::new(interval, handle.clone(), action)
            });

            SessionInner {
                executor: Arc::new(SyncExecutor::new(
                    config.watch_dir.clone(),
                    config.sync_dir.clone(),
                    options.retry,
                )),
                config: RwLock::new(config),
                pending: Mutex::new(PendingChangeSet::new()),
                last_change: Mutex::new(None),
                delay,
                notifier,
                options,
                handle: handle.clone(),
            }
        });

        let loop_inner = Arc::clone(&inner);
        let event_task = handle.spawn(async move {
            while let Some(event) = event_rx.recv().await {
                loop_inner.handle_event(event);
            }
        });

        let source = if observe {
            debug!("Session {} in observe mode, OS events disabled", name);
            None
        } else {
            match EventSource::start(&watch_dir, recursive, event_tx.clone()) {
                Ok(source) => Some(source),
                Err(e) => {
                    event_task.abort();
                    return Err(e);
                }
            }
        };

        info!("Started watching {} ({})", name, watch_dir.display());

        Ok(Self {
            inner,
            event_tx,
            event_task: Mutex::new(Some(event_task)),
            source: Mutex::new(source),
        })
    }

    /// Channel into the session, used by the OS source and for injection
    pub fn sender(&self) -> mpsc::Sender<WatchEvent> {
        self.event_tx.clone()
    }

    /// Current configuration
    pub fn config(&self) -> WatchConfig {
        self.inner.config.read().clone()
    }

    pub fn name(&self) -> String {
        self.inner.config.read().name.clone()
    }

    /// Number of marked changes
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Copy of the current marks
    pub fn pending(&self) -> PendingChangeSet {
        self.inner.pending.lock().clone()
    }

    pub fn delay_state(&self) -> Option<DelayState> {
        self.inner.delay.as_ref().map(DelayController::state)
    }

    /// Apply every marked change; operations run in the background
    pub fn synchronise(&self, notify: bool) -> SyncSummary {
        self.inner.synchronise(notify)
    }

    /// Apply every marked change and wait for the operations to finish
    pub async fn synchronise_and_wait(&self, notify: bool) -> SyncSummary {
        let Dispatched {
            mut summary,
            ops,
            renames,
        } = self.inner.dispatch_pending(notify);

        for result in join_all(ops).await {
            match result {
                Ok(OpOutcome::Applied) => {}
                Ok(OpOutcome::Abandoned) => summary.abandoned += 1,
                Err(e) => {
                    warn!("Sync task failed: {}", e);
                    summary.abandoned += 1;
                }
            }
        }

        if let Some(renames) = renames {
            match renames.await {
                Ok(outcomes) => {
                    summary.abandoned += outcomes
                        .iter()
                        .filter(|outcome| **outcome == OpOutcome::Abandoned)
                        .count();
                }
                Err(e) => {
                    warn!("Rename task failed: {}", e);
                    summary.abandoned += summary.renamed;
                }
            }
        }
        summary
    }

    /// Fire the delay timer now, or synchronise if there is none
    pub fn enact_now(&self) {
        match &self.inner.delay {
            Some(delay) => delay.enact_now(),
            None => {
                self.inner.synchronise(true);
            }
        }
    }

    /// Full-tree reconciliation with the current config
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let config = self.config();
        Reconciler::new(
            Arc::clone(&self.inner.executor),
            config.filters,
            config.recursive,
            config.auto_add,
            config.auto_delete,
        )
        .with_max_parallel(self.inner.options.max_parallel_ops)
        .run()
        .await
    }

    /// Stop the event source and the delay timer
    ///
    /// Operations already dispatched run to completion.
    pub fn stop(&self) {
        self.source.lock().take();
        if let Some(task) = self.event_task.lock().take() {
            task.abort();
        }
        if let Some(delay) = &self.inner.delay {
            delay.stop();
        }
        info!("Stopped watching {}", self.name());
    }

    pub fn is_running(&self) -> bool {
        self.event_task.lock().is_some()
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        if let Some(task) = self.event_task.get_mut().take() {
            task.abort();
        }
    }
}

impl SessionInner {
    fn handle_event(&self, event: WatchEvent) {
        match event.kind {
            EventKind::Create | EventKind::Modify => self.on_changed(event.path),
            EventKind::Delete => self.on_deleted(event.path),
            EventKind::Rename { from } => self.on_renamed(from, event.path),
        }
    }

    /// Filter check plus conversion to a watch-root relative path
    fn admit(&self, path: &Path) -> Option<PathBuf> {
        if self.config.read().filters.should_exclude(path) {
            trace!("Filtered out {}", path.display());
            return None;
        }
        let rel = self.executor.relative(path);
        if rel.is_none() {
            warn!(
                "Ignoring event outside {}: {}",
                self.executor.watch_root().display(),
                path.display()
            );
        }
        rel
    }

    fn is_repeat(&self, path: &Path) -> bool {
        let now = Instant::now();
        let mut last = self.last_change.lock();
        if let Some((last_path, at)) = last.as_ref() {
            if last_path == path && now.duration_since(*at) < self.options.repeat_window {
                return true;
            }
        }
        *last = Some((path.to_path_buf(), now));
        false
    }

    fn on_changed(&self, path: PathBuf) {
        let Some(rel) = self.admit(&path) else {
            return;
        };
        if self.is_repeat(&path) {
            trace!("Dropping repeated change for {}", path.display());
            return;
        }

        let immediate = self.delay.is_none() && self.config.read().auto_add;
        if immediate {
            self.pending.lock().unmark_delete(&rel);
            debug!("Copying: {}", rel.display());
            self.spawn_op(Op::Copy(rel));
        } else {
            let count = {
                let mut pending = self.pending.lock();
                pending.mark_copy(rel.clone());
                pending.len()
            };
            debug!("Marking for copy: {} ({} pending)", rel.display(), count);
            self.reset_delay();
        }
    }

    fn on_deleted(&self, path: PathBuf) {
        let Some(rel) = self.admit(&path) else {
            return;
        };
        {
            // A re-creation right after deletion is a real change
            let mut last = self.last_change.lock();
            if last.as_ref().is_some_and(|(p, _)| *p == path) {
                *last = None;
            }
        }

        let immediate = self.delay.is_none() && self.config.read().auto_delete;
        if immediate {
            self.pending.lock().unmark_copy(&rel);
            debug!("Deleting: {}", rel.display());
            self.spawn_op(Op::Delete(rel));
        } else {
            let count = {
                let mut pending = self.pending.lock();
                pending.mark_delete(rel.clone());
                pending.len()
            };
            debug!("Marking for delete: {} ({} pending)", rel.display(), count);
            self.reset_delay();
        }
    }

    fn on_renamed(&self, from: PathBuf, to: PathBuf) {
        // Only the new path is filtered
        let Some(new_rel) = self.admit(&to) else {
            return;
        };
        let Some(old_rel) = self.executor.relative(&from) else {
            // Moved in from outside the watch root
            self.on_changed(to);
            return;
        };

        let immediate = self.delay.is_none() && self.config.read().auto_add;
        if immediate {
            debug!("Renaming: {} -> {}", old_rel.display(), new_rel.display());
            self.spawn_op(Op::Rename(old_rel, new_rel));
        } else {
            let count = {
                let mut pending = self.pending.lock();
                pending.mark_rename(old_rel.clone(), new_rel.clone());
                pending.len()
            };
            debug!(
                "Marking for rename: {} -> {} ({} pending)",
                old_rel.display(),
                new_rel.display(),
                count
            );
            self.reset_delay();
        }
    }

    fn reset_delay(&self) {
        if let Some(delay) = &self.delay {
            delay.reset();
        }
    }

    fn synchronise(&self, notify: bool) -> SyncSummary {
        self.dispatch_pending(notify).summary
    }

    /// Drain the marks and spawn copy, then delete, then rename operations
    ///
    /// Copies and deletes run concurrently. Renames run one after another
    /// in a single task, in the order they were marked.
    fn dispatch_pending(&self, notify: bool) -> Dispatched {
        let name = self.config.read().name.clone();

        let mut pending = self.pending.lock();
        if pending.is_empty() {
            drop(pending);
            debug!("Nothing to synchronise for {}", name);
            if notify {
                self.notifier
                    .push(NotificationKind::Info, &name, "Nothing to synchronise");
            }
            return Dispatched::default();
        }

        let DrainedChanges { copy, delete, rename } = pending.drain();
        let summary = SyncSummary {
            copied: copy.len(),
            deleted: delete.len(),
            renamed: rename.len(),
            abandoned: 0,
        };

        let mut ops = Vec::with_capacity(summary.copied + summary.deleted);
        ops.extend(copy.into_iter().map(|rel| self.spawn_op(Op::Copy(rel))));
        ops.extend(delete.into_iter().map(|rel| self.spawn_op(Op::Delete(rel))));
        let renames = (!rename.is_empty()).then(|| self.spawn_renames(rename));
        drop(pending);

        info!(
            "Synchronising {}: {} copies, {} deletes, {} renames",
            name, summary.copied, summary.deleted, summary.renamed
        );
        if notify {
            self.notifier.push(
                NotificationKind::Info,
                &name,
                &format!(
                    "Synchronised {} copied, {} deleted, {} renamed",
                    summary.copied, summary.deleted, summary.renamed
                ),
            );
        }

        Dispatched {
            summary,
            ops,
            renames,
        }
    }

    fn spawn_op(&self, op: Op) -> JoinHandle<OpOutcome> {
        let executor = Arc::clone(&self.executor);
        self.handle.spawn(async move {
            match op {
                Op::Copy(rel) => executor.add(&rel).await,
                Op::Delete(rel) => executor.delete(&rel).await,
                Op::Rename(old, new) => executor.rename(&old, &new).await,
            }
        })
    }

    fn spawn_renames(&self, renames: Vec<(PathBuf, PathBuf)>) -> JoinHandle<Vec<OpOutcome>> {
        let executor = Arc::clone(&self.executor);
        self.handle.spawn(async move {
            let mut outcomes = Vec::with_capacity(renames.len());
            for (old, new) in renames {
                outcomes.push(executor.rename(&old, &new).await);
            }
            outcomes
        })
    }
}

/// Handles for the operations spawned by one synchronise pass
#[derive(Default)]
struct Dispatched {
    summary: SyncSummary,
    ops: Vec<JoinHandle<OpOutcome>>,
    renames: Option<JoinHandle<Vec<OpOutcome>>>,
}

enum Op {
    Copy(PathBuf),
    Delete(PathBuf),
    Rename(PathBuf, PathBuf),
}
