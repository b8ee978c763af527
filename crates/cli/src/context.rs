//! Application context
//!
//! Owns the snapshot store, the current snapshot and the live watch
//! sessions. Every change to the watch list or the settings is persisted
//! before the call returns.

use crate::system_config::SystemConfig;
use anyhow::{bail, Context, Result};
use dashmap::DashMap;
use mirror_core::{AppSnapshot, DynamicValue, Settings, WatchConfig, WatchRequest};
use mirror_store::SnapshotStore;
use mirror_watcher::{Notifier, ReconcileReport, Reconciler, SyncExecutor, SyncSummary, WatchSession};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings keys remembering the last values used to add a watch
pub mod keys {
    pub const LAST_WATCH_DIR: &str = "last_watch_dir";
    pub const LAST_SYNC_DIR: &str = "last_sync_dir";
    pub const LAST_EXCLUDE: &str = "last_exclude";
    pub const LAST_INCLUDE: &str = "last_include";
    pub const LAST_RECURSIVE: &str = "last_recursive";
    pub const LAST_AUTO_ADD: &str = "last_auto_add";
    pub const LAST_AUTO_DELETE: &str = "last_auto_delete";
}

pub struct AppContext {
    store: SnapshotStore,
    snapshot: RwLock<AppSnapshot>,
    sessions: DashMap<String, Arc<WatchSession>>,
    notifier: Arc<dyn Notifier>,
    config: SystemConfig,
    /// Set by `start_all`; new watches then start right away
    live: AtomicBool,
}

impl AppContext {
    /// Load the snapshot from `data_dir`
    pub fn open(data_dir: &Path, config: SystemConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let store = SnapshotStore::new(data_dir);
        let snapshot = store.load()?;
        debug!(
            "Loaded {} watches and {} settings from {}",
            snapshot.watches.len(),
            snapshot.settings.len(),
            store.path().display()
        );

        Ok(Self {
            store,
            snapshot: RwLock::new(snapshot),
            sessions: DashMap::new(),
            notifier,
            config,
            live: AtomicBool::new(false),
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.snapshot.read().clone()
    }

    pub fn watches(&self) -> Vec<WatchConfig> {
        self.snapshot.read().watches.clone()
    }

    pub fn watch(&self, name: &str) -> Option<WatchConfig> {
        self.snapshot.read().watch(name).cloned()
    }

    pub fn settings(&self) -> Settings {
        self.snapshot.read().settings.clone()
    }

    /// Change the settings and persist
    pub fn update_settings<R>(&self, update: impl FnOnce(&mut Settings) -> R) -> Result<R> {
        let result = update(&mut self.snapshot.write().settings);
        self.persist()?;
        Ok(result)
    }

    /// Validate and add a watch
    ///
    /// The request's field values are remembered in the settings. When the
    /// context is live the new session starts immediately.
    pub fn add_watch(&self, request: WatchRequest) -> Result<WatchConfig> {
        let remembered = remembered_values(&request);
        let config = request.validate()?;

        {
            let mut snapshot = self.snapshot.write();
            if snapshot.contains_watch(&config.name) {
                bail!("A watch named '{}' already exists", config.name);
            }
            snapshot.watches.push(config.clone());
            for (key, value) in remembered {
                snapshot.settings.insert(key, value);
            }
        }
        self.persist()?;
        info!("Added watch {}", config);

        if self.live.load(Ordering::SeqCst) {
            self.start_session(config.clone())?;
        }
        Ok(config)
    }

    /// Stop and forget a watch
    pub fn remove_watch(&self, name: &str) -> Result<WatchConfig> {
        if let Some((_, session)) = self.sessions.remove(name) {
            session.stop();
        }

        let removed = self.snapshot.write().remove_watch(name);
        let Some(config) = removed else {
            bail!("No watch named '{}'", name);
        };
        self.persist()?;
        info!("Removed watch {}", config);
        Ok(config)
    }

    /// Start a session for every watch that isn't running yet
    pub fn start_all(&self) -> Result<usize> {
        self.live.store(true, Ordering::SeqCst);

        let mut started = 0;
        for config in self.watches() {
            if self.sessions.contains_key(&config.name) {
                continue;
            }
            let name = config.name.clone();
            match self.start_session(config) {
                Ok(()) => started += 1,
                Err(e) => warn!("Failed to start watch {}: {:#}", name, e),
            }
        }
        Ok(started)
    }

    fn start_session(&self, config: WatchConfig) -> Result<()> {
        let name = config.name.clone();
        let session = WatchSession::start(config, self.config.session_options(), Arc::clone(&self.notifier))?;
        self.sessions.insert(name, Arc::new(session));
        Ok(())
    }

    pub fn session(&self, name: &str) -> Option<Arc<WatchSession>> {
        self.sessions.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }

    /// Full-tree reconciliation of one watch
    ///
    /// Works whether or not the watch has a live session.
    pub async fn reconcile(&self, name: &str) -> Result<ReconcileReport> {
        if let Some(session) = self.session(name) {
            return session.reconcile().await;
        }

        let Some(config) = self.watch(name) else {
            bail!("No watch named '{}'", name);
        };
        let executor = Arc::new(SyncExecutor::new(
            config.watch_dir.clone(),
            config.sync_dir.clone(),
            self.config.retry_policy(),
        ));
        Reconciler::new(
            executor,
            config.filters,
            config.recursive,
            config.auto_add,
            config.auto_delete,
        )
        .with_max_parallel(self.config.sync.max_parallel_ops)
        .run()
        .await
    }

    /// Apply the pending changes of a live session
    pub async fn synchronise(&self, name: &str) -> Result<SyncSummary> {
        let Some(session) = self.session(name) else {
            bail!("Watch '{}' is not running", name);
        };
        Ok(session.synchronise_and_wait(true).await)
    }

    /// Force a synchronise on every live session
    ///
    /// Sessions with a delay fire their timer early; the rest synchronise
    /// their marks directly.
    pub fn enact_all(&self) -> usize {
        let sessions: Vec<Arc<WatchSession>> =
            self.sessions.iter().map(|entry| Arc::clone(entry.value())).collect();
        for session in &sessions {
            debug!("Enacting {} now", session.name());
            session.enact_now();
        }
        sessions.len()
    }

    /// Stop every session and persist
    pub fn shutdown(&self) -> Result<()> {
        self.live.store(false, Ordering::SeqCst);
        let names: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        for name in names {
            if let Some((_, session)) = self.sessions.remove(&name) {
                session.stop();
            }
        }
        self.persist()
    }

    pub fn persist(&self) -> Result<()> {
        let snapshot = self.snapshot.read().clone();
        self.store.save(&snapshot)
    }
}

fn remembered_values(request: &WatchRequest) -> Vec<(&'static str, DynamicValue)> {
    vec![
        (keys::LAST_WATCH_DIR, request.watch_dir.display().to_string().into()),
        (keys::LAST_SYNC_DIR, request.sync_dir.display().to_string().into()),
        (keys::LAST_EXCLUDE, request.exclude.clone().into()),
        (keys::LAST_INCLUDE, request.include.clone().into()),
        (keys::LAST_RECURSIVE, request.recursive.into()),
        (keys::LAST_AUTO_ADD, request.auto_add.into()),
        (keys::LAST_AUTO_DELETE, request.auto_delete.into()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_watcher::{TracingNotifier, WatchEvent};
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        temp_dir: TempDir,
        watch: PathBuf,
        sync: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let watch = temp_dir.path().join("in");
            let sync = temp_dir.path().join("out");
            fs::create_dir(&watch).unwrap();
            fs::create_dir(&sync).unwrap();
            Self { temp_dir, watch, sync }
        }

        fn data_dir(&self) -> PathBuf {
            self.temp_dir.path().join("data")
        }

        fn open(&self) -> AppContext {
            AppContext::open(&self.data_dir(), SystemConfig::default(), Arc::new(TracingNotifier)).unwrap()
        }

        fn request(&self, name: &str) -> WatchRequest {
            WatchRequest {
                name: Some(name.to_string()),
                watch_dir: self.watch.clone(),
                sync_dir: self.sync.clone(),
                auto_add: true,
                auto_delete: true,
                recursive: true,
                exclude: "*.tmp".to_string(),
                observe: true,
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_add_watch_persists() {
        let f = Fixture::new();
        let ctx = f.open();
        let config = ctx.add_watch(f.request("docs")).unwrap();
        assert_eq!(config.name, "docs");
        assert_eq!(config.filters.len(), 1);

        let reopened = f.open();
        let watches = reopened.watches();
        assert_eq!(watches.len(), 1);
        assert_eq!(watches[0], config);
    }

    #[test]
    fn test_add_watch_remembers_form_values() {
        let f = Fixture::new();
        let ctx = f.open();
        ctx.add_watch(f.request("docs")).unwrap();

        let settings = f.open().settings();
        assert_eq!(
            settings.get::<String>(keys::LAST_WATCH_DIR),
            Some(f.watch.display().to_string())
        );
        assert_eq!(settings.get::<String>(keys::LAST_EXCLUDE), Some("*.tmp".to_string()));
        assert_eq!(settings.get::<String>(keys::LAST_INCLUDE), Some(String::new()));
        assert_eq!(settings.get::<bool>(keys::LAST_RECURSIVE), Some(true));
        assert_eq!(settings.get::<bool>(keys::LAST_AUTO_DELETE), Some(true));
    }

    #[test]
    fn test_add_watch_rejects_duplicates_and_invalid_requests() {
        let f = Fixture::new();
        let ctx = f.open();
        ctx.add_watch(f.request("docs")).unwrap();
        assert!(ctx.add_watch(f.request("docs")).is_err());

        let mut same = f.request("same");
        same.sync_dir = f.watch.clone();
        let err = ctx.add_watch(same).unwrap_err();
        assert!(err.to_string().contains("must be different"));

        assert_eq!(ctx.watches().len(), 1);
    }

    #[test]
    fn test_remove_watch() {
        let f = Fixture::new();
        let ctx = f.open();
        ctx.add_watch(f.request("docs")).unwrap();

        let removed = ctx.remove_watch("docs").unwrap();
        assert_eq!(removed.name, "docs");
        assert!(ctx.remove_watch("docs").is_err());
        assert!(f.open().watches().is_empty());
    }

    #[test]
    fn test_update_settings_persists() {
        let f = Fixture::new();
        let ctx = f.open();
        ctx.update_settings(|s| s.insert("threshold", 42)).unwrap();

        assert_eq!(f.open().settings().get::<i32>("threshold"), Some(42));
    }

    #[tokio::test]
    async fn test_reconcile_without_session() {
        let f = Fixture::new();
        fs::write(f.watch.join("a.txt"), b"a").unwrap();
        fs::write(f.watch.join("skip.tmp"), b"t").unwrap();

        let ctx = f.open();
        ctx.add_watch(f.request("docs")).unwrap();
        let report = ctx.reconcile("docs").await.unwrap();

        assert_eq!(report.copied, 1);
        assert!(f.sync.join("a.txt").exists());
        assert!(!f.sync.join("skip.tmp").exists());
        assert!(ctx.reconcile("missing").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_live_sessions() {
        let f = Fixture::new();
        let ctx = f.open();
        let mut request = f.request("manual");
        request.auto_add = false;
        request.auto_delete = false;
        ctx.add_watch(request).unwrap();

        assert!(ctx.synchronise("manual").await.is_err());
        assert_eq!(ctx.start_all().unwrap(), 1);
        assert!(ctx.is_running("manual"));
        assert_eq!(ctx.start_all().unwrap(), 0);

        let source = f.watch.join("note.md");
        fs::write(&source, b"note").unwrap();
        let session = ctx.session("manual").unwrap();
        session.sender().send(WatchEvent::created(&source)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let summary = ctx.synchronise("manual").await.unwrap();
        assert_eq!(summary.copied, 1);
        assert!(f.sync.join("note.md").exists());

        // Added while live: starts at once
        let other = f.temp_dir.path().join("other");
        fs::create_dir(&other).unwrap();
        let mut request = f.request("second");
        request.sync_dir = other;
        ctx.add_watch(request).unwrap();
        assert!(ctx.is_running("second"));

        ctx.shutdown().unwrap();
        assert!(!ctx.is_running("manual"));
        assert!(!ctx.is_running("second"));
        assert_eq!(f.open().watches().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_enact_all_flushes_marks() {
        let f = Fixture::new();
        let ctx = f.open();
        let mut request = f.request("manual");
        request.auto_add = false;
        request.auto_delete = false;
        ctx.add_watch(request).unwrap();

        assert_eq!(ctx.enact_all(), 0);
        ctx.start_all().unwrap();

        let source = f.watch.join("flush.md");
        fs::write(&source, b"flush").unwrap();
        let session = ctx.session("manual").unwrap();
        session.sender().send(WatchEvent::modified(&source)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.pending_count(), 1);

        assert_eq!(ctx.enact_all(), 1);
        assert_eq!(session.pending_count(), 0);

        let target = f.sync.join("flush.md");
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !target.exists() && std::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert!(target.exists());
        ctx.shutdown().unwrap();
    }
}
