//! Persisted application state

use crate::config::WatchConfig;
use crate::settings::Settings;

/// Everything written to the snapshot file: the watch list and settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppSnapshot {
    /// Watches in the order they were added
    pub watches: Vec<WatchConfig>,
    pub settings: Settings,
}

impl AppSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty() && self.settings.is_empty()
    }

    pub fn watch(&self, name: &str) -> Option<&WatchConfig> {
        self.watches.iter().find(|w| w.name == name)
    }

    pub fn watch_mut(&mut self, name: &str) -> Option<&mut WatchConfig> {
        self.watches.iter_mut().find(|w| w.name == name)
    }

    pub fn contains_watch(&self, name: &str) -> bool {
        self.watch(name).is_some()
    }

    /// Remove a watch by name
    pub fn remove_watch(&mut self, name: &str) -> Option<WatchConfig> {
        let index = self.watches.iter().position(|w| w.name == name)?;
        Some(self.watches.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_lookup_and_removal() {
        let mut snapshot = AppSnapshot::new();
        assert!(snapshot.is_empty());

        let mut a = WatchConfig::new("/a", "/a-out");
        a.name = "a".to_string();
        let b = WatchConfig::new("/b", "/b-out");
        snapshot.watches.push(a);
        snapshot.watches.push(b);

        assert!(snapshot.contains_watch("a"));
        assert!(snapshot.contains_watch("/b"));
        snapshot.watch_mut("a").unwrap().recursive = true;
        assert!(snapshot.watch("a").unwrap().recursive);

        let removed = snapshot.remove_watch("a").unwrap();
        assert_eq!(removed.watch_dir.to_str(), Some("/a"));
        assert!(snapshot.remove_watch("a").is_none());
        assert_eq!(snapshot.watches.len(), 1);
    }
}
