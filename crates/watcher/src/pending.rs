//! Pending copy/delete/rename marks for one session
//!
//! A path is never marked for copy and delete at once: marking one evicts
//! the other. Marking a rename clears both marks for the old path.
//!
//! Renames keep the order they were marked in, since a chain like
//! `z -> a`, `a -> m` only replays correctly front to back.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Deduplicated changes waiting for a synchronise pass
#[derive(Debug, Default, Clone)]
pub struct PendingChangeSet {
    copy: BTreeSet<PathBuf>,
    delete: BTreeSet<PathBuf>,
    rename: Vec<(PathBuf, PathBuf)>,
}

/// Contents of a drained [`PendingChangeSet`]
///
/// Copies and deletes are sorted; renames are in marking order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainedChanges {
    pub copy: Vec<PathBuf>,
    pub delete: Vec<PathBuf>,
    pub rename: Vec<(PathBuf, PathBuf)>,
}

impl DrainedChanges {
    pub fn len(&self) -> usize {
        self.copy.len() + self.delete.len() + self.rename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PendingChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark for copy; returns false if already marked
    pub fn mark_copy(&mut self, path: PathBuf) -> bool {
        self.delete.remove(&path);
        self.copy.insert(path)
    }

    /// Mark for delete; returns false if already marked
    pub fn mark_delete(&mut self, path: PathBuf) -> bool {
        self.copy.remove(&path);
        self.delete.insert(path)
    }

    /// Mark a rename; returns false if already marked
    pub fn mark_rename(&mut self, old: PathBuf, new: PathBuf) -> bool {
        self.copy.remove(&old);
        self.delete.remove(&old);
        if self.is_marked_rename(&old, &new) {
            return false;
        }
        self.rename.push((old, new));
        true
    }

    /// Drop a copy mark, if any
    pub fn unmark_copy(&mut self, path: &Path) -> bool {
        self.copy.remove(path)
    }

    /// Drop a delete mark, if any
    pub fn unmark_delete(&mut self, path: &Path) -> bool {
        self.delete.remove(path)
    }

    pub fn is_marked_copy(&self, path: &Path) -> bool {
        self.copy.contains(path)
    }

    pub fn is_marked_delete(&self, path: &Path) -> bool {
        self.delete.contains(path)
    }

    pub fn is_marked_rename(&self, old: &Path, new: &Path) -> bool {
        self.rename
            .iter()
            .any(|(o, n)| o.as_path() == old && n.as_path() == new)
    }

    pub fn len(&self) -> usize {
        self.copy.len() + self.delete.len() + self.rename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copy.is_empty() && self.delete.is_empty() && self.rename.is_empty()
    }

    /// Take every mark, leaving the set empty
    pub fn drain(&mut self) -> DrainedChanges {
        DrainedChanges {
            copy: std::mem::take(&mut self.copy).into_iter().collect(),
            delete: std::mem::take(&mut self.delete).into_iter().collect(),
            rename: std::mem::take(&mut self.rename),
        }
    }
}
