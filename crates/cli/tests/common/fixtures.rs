//! Directory fixtures for CLI tests

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary root holding a watch directory, a sync directory and the
/// CLI's data and config
pub struct TestDirs {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub watch: PathBuf,
    pub sync: PathBuf,
}

impl TestDirs {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let watch = root.join("watched");
        let sync = root.join("mirrored");
        fs::create_dir(&watch)?;
        fs::create_dir(&sync)?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
            watch,
            sync,
        })
    }

    /// Write a file relative to the watch directory
    pub fn write_source(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.watch.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn synced(&self, rel: &str) -> PathBuf {
        self.sync.join(rel)
    }

    pub fn watch_arg(&self) -> String {
        path_arg(&self.watch)
    }

    pub fn sync_arg(&self) -> String {
        path_arg(&self.sync)
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
