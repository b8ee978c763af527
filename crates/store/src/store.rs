//! Loading and saving the snapshot file
//!
//! Loading fails open: a file that cannot be decoded is deleted and an empty
//! snapshot is returned.

use crate::registry::FormatRegistry;
use crate::Result;
use anyhow::Context;
use mirror_core::AppSnapshot;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// File name of the snapshot inside the data directory
pub const SNAPSHOT_FILE: &str = "watchdata";

/// The snapshot file of one installation
pub struct SnapshotStore {
    data_dir: PathBuf,
    path: PathBuf,
    registry: FormatRegistry,
}

impl SnapshotStore {
    /// Store at `<data_dir>/watchdata` with the built-in codecs
    pub fn new(data_dir: &Path) -> Self {
        Self::with_registry(data_dir, FormatRegistry::builtin())
    }

    pub fn with_registry(data_dir: &Path, registry: FormatRegistry) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            path: data_dir.join(SNAPSHOT_FILE),
            registry,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Read the snapshot
    ///
    /// Missing file gives an empty snapshot. A corrupt or unsupported file is
    /// deleted and also gives an empty snapshot. Only I/O failures are errors.
    pub fn load(&self) -> Result<AppSnapshot> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {}, starting empty", self.path.display());
                return Ok(AppSnapshot::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        match self.registry.decode(&bytes) {
            Ok(snapshot) => {
                info!(
                    "Loaded {} watches and {} settings from {}",
                    snapshot.watches.len(),
                    snapshot.settings.len(),
                    self.path.display()
                );
                Ok(snapshot)
            }
            Err(reason) => {
                warn!(
                    "Invalid snapshot file {}: '{}'; removing file",
                    self.path.display(),
                    reason
                );
                self.discard()?;
                Ok(AppSnapshot::new())
            }
        }
    }

    /// Write the snapshot in the current format version
    ///
    /// Written to a temp file in the data directory, then renamed over the
    /// old file.
    pub fn save(&self, snapshot: &AppSnapshot) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;

        let bytes = self.registry.encode(snapshot);

        let mut tmp = NamedTempFile::new_in(&self.data_dir)
            .context("Failed to create temporary snapshot file")?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(
            "Saved snapshot v{} ({} bytes) to {}",
            self.registry.current_version(),
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }

    fn discard(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(&temp_dir.path().join("data"));

        let snapshot = store.load().unwrap();
        assert!(snapshot.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_creates_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("nested").join("data");
        let store = SnapshotStore::new(&data_dir);

        store.save(&AppSnapshot::new()).unwrap();
        assert!(store.path().exists());

        // Only the snapshot remains, no temp files
        let entries: Vec<_> = fs::read_dir(&data_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
