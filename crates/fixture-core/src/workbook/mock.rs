//! In-memory lock table over the real `.xlsx` store, for tests

use super::{Row, WorkbookError, WorkbookStore, XlsxStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Store that reports chosen paths as locked
///
/// Probes on unlocked paths succeed without touching the file, so tests can
/// seed the shared directory with arbitrary bytes and compare them exactly
/// afterwards. Creation and reads go to [`XlsxStore`].
#[derive(Debug, Default)]
pub struct MockStore {
    locked: Mutex<HashSet<PathBuf>>,
    probed: Mutex<Vec<PathBuf>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `path` as held by another process from now on
    pub fn lock(&self, path: impl Into<PathBuf>) {
        if let Ok(mut locked) = self.locked.lock() {
            locked.insert(path.into());
        }
    }

    pub fn unlock(&self, path: &Path) {
        if let Ok(mut locked) = self.locked.lock() {
            locked.remove(path);
        }
    }

    /// Paths passed to `write_probe`, in call order
    pub fn probed(&self) -> Vec<PathBuf> {
        self.probed
            .lock()
            .map(|probed| probed.clone())
            .unwrap_or_default()
    }
}

impl WorkbookStore for MockStore {
    fn create_inventory(&self, path: &Path) -> Result<(), WorkbookError> {
        XlsxStore.create_inventory(path)
    }

    fn write_probe(&self, path: &Path) -> Result<(), WorkbookError> {
        if let Ok(mut probed) = self.probed.lock() {
            probed.push(path.to_path_buf());
        }
        let is_locked = self
            .locked
            .lock()
            .map(|locked| locked.contains(path))
            .unwrap_or(false);
        if is_locked {
            return Err(WorkbookError::Locked {
                path: path.to_path_buf(),
            });
        }
        if !path.exists() {
            return Err(WorkbookError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
        Ok(())
    }

    fn read_rows(&self, path: &Path) -> Result<Vec<Row>, WorkbookError> {
        XlsxStore.read_rows(path)
    }
}
