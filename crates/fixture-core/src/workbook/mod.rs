//! Spreadsheet access layer
//!
//! The reconciler only needs three things from a spreadsheet library:
//! create an empty inventory, prove a file can be written, and read rows
//! back. [`WorkbookStore`] is that seam and [`XlsxStore`] is the real
//! implementation. With the `test-support` feature, `MockStore` lets tests
//! declare files locked without holding OS locks.

#[cfg(any(test, feature = "test-support"))]
mod mock;
mod xlsx;

#[cfg(any(test, feature = "test-support"))]
pub use mock::MockStore;
pub use xlsx::{XlsxStore, INVENTORY_SHEET};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the spreadsheet layer
#[derive(Error, Debug)]
pub enum WorkbookError {
    /// Another process holds the file open exclusively
    #[error("{path} is locked by another process")]
    Locked { path: PathBuf },

    /// File I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Bytes are not a readable workbook, or the writer rejected the content
    #[error("Workbook error in {path}: {message}")]
    Format { path: PathBuf, message: String },
}

impl WorkbookError {
    pub fn is_locked(&self) -> bool {
        matches!(self, WorkbookError::Locked { .. })
    }
}

/// One worksheet row rendered as text cells
pub type Row = Vec<String>;

/// Spreadsheet operations consumed by the reconciler and inventory reader
pub trait WorkbookStore {
    /// Write a new workbook holding only the styled inventory header row
    fn create_inventory(&self, path: &Path) -> Result<(), WorkbookError>;

    /// Open for read-write and save the file back unchanged
    ///
    /// Returns [`WorkbookError::Locked`] when another process holds the file.
    fn write_probe(&self, path: &Path) -> Result<(), WorkbookError>;

    /// Read the inventory sheet (or the first sheet) as rows of text
    fn read_rows(&self, path: &Path) -> Result<Vec<Row>, WorkbookError>;
}

impl<T: WorkbookStore + ?Sized> WorkbookStore for &T {
    fn create_inventory(&self, path: &Path) -> Result<(), WorkbookError> {
        (**self).create_inventory(path)
    }

    fn write_probe(&self, path: &Path) -> Result<(), WorkbookError> {
        (**self).write_probe(path)
    }

    fn read_rows(&self, path: &Path) -> Result<Vec<Row>, WorkbookError> {
        (**self).read_rows(path)
    }
}
