//! Error types for shared-file reconciliation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reconciling the shared inventory directory
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// File metadata or content could not be read
    #[error("Permission denied on {path}")]
    PermissionDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No data files matched in the shared directory
    #[error("No inventory files found in {dir}")]
    NoCandidatesFound { dir: PathBuf },

    /// Write-probe failed because another process holds the file
    #[error("{path} is locked by another process")]
    FileLocked { path: PathBuf },

    /// The full reconciliation sequence failed with no fallback available
    #[error("Could not prepare inventory file in {dir}: {message}")]
    ReconcileFailed { dir: PathBuf, message: String },

    /// File I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Copy finished but the destination bytes differ from the source
    #[error("Copy of {from} to {to} does not match the source")]
    CopyMismatch { from: PathBuf, to: PathBuf },
}

impl ReconcileError {
    /// Wrap an I/O error, classifying permission faults separately
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            ReconcileError::PermissionDenied { path, source }
        } else {
            ReconcileError::Io { path, source }
        }
    }
}
