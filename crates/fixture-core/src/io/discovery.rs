//! Candidate discovery and newest-file selection

use crate::io::error::ReconcileError;
use crate::io::layout::{file_name, is_transient};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// A file in the shared directory considered during reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Absolute path inside the shared directory
    pub path: PathBuf,
    /// Last modification time; `None` when metadata could not be read
    pub modified: Option<SystemTime>,
    /// Text before the first `_` of the file name
    pub owner: Option<String>,
}

impl Candidate {
    pub fn new(path: PathBuf, modified: Option<SystemTime>) -> Self {
        let owner = file_name(&path)
            .and_then(|name| name.split_once('_'))
            .map(|(owner, _)| owner.to_string());
        Self {
            path,
            modified,
            owner,
        }
    }

    /// Inaccessible candidates never take part in newest selection
    pub fn is_accessible(&self) -> bool {
        self.modified.is_some()
    }

    pub fn file_name(&self) -> &str {
        file_name(&self.path).unwrap_or_default()
    }
}

/// List every data file in `dir` with the given extension
///
/// Editor lock files (`~$name.xlsx`) are skipped. Files whose metadata
/// cannot be read are returned with `modified: None` rather than aborting
/// discovery. The result is sorted by file name so selection is stable.
///
/// # Errors
///
/// Returns `NoCandidatesFound` when nothing matches (including when the
/// directory does not exist), or an I/O error when the directory itself
/// cannot be listed.
pub fn discover_candidates(dir: &Path, extension: &str) -> Result<Vec<Candidate>, ReconcileError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReconcileError::NoCandidatesFound {
                dir: dir.to_path_buf(),
            });
        }
        Err(e) => return Err(ReconcileError::from_io(dir, e)),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        let Some(name) = file_name(&path) else {
            continue;
        };
        if is_transient(name) || !has_extension(&path, extension) {
            continue;
        }

        let modified = match std::fs::metadata(&path).and_then(|m| {
            if m.is_dir() {
                Ok(None)
            } else {
                m.modified().map(Some)
            }
        }) {
            Ok(Some(modified)) => Some(modified),
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping {name} - access denied ({e})");
                None
            }
        };
        candidates.push(Candidate::new(path, modified));
    }

    if candidates.is_empty() {
        return Err(ReconcileError::NoCandidatesFound {
            dir: dir.to_path_buf(),
        });
    }

    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        "Found {} candidate(s): {:?}",
        candidates.len(),
        candidates.iter().map(Candidate::file_name).collect::<Vec<_>>()
    );
    Ok(candidates)
}

/// Newest accessible candidate by modification time
///
/// Ties keep the earlier candidate in slice order.
pub fn select_newest(candidates: &[Candidate]) -> Option<&Candidate> {
    let mut newest: Option<(&Candidate, SystemTime)> = None;
    for candidate in candidates {
        let Some(modified) = candidate.modified else {
            continue;
        };
        match newest {
            Some((_, best)) if modified <= best => {}
            _ => newest = Some((candidate, modified)),
        }
    }
    newest.map(|(candidate, _)| candidate)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
