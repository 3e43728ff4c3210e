//! Shared-file reconciliation
//!
//! Each call walks the same state machine:
//!
//! ```text
//! DISCOVER -> NO_CANDIDATES | OWNED_BY_ME | OWNED_BY_OTHER
//!          -> [WRITE_PROBE -> READY | LOCKED -> COPY -> READY] -> ADOPTED
//! ```
//!
//! The newest accessible data file wins. Only files carrying the active
//! user's prefix are ever renamed, rewritten or deleted; another user's file
//! is only read, by copying it into a working copy.

use crate::io::discovery::{discover_candidates, select_newest, Candidate};
use crate::io::error::ReconcileError;
use crate::io::hash::verified_copy;
use crate::io::layout::{file_name, DirLayout, DATA_EXTENSION};
use crate::schema::UserId;
use crate::workbook::{WorkbookError, WorkbookStore};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// How the adopted file relates to the active user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    /// `{user}_inventory.xlsx`
    Canonical,
    /// A timestamped copy owned by the active user
    WorkingCopy,
    /// Startup could not build a per-user copy and points at the newest file
    Fallback,
}

/// The single file a process reads and writes after reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataHandle {
    path: PathBuf,
    kind: HandleKind,
}

impl DataHandle {
    pub fn new(path: impl Into<PathBuf>, kind: HandleKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// False until the first write creates the canonical file
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Which ownership branch the pass took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    NoCandidates,
    OwnedByMe,
    OwnedByOther,
}

/// Outcome of one successful reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub handle: DataHandle,
    pub branch: Branch,
    /// Newest candidate the pass started from
    pub source: Option<PathBuf>,
    /// `(from, to)` when an owned file was moved to the canonical name
    pub renamed: Option<(PathBuf, PathBuf)>,
    /// File written by this pass (new inventory or copy)
    pub created: Option<PathBuf>,
    /// Files of the active user deleted by this pass
    pub removed: Vec<PathBuf>,
    /// Set when the first write-probe reported the file locked
    pub locked: Option<PathBuf>,
}

impl Reconciliation {
    fn new(handle: DataHandle, branch: Branch) -> Self {
        Self {
            handle,
            branch,
            source: None,
            renamed: None,
            created: None,
            removed: Vec::new(),
            locked: None,
        }
    }

    /// Whether the caller ended up on a file other than the one it asked for
    pub fn is_fallback(&self) -> bool {
        self.handle.kind() == HandleKind::Fallback
    }
}

/// Chooses and prepares the inventory file for one user in one directory
pub struct Reconciler<S> {
    layout: DirLayout,
    store: S,
    clock: fn() -> DateTime<Local>,
}

impl<S: WorkbookStore> Reconciler<S> {
    pub fn new(dir: impl Into<PathBuf>, user: UserId, store: S) -> Self {
        Self {
            layout: DirLayout::new(dir, user),
            store,
            clock: Local::now,
        }
    }

    /// Replace the clock used to stamp working-copy names
    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    pub fn layout(&self) -> &DirLayout {
        &self.layout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Path of `{user}_inventory.xlsx`
    pub fn current_file(&self) -> PathBuf {
        self.layout.current_file()
    }

    /// All data files in the shared directory, freshly listed
    pub fn candidates(&self) -> Result<Vec<Candidate>, ReconcileError> {
        discover_candidates(self.layout.dir(), DATA_EXTENSION)
    }

    /// Prepare the per-user file once per process launch
    ///
    /// Never fails: every error is logged and converted into the closest
    /// usable handle. With no data files at all the canonical path is
    /// returned without creating it; creation waits for the first write.
    pub fn prepare_on_startup(&self) -> Reconciliation {
        let current = self.layout.current_file();
        let deferred = || {
            Reconciliation::new(
                DataHandle::new(&current, HandleKind::Canonical),
                Branch::NoCandidates,
            )
        };

        let candidates = match self.candidates() {
            Ok(candidates) => candidates,
            Err(ReconcileError::NoCandidatesFound { .. }) => {
                info!("No inventory files found on startup");
                return deferred();
            }
            Err(e) => {
                warn!("Could not list inventory files on startup: {e}");
                return deferred();
            }
        };
        let Some(newest) = select_newest(&candidates) else {
            info!("No accessible inventory files found on startup");
            return deferred();
        };
        info!("Newest inventory file: {}", newest.file_name());

        let branch = self.branch_for(newest);
        let mut result = Reconciliation::new(DataHandle::new(&current, HandleKind::Canonical), branch);
        result.source = Some(newest.path.clone());

        if newest.path == current {
            info!("Newest file is already {}", file_name(&current).unwrap_or_default());
        } else {
            info!(
                "Copying {} to per-user inventory {}",
                newest.file_name(),
                file_name(&current).unwrap_or_default()
            );
            if let Err(e) = verified_copy(&newest.path, &current) {
                warn!("Could not prepare per-user inventory from newest file: {e}");
                result.handle = DataHandle::new(&newest.path, HandleKind::Fallback);
                return result;
            }
            result.created = Some(current.clone());
        }

        result.removed = self.remove_owned(&candidates, &[current.as_path()]);
        info!("Startup: using {}", result.handle.path().display());
        result
    }

    /// Prepare a writable file immediately before a mutating operation
    ///
    /// # Errors
    ///
    /// Returns `ReconcileFailed` when no safe file could be produced. The
    /// caller must then abort its write.
    pub fn prepare_for_save(&self) -> Result<Reconciliation, ReconcileError> {
        self.reconcile_for_save().map_err(|e| {
            error!("Inventory reconciliation failed: {e}");
            match e {
                ReconcileError::ReconcileFailed { .. } => e,
                other => ReconcileError::ReconcileFailed {
                    dir: self.layout.dir().to_path_buf(),
                    message: other.to_string(),
                },
            }
        })
    }

    fn reconcile_for_save(&self) -> Result<Reconciliation, ReconcileError> {
        let candidates = match self.candidates() {
            Ok(candidates) => candidates,
            Err(ReconcileError::NoCandidatesFound { .. }) => return self.create_current(),
            Err(e) => return Err(e),
        };

        let Some(newest) = select_newest(&candidates) else {
            return Err(ReconcileError::ReconcileFailed {
                dir: self.layout.dir().to_path_buf(),
                message: format!(
                    "none of the {} inventory file(s) are accessible",
                    candidates.len()
                ),
            });
        };
        info!("Newest inventory file: {}", newest.file_name());

        match self.branch_for(newest) {
            Branch::OwnedByMe => self.adopt_owned(&candidates, newest),
            _ => self.adopt_foreign(&candidates, newest),
        }
    }

    fn branch_for(&self, newest: &Candidate) -> Branch {
        if self.layout.is_owned(&newest.path) {
            Branch::OwnedByMe
        } else {
            Branch::OwnedByOther
        }
    }

    fn create_current(&self) -> Result<Reconciliation, ReconcileError> {
        let current = self.layout.current_file();
        info!(
            "No inventory files found, creating {}",
            file_name(&current).unwrap_or_default()
        );
        self.store
            .create_inventory(&current)
            .map_err(|e| workbook_failure(self.layout.dir(), e))?;

        let mut result = Reconciliation::new(
            DataHandle::new(&current, HandleKind::Canonical),
            Branch::NoCandidates,
        );
        result.created = Some(current);
        Ok(result)
    }

    fn adopt_owned(
        &self,
        candidates: &[Candidate],
        newest: &Candidate,
    ) -> Result<Reconciliation, ReconcileError> {
        let current = self.layout.current_file();
        let mut result = Reconciliation::new(
            DataHandle::new(&current, HandleKind::Canonical),
            Branch::OwnedByMe,
        );
        result.source = Some(newest.path.clone());

        let mut target = newest.path.clone();
        if target != current {
            if current.exists() {
                match fs::remove_file(&current) {
                    Ok(()) => {
                        debug!("Deleted stale {}", current.display());
                        result.removed.push(current.clone());
                    }
                    Err(e) => warn!("Could not delete stale {}: {e}", current.display()),
                }
            }
            match fs::rename(&target, &current) {
                Ok(()) => {
                    info!("Renamed {} to {}", target.display(), current.display());
                    result.renamed = Some((target.clone(), current.clone()));
                    target = current.clone();
                }
                Err(e) => warn!("Could not rename {}: {e}", target.display()),
            }
        }

        result
            .removed
            .extend(self.remove_owned(
                candidates,
                &[target.as_path(), newest.path.as_path(), current.as_path()],
            ));

        match self.store.write_probe(&target) {
            Ok(()) => {
                let kind = if target == current {
                    HandleKind::Canonical
                } else {
                    HandleKind::WorkingCopy
                };
                result.handle = DataHandle::new(&target, kind);
                Ok(result)
            }
            Err(e) => {
                warn!("{} is not writable: {e}", target.display());
                result.locked = Some(target.clone());

                let copy = self.layout.locked_copy_path((self.clock)());
                self.adopt_copy(&target, &copy, &mut result)?;

                let keep: [&Path; 2] = [&copy, &target];
                for path in self.owned_working_copies()? {
                    if keep.contains(&path.as_path()) {
                        continue;
                    }
                    if remove_quietly(&path) {
                        debug!("Deleted old working copy {}", path.display());
                        result.removed.push(path);
                    }
                }
                Ok(result)
            }
        }
    }

    fn adopt_foreign(
        &self,
        candidates: &[Candidate],
        newest: &Candidate,
    ) -> Result<Reconciliation, ReconcileError> {
        info!(
            "Newest file is not owned by {}, creating working copy",
            self.layout.user()
        );
        let copy = self.layout.foreign_copy_path((self.clock)());
        let mut result = Reconciliation::new(
            DataHandle::new(&copy, HandleKind::WorkingCopy),
            Branch::OwnedByOther,
        );
        result.source = Some(newest.path.clone());

        self.adopt_copy(&newest.path, &copy, &mut result)?;
        result.removed = self.remove_owned(candidates, &[copy.as_path()]);
        Ok(result)
    }

    /// COPY -> WRITE_PROBE -> READY for a fresh working copy
    fn adopt_copy(
        &self,
        from: &Path,
        copy: &Path,
        result: &mut Reconciliation,
    ) -> Result<(), ReconcileError> {
        info!(
            "Copying {} to working copy {}",
            file_name(from).unwrap_or_default(),
            file_name(copy).unwrap_or_default()
        );
        verified_copy(from, copy)?;
        result.created = Some(copy.to_path_buf());

        if let Err(e) = self.store.write_probe(copy) {
            remove_quietly(copy);
            return Err(workbook_failure(self.layout.dir(), e));
        }
        info!("Working copy is ready: {}", copy.display());
        result.handle = DataHandle::new(copy, HandleKind::WorkingCopy);
        Ok(())
    }

    /// Delete this user's candidates except `keep`; failures are logged
    fn remove_owned(&self, candidates: &[Candidate], keep: &[&Path]) -> Vec<PathBuf> {
        candidates
            .iter()
            .filter(|c| self.layout.is_owned(&c.path))
            .filter(|c| !keep.contains(&c.path.as_path()))
            .filter(|c| remove_quietly(&c.path))
            .map(|c| {
                debug!("Deleted other owned file {}", c.file_name());
                c.path.clone()
            })
            .collect()
    }

    fn owned_working_copies(&self) -> Result<Vec<PathBuf>, ReconcileError> {
        match self.candidates() {
            Ok(candidates) => Ok(candidates
                .into_iter()
                .map(|c| c.path)
                .filter(|p| self.layout.is_working_copy(p))
                .collect()),
            Err(ReconcileError::NoCandidatesFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// Remove a file, reporting whether it was actually deleted
fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Could not delete {}: {e}", path.display());
            false
        }
    }
}

fn workbook_failure(dir: &Path, e: WorkbookError) -> ReconcileError {
    match e {
        WorkbookError::Locked { path } => ReconcileError::FileLocked { path },
        WorkbookError::Io { path, source } => ReconcileError::from_io(path, source),
        WorkbookError::Format { path, message } => ReconcileError::ReconcileFailed {
            dir: dir.to_path_buf(),
            message: format!("{}: {message}", path.display()),
        },
    }
}
