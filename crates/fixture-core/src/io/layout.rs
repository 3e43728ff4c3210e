//! File naming conventions inside the shared directory

use crate::schema::UserId;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Extension of inventory data files
pub const DATA_EXTENSION: &str = "xlsx";

/// Leading character of transient files written by spreadsheet editors
pub const TEMP_MARKER: char = '~';

/// strftime pattern embedded in working-copy names
pub const WORKING_COPY_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

const CANONICAL_STEM: &str = "inventory";
const LOCKED_COPY_STEM: &str = "inventory_";
const FOREIGN_COPY_STEM: &str = "current_";
const SETTINGS_NAME: &str = "settings.json";

/// Naming scheme of one user's files in one shared directory
#[derive(Debug, Clone)]
pub struct DirLayout {
    dir: PathBuf,
    user: UserId,
}

impl DirLayout {
    pub fn new(dir: impl Into<PathBuf>, user: UserId) -> Self {
        Self {
            dir: dir.into(),
            user,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// `{user}_inventory.xlsx`
    pub fn current_file(&self) -> PathBuf {
        self.dir.join(format!(
            "{}{CANONICAL_STEM}.{DATA_EXTENSION}",
            self.user.file_prefix()
        ))
    }

    /// `{user}_settings.json`
    pub fn settings_file(&self) -> PathBuf {
        self.dir
            .join(format!("{}{SETTINGS_NAME}", self.user.file_prefix()))
    }

    /// Working copy taken because this user's own file was locked
    pub fn locked_copy_path(&self, now: DateTime<Local>) -> PathBuf {
        self.unique(LOCKED_COPY_STEM, now)
    }

    /// Working copy taken because the newest file belongs to someone else
    pub fn foreign_copy_path(&self, now: DateTime<Local>) -> PathBuf {
        self.unique(FOREIGN_COPY_STEM, now)
    }

    /// Whether the file is one this layout names for the active user
    ///
    /// The owner field must match and the remainder must be one of this
    /// user's own names, so `bob_smith_inventory.xlsx` is never bob's.
    pub fn is_owned(&self, path: &Path) -> bool {
        let Some(rest) = self.owned_rest(path) else {
            return false;
        };
        let canonical = format!("{CANONICAL_STEM}.{DATA_EXTENSION}");
        rest.eq_ignore_ascii_case(&canonical)
            || rest == SETTINGS_NAME
            || is_copy_name(rest)
    }

    /// Whether the file is one of this user's timestamped working copies
    pub fn is_working_copy(&self, path: &Path) -> bool {
        self.owned_rest(path).is_some_and(is_copy_name)
    }

    /// File name after `{user}_`, when the owner field is this user
    fn owned_rest<'a>(&self, path: &'a Path) -> Option<&'a str> {
        let name = file_name(path)?;
        if !self.user.owns(name) {
            return None;
        }
        name.split_once('_').map(|(_, rest)| rest)
    }

    // Two passes within the same second must not copy onto each other.
    fn unique(&self, stem: &str, now: DateTime<Local>) -> PathBuf {
        let stamp = now.format(WORKING_COPY_TIMESTAMP);
        let prefix = self.user.file_prefix();
        let first = self
            .dir
            .join(format!("{prefix}{stem}{stamp}.{DATA_EXTENSION}"));
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| {
                self.dir
                    .join(format!("{prefix}{stem}{stamp}_{n}.{DATA_EXTENSION}"))
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }
}

// `inventory_{ts}[_n].xlsx` or `current_{ts}[_n].xlsx`
fn is_copy_name(rest: &str) -> bool {
    let Some(stamp) = rest
        .strip_prefix(LOCKED_COPY_STEM)
        .or_else(|| rest.strip_prefix(FOREIGN_COPY_STEM))
    else {
        return false;
    };
    stamp.starts_with(|c: char| c.is_ascii_digit())
}

/// Bare file name as UTF-8, if it has one
pub fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Whether a file name marks an editor's transient artifact
pub fn is_transient(name: &str) -> bool {
    name.starts_with(TEMP_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn layout(dir: &Path, user: &str) -> DirLayout {
        DirLayout::new(dir, UserId::new(user).unwrap())
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 17, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_current_and_settings_names() {
        let l = layout(Path::new("/share"), "carol");
        assert_eq!(l.current_file(), Path::new("/share/carol_inventory.xlsx"));
        assert_eq!(l.settings_file(), Path::new("/share/carol_settings.json"));
    }

    #[test]
    fn test_working_copy_names() {
        let temp_dir = TempDir::new().unwrap();
        let l = layout(temp_dir.path(), "bob");

        let locked = l.locked_copy_path(fixed_now());
        let foreign = l.foreign_copy_path(fixed_now());
        assert_eq!(
            file_name(&locked),
            Some("bob_inventory_20261017_093005.xlsx")
        );
        assert_eq!(
            file_name(&foreign),
            Some("bob_current_20261017_093005.xlsx")
        );
        assert!(l.is_working_copy(&locked));
        assert!(l.is_working_copy(&foreign));
        assert!(!l.is_working_copy(&l.current_file()));
    }

    #[test]
    fn test_working_copy_name_does_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let l = layout(temp_dir.path(), "bob");

        let first = l.foreign_copy_path(fixed_now());
        std::fs::write(&first, b"taken").unwrap();
        let second = l.foreign_copy_path(fixed_now());

        assert_ne!(first, second);
        assert_eq!(
            file_name(&second),
            Some("bob_current_20261017_093005_1.xlsx")
        );
    }

    #[test]
    fn test_ownership_uses_prefix() {
        let l = layout(Path::new("/share"), "bob");
        assert!(l.is_owned(Path::new("/share/bob_inventory.xlsx")));
        assert!(!l.is_owned(Path::new("/share/alice_inventory.xlsx")));
        assert!(!l.is_working_copy(Path::new("/share/alice_current_20261017_093005.xlsx")));
        assert!(l.is_owned(Path::new("/share/bob_settings.json")));
    }

    #[test]
    fn test_ownership_requires_own_file_name() {
        let l = layout(Path::new("/share"), "bob");
        assert!(l.is_owned(Path::new("/share/bob_inventory_20261017_093005.xlsx")));
        assert!(l.is_owned(Path::new("/share/bob_current_20261017_093005_1.xlsx")));
        assert!(!l.is_owned(Path::new("/share/bob_smith_inventory.xlsx")));
        assert!(!l.is_owned(Path::new("/share/bob_smith_current_20261017_093005.xlsx")));
        assert!(!l.is_owned(Path::new("/share/bob_inventory_smith.xlsx")));
        assert!(!l.is_working_copy(Path::new("/share/bob_smith_inventory_20261017_093005.xlsx")));
    }

    #[test]
    fn test_transient_marker() {
        assert!(is_transient("~$bob_inventory.xlsx"));
        assert!(!is_transient("bob_inventory.xlsx"));
    }
}
