//! Reconciliation scenarios against a real shared directory
//!
//! Workbooks are real `.xlsx` files written by `XlsxStore`, so every
//! write-probe goes through the production lock and parse path.

use fixture_core::io::{Branch, HandleKind, ReconcileError, Reconciler};
use fixture_core::schema::{load_inventory, COLUMNS};
use fixture_core::workbook::MockStore;
use fixture_core::{UserId, WorkbookStore, XlsxStore};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Write a real inventory workbook aged `age_secs` into the past
fn seed_workbook(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    XlsxStore.create_inventory(&path).unwrap();
    set_age(&path, age_secs);
    path
}

fn set_age(path: &Path, age_secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}

fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Startup preparation
// ============================================================================

#[test]
fn test_startup_empty_directory_defers_creation() {
    let temp_dir = TempDir::new().unwrap();

    let result = Reconciler::new(temp_dir.path(), user("carol"), XlsxStore).prepare_on_startup();

    assert_eq!(result.handle.kind(), HandleKind::Canonical);
    assert_eq!(
        result.handle.path(),
        temp_dir.path().join("carol_inventory.xlsx")
    );
    assert!(names_in(temp_dir.path()).is_empty());
}

#[test]
fn test_startup_copies_foreign_newest_and_keeps_it() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let alice = seed_workbook(dir, "alice_inventory.xlsx", 10);
    seed_workbook(dir, "bob_inventory_20261001_080000.xlsx", 500);
    let alice_bytes = fs::read(&alice).unwrap();

    let result = Reconciler::new(dir, user("bob"), XlsxStore).prepare_on_startup();

    let current = dir.join("bob_inventory.xlsx");
    assert_eq!(result.handle.path(), current);
    assert_eq!(fs::read(&current).unwrap(), alice_bytes);
    assert_eq!(fs::read(&alice).unwrap(), alice_bytes);
    assert_eq!(
        names_in(dir),
        vec!["alice_inventory.xlsx", "bob_inventory.xlsx"]
    );
}

// ============================================================================
// Pre-save preparation
// ============================================================================

#[test]
fn test_save_empty_directory_creates_header_only_file() {
    let temp_dir = TempDir::new().unwrap();

    let result = Reconciler::new(temp_dir.path(), user("carol"), XlsxStore)
        .prepare_for_save()
        .unwrap();

    let current = temp_dir.path().join("carol_inventory.xlsx");
    assert_eq!(result.branch, Branch::NoCandidates);
    assert_eq!(result.handle.path(), current);

    let rows = XlsxStore.read_rows(&current).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], COLUMNS.map(String::from).to_vec());
    assert!(load_inventory(&XlsxStore, &current).unwrap().is_empty());
}

#[test]
fn test_save_owned_leaves_single_canonical_file() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    seed_workbook(dir, "bob_inventory_20261016_120000.xlsx", 5);
    seed_workbook(dir, "bob_inventory.xlsx", 60);
    seed_workbook(dir, "bob_current_20261010_120000.xlsx", 600);
    seed_workbook(dir, "alice_inventory.xlsx", 900);

    let result = Reconciler::new(dir, user("bob"), XlsxStore)
        .prepare_for_save()
        .unwrap();

    assert_eq!(result.branch, Branch::OwnedByMe);
    assert_eq!(result.handle.kind(), HandleKind::Canonical);
    assert_eq!(result.handle.path(), dir.join("bob_inventory.xlsx"));
    assert_eq!(
        names_in(dir),
        vec!["alice_inventory.xlsx", "bob_inventory.xlsx"]
    );
}

#[test]
fn test_scenario_bob_copies_newer_alice_file() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let alice = seed_workbook(dir, "alice_inventory.xlsx", 10);
    seed_workbook(dir, "bob_inventory.xlsx", 100);
    let alice_bytes = fs::read(&alice).unwrap();
    let store = MockStore::new();

    let result = Reconciler::new(dir, user("bob"), &store)
        .prepare_for_save()
        .unwrap();

    let copy = result.handle.path().to_path_buf();
    let copy_name = copy.file_name().unwrap().to_string_lossy().into_owned();
    assert!(copy_name.starts_with("bob_current_"), "{copy_name}");
    assert!(copy_name.ends_with(".xlsx"));
    assert_eq!(result.handle.kind(), HandleKind::WorkingCopy);
    assert_eq!(fs::read(&copy).unwrap(), alice_bytes);
    assert_eq!(fs::read(&alice).unwrap(), alice_bytes);
    assert_eq!(names_in(dir), vec!["alice_inventory.xlsx".to_string(), copy_name]);
}

#[test]
fn test_save_foreign_with_real_probe() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let alice = seed_workbook(dir, "alice_inventory.xlsx", 10);
    let alice_before = fs::metadata(&alice).unwrap().modified().unwrap();

    let result = Reconciler::new(dir, user("bob"), XlsxStore)
        .prepare_for_save()
        .unwrap();

    assert_eq!(result.branch, Branch::OwnedByOther);
    assert!(result.handle.exists());
    assert_eq!(
        fs::metadata(&alice).unwrap().modified().unwrap(),
        alice_before
    );
}

#[test]
fn test_save_owned_locked_creates_one_working_copy() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let current = seed_workbook(dir, "bob_inventory.xlsx", 10);
    let before = fs::read(&current).unwrap();
    let store = MockStore::new();
    store.lock(&current);

    let result = Reconciler::new(dir, user("bob"), &store)
        .prepare_for_save()
        .unwrap();

    assert_eq!(result.handle.kind(), HandleKind::WorkingCopy);
    assert_eq!(result.locked.as_deref(), Some(current.as_path()));
    assert_eq!(fs::read(&current).unwrap(), before);

    let copies: Vec<String> = names_in(dir)
        .into_iter()
        .filter(|n| n.starts_with("bob_inventory_"))
        .collect();
    assert_eq!(copies.len(), 1);
}

#[test]
fn test_second_locked_save_prunes_previous_copy() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let current = seed_workbook(dir, "bob_inventory.xlsx", 10);
    let store = MockStore::new();
    store.lock(&current);
    let reconciler = Reconciler::new(dir, user("bob"), &store);

    let first = reconciler.prepare_for_save().unwrap();
    // The first copy becomes newest; make the locked canonical file newest again
    set_age(first.handle.path(), 60);
    set_age(&current, 1);
    let second = reconciler.prepare_for_save().unwrap();

    assert_ne!(first.handle.path(), second.handle.path());
    assert!(!first.handle.exists());
    assert!(second.handle.exists());
    assert!(current.exists());
}

#[test]
fn test_save_fails_when_nothing_is_accessible_or_writable() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    // Not a workbook: the owned probe fails, and so does the copy's probe
    fs::write(dir.join("bob_inventory.xlsx"), b"garbage").unwrap();

    let err = Reconciler::new(dir, user("bob"), XlsxStore)
        .prepare_for_save()
        .unwrap_err();

    assert!(matches!(err, ReconcileError::ReconcileFailed { .. }));
    assert_eq!(names_in(dir), vec!["bob_inventory.xlsx"]);
}

#[test]
fn test_passes_leave_other_user_with_shared_prefix_alone() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let smith = seed_workbook(dir, "bob_smith_inventory.xlsx", 10);
    seed_workbook(dir, "bob_inventory.xlsx", 100);
    let smith_bytes = fs::read(&smith).unwrap();
    let reconciler = Reconciler::new(dir, user("bob"), XlsxStore);

    let saved = reconciler.prepare_for_save().unwrap();
    assert_eq!(saved.branch, Branch::OwnedByOther);
    assert!(saved.renamed.is_none());
    assert_eq!(fs::read(&smith).unwrap(), smith_bytes);

    // Make bob's own copy the newest, then restart
    set_age(&smith, 600);
    reconciler.prepare_on_startup();
    assert!(smith.exists());
    assert!(names_in(dir).contains(&"bob_smith_inventory.xlsx".to_string()));
}

#[cfg(unix)]
#[test]
fn test_save_owned_with_os_lock_held() {
    use fs2::FileExt;

    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let current = seed_workbook(dir, "bob_inventory.xlsx", 10);
    let before = fs::read(&current).unwrap();

    let holder = File::open(&current).unwrap();
    holder.lock_exclusive().unwrap();

    let result = Reconciler::new(dir, user("bob"), XlsxStore)
        .prepare_for_save()
        .unwrap();

    assert_eq!(result.handle.kind(), HandleKind::WorkingCopy);
    assert_ne!(result.handle.path(), current);
    assert_eq!(fs::read(&current).unwrap(), before);
    drop(holder);
}
