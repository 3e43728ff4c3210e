//! Shared-directory file reconciliation
//!
//! Several users run the tool against one network folder. Each process
//! decides on its own which `.xlsx` file is authoritative:
//!
//! - **Discovery**: every data file is listed fresh on each call; files whose
//!   metadata cannot be read are excluded, not treated as missing
//! - **Newest wins**: the accessible file with the latest modification time
//!   is the source of truth
//! - **Ownership**: files are owned by the user whose name prefixes them;
//!   only owned files are renamed, rewritten or deleted
//! - **Write-probe**: a locked file is detected by trying to save it, and
//!   worked around with a timestamped working copy instead of retrying
//!
//! # Example
//!
//! ```rust,no_run
//! use fixture_core::io::{HandleKind, Reconciler};
//! use fixture_core::{UserId, XlsxStore};
//!
//! let user = UserId::new("bob").unwrap();
//! let reconciler = Reconciler::new("/mnt/share/fixture_control", user, XlsxStore);
//!
//! let startup = reconciler.prepare_on_startup();
//! println!("reading from {}", startup.handle.path().display());
//!
//! match reconciler.prepare_for_save() {
//!     Ok(ready) if ready.handle.kind() == HandleKind::WorkingCopy => {
//!         println!("writing to working copy {}", ready.handle.path().display())
//!     }
//!     Ok(ready) => println!("writing to {}", ready.handle.path().display()),
//!     Err(e) => eprintln!("aborting write: {e}"),
//! }
//! ```

pub mod discovery;
pub mod error;
pub mod hash;
pub mod layout;
pub mod reconcile;

// Re-export primary API
pub use discovery::{discover_candidates, select_newest, Candidate};
pub use error::ReconcileError;
pub use layout::{DirLayout, DATA_EXTENSION, TEMP_MARKER};
pub use reconcile::{Branch, DataHandle, HandleKind, Reconciler, Reconciliation};
