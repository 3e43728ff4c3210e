//! Core types and reconciliation logic for fixture-control
//!
//! The inventory lives in `.xlsx` files on a shared directory that several
//! users write to at the same time, with no lock manager beyond the
//! filesystem itself. This crate decides which physical file a process
//! should read and write:
//!
//! - [`io`] discovers candidate files, picks the newest and reconciles
//!   ownership into a single [`io::DataHandle`]
//! - [`workbook`] is the spreadsheet collaborator (create, write-probe, read)
//! - [`schema`] is the typed row model of the inventory sheet
//! - [`settings`] resolves and loads the shared settings JSON

pub mod config;
pub mod home;
pub mod io;
pub mod logging;
pub mod schema;
pub mod settings;
pub mod workbook;

pub use io::{DataHandle, HandleKind, ReconcileError, Reconciler, Reconciliation};
pub use schema::{InventoryRecord, Status, UserId};
pub use workbook::{WorkbookError, WorkbookStore, XlsxStore};
