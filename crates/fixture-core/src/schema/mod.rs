//! Schema types for the shared inventory directory
//!
//! Row 1 of every data file is the fixed header in [`COLUMNS`]; each
//! following row is one fixture.

mod inventory;
mod status;
mod user;

pub use inventory::{
    load_inventory, next_serial, validate_serial, InventoryError, InventoryRecord, COLUMNS,
    SHELF_LIFE_DAYS,
};
pub use status::{ParseStatusError, Status};
pub use user::{InvalidUserId, UserId};
