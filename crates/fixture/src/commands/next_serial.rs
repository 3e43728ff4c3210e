//! Next-serial command implementation

use anyhow::Result;
use fixture_core::schema::{load_inventory, next_serial};
use fixture_core::XlsxStore;
use serde_json::json;

use crate::util::context::Context;

/// Execute the next-serial command
pub fn execute(ctx: &Context) -> Result<()> {
    let records = match ctx.newest_file()? {
        Some(path) => load_inventory(&XlsxStore, &path)?,
        None => Vec::new(),
    };
    let serial = next_serial(&records);

    if ctx.json() {
        println!("{}", json!({"serial": serial}));
    } else {
        println!("{serial}");
    }
    Ok(())
}
