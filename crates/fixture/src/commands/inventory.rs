//! Inventory command implementation

use anyhow::{Context as _, Result};
use chrono::Local;
use clap::Args;
use fixture_core::schema::{load_inventory, validate_serial};
use fixture_core::{Status, XlsxStore};
use serde_json::json;

use crate::util::context::Context;
use crate::util::format::display_name;

/// List fixtures in the newest inventory file
#[derive(Args, Debug)]
pub struct InventoryArgs {
    /// Only show fixtures with this status (e.g. "Available", "Checked Out", "Check")
    #[arg(long)]
    status: Option<String>,

    /// Only show the fixture with this serial (case-insensitive)
    #[arg(long)]
    serial: Option<String>,
}

/// Execute the inventory command
pub fn execute(ctx: &Context, args: InventoryArgs) -> Result<()> {
    let filter: Option<Status> = args.status.as_deref().map(str::parse).transpose()?;
    let serial = args.serial.as_deref().map(validate_serial).transpose()?;

    let Some(path) = ctx.newest_file()? else {
        if ctx.json() {
            println!("{}", json!({"file": null, "fixtures": []}));
        } else {
            println!("No inventory file in {}", ctx.dir.display());
        }
        return Ok(());
    };

    let today = Local::now().date_naive();
    let records = load_inventory(&XlsxStore, &path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let rows: Vec<_> = records
        .iter()
        .map(|r| (r, r.effective_status(today)))
        .filter(|(_, status)| filter.is_none() || *status == filter)
        .filter(|(r, _)| serial.as_ref().is_none_or(|s| r.serial.eq_ignore_ascii_case(s)))
        .collect();

    if ctx.json() {
        let output = json!({
            "file": path,
            "fixtures": rows.iter().map(|(r, status)| json!({
                "serial": r.serial,
                "model": r.model,
                "name": r.name,
                "status": r.status,
                "effectiveStatus": status.map(Status::label),
                "checkedOutBy": r.checked_out_by,
                "checkedOutAt": r.checked_out_at,
                "serializedDate": r.serialized_date,
                "wipLocation": r.wip_location,
            })).collect::<Vec<_>>()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} ({} fixtures)", display_name(&path), rows.len());
    for (r, status) in &rows {
        let label = status.map(Status::label).unwrap_or(r.status.as_str());
        let serial = &r.serial;
        let name = &r.name;
        let by = &r.checked_out_by;
        println!("  {serial:14}  {name:24}  {label:12}  {by}");
    }
    Ok(())
}
