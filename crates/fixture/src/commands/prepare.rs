//! Prepare command implementation

use anyhow::Result;
use fixture_core::Reconciliation;

use crate::util::context::Context;
use crate::util::format::display_name;

/// Execute the prepare command
pub fn execute(ctx: &Context) -> Result<()> {
    let result = ctx.reconciler()?.prepare_on_startup();
    print_reconciliation(ctx, &result)
}

/// Shared by `prepare` and `reconcile`
pub fn print_reconciliation(ctx: &Context, result: &Reconciliation) -> Result<()> {
    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let kind = match result.handle.kind() {
        fixture_core::HandleKind::Canonical => "canonical",
        fixture_core::HandleKind::WorkingCopy => "working copy",
        fixture_core::HandleKind::Fallback => "fallback",
    };
    let path = result.handle.path().display();
    println!("Using {path} ({kind})");
    if !result.handle.exists() {
        println!("  (not created yet; created on first save)");
    }
    if let Some(ref source) = result.source {
        println!("  newest: {}", display_name(source));
    }
    if let Some((ref from, ref to)) = result.renamed {
        println!("  renamed: {} -> {}", display_name(from), display_name(to));
    }
    if let Some(ref locked) = result.locked {
        println!("  locked: {}", display_name(locked));
    }
    if let Some(ref created) = result.created {
        println!("  created: {}", display_name(created));
    }
    for removed in &result.removed {
        println!("  removed: {}", display_name(removed));
    }
    Ok(())
}
