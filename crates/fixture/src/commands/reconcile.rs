//! Reconcile command implementation

use anyhow::Result;

use super::prepare::print_reconciliation;
use crate::util::context::Context;

/// Execute the reconcile command
///
/// A failed pass is returned as an error so the process exits non-zero.
pub fn execute(ctx: &Context) -> Result<()> {
    let result = ctx.reconciler()?.prepare_for_save()?;
    print_reconciliation(ctx, &result)
}
