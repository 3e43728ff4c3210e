//! Candidates command implementation

use anyhow::Result;
use clap::Args;
use fixture_core::io::{select_newest, DirLayout};
use serde_json::json;

use crate::util::context::Context;
use crate::util::format::format_mtime;

/// List inventory files in the shared directory
#[derive(Args, Debug)]
pub struct CandidatesArgs {
    /// Only show files owned by the active user
    #[arg(long)]
    mine: bool,
}

/// Execute the candidates command
pub fn execute(ctx: &Context, args: CandidatesArgs) -> Result<()> {
    let mut candidates = ctx.candidates()?;
    let newest = select_newest(&candidates).map(|c| c.path.clone());

    if args.mine {
        let layout = DirLayout::new(&ctx.dir, ctx.user()?);
        candidates.retain(|c| layout.is_owned(&c.path));
    }

    if ctx.json() {
        let output = json!({
            "dir": ctx.dir,
            "candidates": candidates.iter().map(|c| json!({
                "path": c.path,
                "owner": c.owner,
                "modified": c.modified.map(|m| format_mtime(Some(m))),
                "accessible": c.is_accessible(),
                "newest": newest.as_ref() == Some(&c.path),
            })).collect::<Vec<_>>()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No inventory files in {}", ctx.dir.display());
        return Ok(());
    }

    println!("Inventory files in {}:", ctx.dir.display());
    for c in &candidates {
        let marker = if newest.as_ref() == Some(&c.path) { "*" } else { " " };
        let owner = c.owner.as_deref().unwrap_or("-");
        let modified = format_mtime(c.modified);
        let access = if c.is_accessible() { "" } else { "  (inaccessible)" };
        println!("{marker} {:40}  {owner:12}  {modified}{access}", c.file_name());
    }
    Ok(())
}
