//! Settings command implementation

use anyhow::Result;
use clap::Args;
use fixture_core::io::DirLayout;
use fixture_core::settings::{load_settings, resolve_settings_path, LoadOutcome};
use serde_json::json;

use crate::util::context::Context;
use crate::util::format::display_name;

/// Show the resolved settings file
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Only print the resolved path; do not load or create the file
    #[arg(long)]
    path: bool,
}

/// Execute the settings command
pub fn execute(ctx: &Context, args: SettingsArgs) -> Result<()> {
    let layout = DirLayout::new(&ctx.dir, ctx.user()?);
    let path = resolve_settings_path(&layout);

    if args.path {
        if ctx.json() {
            println!("{}", json!({"path": path}));
        } else {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let outcome = load_settings(&layout, &path, ctx.config.settings.load_policy())?;
    let origin = match outcome {
        LoadOutcome::Loaded(_) => "loaded".to_string(),
        LoadOutcome::Created(_) => "created with defaults".to_string(),
        LoadOutcome::Recovered {
            backup: Some(ref backup),
            ..
        } => format!("corrupt, defaults used (backup: {})", display_name(backup)),
        LoadOutcome::Recovered { backup: None, .. } => {
            "corrupt, defaults used (file left untouched)".to_string()
        }
    };
    let settings = outcome.settings();

    if ctx.json() {
        let mut types = settings.types.clone();
        types.sort();
        let output = json!({
            "path": path,
            "origin": origin,
            "types": types,
            "models": settings.models,
            "wipLocations": settings.wip_locations,
            "images": settings.type_images.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Settings: {} ({origin})", path.display());
    println!("  types:         {}", settings.types.len());
    println!("  models:        {}", settings.models.len());
    println!("  images:        {}", settings.type_images.len());
    println!("  wip locations: {}", settings.wip_locations.join(", "));
    Ok(())
}
