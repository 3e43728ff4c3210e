//! CLI command dispatch and execution

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::util::context::{Context, GlobalArgs};

mod candidates;
mod inventory;
mod next_serial;
mod prepare;
mod reconcile;
mod settings;

/// fixture - Shared fixture inventory reconciler
#[derive(Parser, Debug)]
#[command(
    name = "fixture",
    version,
    about = "Shared fixture inventory reconciler",
    long_about = "Chooses and prepares the per-user inventory workbook in a directory shared by several users"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Startup preparation: copy the newest file to the per-user inventory
    Prepare,

    /// Pre-save preparation: produce a writable file or fail
    Reconcile,

    /// List inventory files in the shared directory
    Candidates(candidates::CandidatesArgs),

    /// List fixtures in the newest inventory file
    Inventory(inventory::InventoryArgs),

    /// Print the next free FX serial
    NextSerial,

    /// Show the resolved settings file
    Settings(settings::SettingsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let ctx = Context::resolve(&self.global)?;
        match self.command {
            Commands::Prepare => prepare::execute(&ctx),
            Commands::Reconcile => reconcile::execute(&ctx),
            Commands::Candidates(args) => candidates::execute(&ctx, args),
            Commands::Inventory(args) => inventory::execute(&ctx, args),
            Commands::NextSerial => next_serial::execute(&ctx),
            Commands::Settings(args) => settings::execute(&ctx, args),
        }
    }
}
