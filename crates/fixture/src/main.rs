//! fixture - Shared fixture inventory reconciler
//!
//! A thin CLI over `fixture-control-core`: prepares the per-user inventory
//! file in a shared directory and inspects what is there.

use clap::Parser;

mod commands;
mod util;

use commands::Cli;

fn main() {
    fixture_core::logging::init();
    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
