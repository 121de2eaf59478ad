//! relsh - release step runner
//!
//! Thin binary entry point: parse flags, load configuration, then hand the
//! subcommand to the [`Shell`] facade.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use relsh::Shell;
use relsh_config::SharedPolicy;

mod cli;
mod main_helpers;

use cli::Cli;
use main_helpers::{initialize_tracing, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let workspace = std::env::current_dir().context("failed to read the current directory")?;
    let manager = load_config(&args, &workspace)?;
    let config = manager.config();
    initialize_tracing(&config.log, config.verbose);
    tracing::debug!(
        config_path = ?manager.config_path(),
        dry_run = config.dry_run,
        verbose = config.verbose,
        "configuration loaded"
    );

    let policy = Arc::new(SharedPolicy::new(manager.policy()));
    let shell = Shell::system(workspace, policy);
    cli::execute(&shell, args.command).await
}
