use anyhow::{Context, Result};
use relsh_config::{ConfigManager, LogConfig, RuntimeOverrides};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

/// Install the stderr subscriber. `RUST_LOG` takes precedence over the
/// configured `[log]` section.
pub(crate) fn initialize_tracing(log: &LogConfig, verbose: bool) {
    use tracing_subscriber::prelude::*;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log.filter_directive(verbose)));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    if let Err(err) = init_result {
        tracing::warn!(error = %err, "tracing already initialized; skipping tracing setup");
    }
}

/// Load the layered configuration and apply the command-line flags on top.
pub(crate) fn load_config(args: &Cli, workspace: &std::path::Path) -> Result<ConfigManager> {
    let manager = match &args.config {
        Some(path) => ConfigManager::load_from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ConfigManager::load_from_workspace(workspace)?,
    };

    let publish_path = match &args.command {
        Commands::Publish { publish_path, .. } => publish_path.clone(),
        _ => None,
    };
    let overrides = RuntimeOverrides {
        dry_run: args.dry_run.then_some(true),
        verbose: args.verbose.then_some(true),
        publish_path,
    };
    manager.with_runtime_overrides(&overrides)
}
