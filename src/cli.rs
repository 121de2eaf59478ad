use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use relsh::{BumpOutcome, CopyOptions, Outcome, Shell};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(
    name = "relsh",
    version,
    about = "Run release steps with dry-run and verbosity control"
)]
pub(crate) struct Cli {
    /// Log what would run without running anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Stream command output and log progress details.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Load configuration from this file instead of the workspace layers.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Run a built-in (pushd, popd, cd, pwd, rm, mkdir) or a command line.
    Run {
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "WORDS"
        )]
        words: Vec<String>,
    },

    /// Recreate the output directory and run the build command.
    Build {
        #[arg(long, default_value = "dist", value_name = "DIR")]
        dir: String,
        command: Option<String>,
    },

    /// Publish the package with `npm publish`.
    Publish {
        path: Option<String>,
        /// Directory to publish, taking precedence over PATH.
        #[arg(long, value_name = "DIR")]
        publish_path: Option<String>,
    },

    /// Set `version` in one or more JSON manifests.
    Bump {
        version: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Copy files matching glob patterns into a directory.
    Copy {
        target: PathBuf,
        #[arg(required = true)]
        patterns: Vec<String>,
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,
    },
}

pub(crate) async fn execute(shell: &Shell, command: Commands) -> Result<()> {
    match command {
        Commands::Run { words } => {
            let Some((name, args)) = words.split_first() else {
                anyhow::bail!("no command given");
            };
            let outcome = shell.run(name, args.iter().cloned()).await?;
            print_outcome(shell, &outcome);
        }
        Commands::Build { dir, command } => {
            for outcome in shell.build(command.as_deref(), &dir).await? {
                print_outcome(shell, &outcome);
            }
        }
        Commands::Publish { path, .. } => {
            let outcome = shell.npm_publish(path.as_deref()).await?;
            print_outcome(shell, &outcome);
        }
        Commands::Bump { version, files } => {
            for outcome in shell.bump(files, &version).await {
                match outcome {
                    BumpOutcome::Bumped {
                        path,
                        previous_version,
                    } => match previous_version {
                        Some(previous) => {
                            println!("bumped {} ({previous} -> {version})", path.display());
                        }
                        None => println!("bumped {} (-> {version})", path.display()),
                    },
                    BumpOutcome::Skipped { path, reason, .. } => {
                        println!("skipped {} ({reason:?})", path.display());
                    }
                }
            }
        }
        Commands::Copy {
            target,
            patterns,
            cwd,
        } => {
            let outcome = shell
                .copy(&patterns, &CopyOptions { cwd }, &target)
                .await?;
            print_outcome(shell, &outcome);
        }
    }
    Ok(())
}

/// Print what a step produced. Command output was already streamed when
/// the policy is verbose.
fn print_outcome(shell: &Shell, outcome: &Outcome) {
    match outcome {
        Outcome::Executed(output) => {
            if !shell.dispatcher().policy().is_verbose() && !output.output.is_empty() {
                print!("{}", output.output);
            }
        }
        Outcome::Value(Value::String(text)) => println!("{text}"),
        Outcome::Value(Value::Array(items)) => {
            for item in items {
                match item {
                    Value::String(text) => println!("{text}"),
                    other => println!("{other}"),
                }
            }
        }
        Outcome::Value(Value::Bool(_) | Value::Null) | Outcome::DryRun => {}
        Outcome::Value(other) => println!("{other}"),
    }
}
