//! relsh - command harness for release automation.
//!
//! [`Shell`] is the entry point: it runs shell built-ins and command lines
//! through a policy-aware [`Dispatcher`](relsh_shell_runner::Dispatcher) and
//! layers the release helpers on top (build, `npm publish`, glob copy and
//! manifest version bumps). Dry-run and verbosity come from a
//! [`PolicySource`](relsh_commons::PolicySource) that is consulted on every
//! call, typically a [`ConfigManager`](relsh_config::ConfigManager) or a
//! [`SharedPolicy`](relsh_config::SharedPolicy).
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use relsh::Shell;
//! use relsh_commons::{ExecutionPolicy, StaticPolicy};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let policy = Arc::new(StaticPolicy::new(ExecutionPolicy::dry_run()));
//! let shell = Shell::system(std::env::current_dir()?, policy);
//! shell.build(Some("npm run build"), "dist").await?;
//! shell.bump(["package.json", "bower.json"], "2.0.0").await;
//! # Ok(())
//! # }
//! ```

pub mod copy;
pub mod manifest;
pub mod shell;

pub use copy::{CopyOptions, FsGlobCopy, GlobCopy};
pub use manifest::{BumpOutcome, ManifestError, ManifestTargets, SkipReason, set_version};
pub use shell::Shell;

pub use relsh_shell_runner::{DispatchError, Operation, Outcome};
