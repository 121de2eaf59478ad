//! Configuration loading for relsh.
//!
//! [`ConfigManager`] merges `relsh.toml` layers (user, workspace,
//! environment, runtime overrides) into a [`RelshConfig`] and hands out the
//! resulting [`ExecutionPolicy`](relsh_commons::ExecutionPolicy).
//! [`SharedPolicy`] is a mutable policy source for hosts that flip flags
//! while a release is running.

pub mod loader;
pub mod shared;

pub use loader::layers::{ConfigLayerEntry, ConfigLayerSource, ConfigLayerStack};
pub use loader::{CONFIG_FILE_NAME, ConfigManager, LogConfig, RelshConfig, RuntimeOverrides};
pub use shared::SharedPolicy;
