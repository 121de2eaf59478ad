pub mod layers;

mod config;
mod env;
mod manager;

#[cfg(test)]
mod tests;

pub use config::{LogConfig, RelshConfig};
pub use env::RuntimeOverrides;
pub use manager::{CONFIG_FILE_NAME, ConfigManager};
