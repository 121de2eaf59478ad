use anyhow::{Result, bail};
use relsh_commons::{ExecutionPolicy, ReleaseOptions};
use serde::{Deserialize, Serialize};

/// Logging settings for the `relsh` binary. `RUST_LOG` still wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub targets: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            targets: vec!["relsh".to_owned()],
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directive string, e.g. `relsh=info,relsh_shell_runner=info`.
    pub fn filter_directive(&self, verbose: bool) -> String {
        let level = if verbose { "debug" } else { self.level.as_str() };
        self.targets
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Effective `relsh.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelshConfig {
    pub dry_run: bool,
    pub verbose: bool,
    pub options: ReleaseOptions,
    pub log: LogConfig,
}

impl RelshConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.options.publish_path
            && path.trim().is_empty()
        {
            bail!("options.publish_path must not be empty when set");
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log.level.as_str()) {
            bail!(
                "log.level must be one of {}, got `{}`",
                LEVELS.join(", "),
                self.log.level
            );
        }
        Ok(())
    }

    pub fn policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            dry_run: self.dry_run,
            verbose: self.verbose,
            options: self.options.clone(),
        }
    }
}
