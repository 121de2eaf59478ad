use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use relsh_commons::ReleaseOptions;
use serde::{Deserialize, Serialize};
use toml::Value as TomlValue;

use crate::loader::config::RelshConfig;

/// Where a layer of `relsh.toml` settings came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigLayerSource {
    /// `relsh/relsh.toml` under the user's config directory.
    User { file: PathBuf },
    /// `.relsh/relsh.toml` or `relsh.toml` in the workspace.
    Workspace { file: PathBuf },
    /// `RELSH_*` environment variables.
    Environment,
    /// Command-line flags.
    Runtime,
}

impl ConfigLayerSource {
    pub fn file(&self) -> Option<&PathBuf> {
        match self {
            Self::User { file } | Self::Workspace { file } => Some(file),
            Self::Environment | Self::Runtime => None,
        }
    }
}

impl fmt::Display for ConfigLayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User { file } | Self::Workspace { file } => write!(f, "{}", file.display()),
            Self::Environment => f.write_str("RELSH_* environment"),
            Self::Runtime => f.write_str("command-line overrides"),
        }
    }
}

/// Raw settings of one layer, kept as parsed for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayerEntry {
    pub source: ConfigLayerSource,
    pub config: TomlValue,
}

impl ConfigLayerEntry {
    pub fn new(source: ConfigLayerSource, config: TomlValue) -> Self {
        Self { source, config }
    }
}

/// Settings a single layer may carry. A key the layer leaves out keeps the
/// value from the layers below it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LayerSettings {
    dry_run: Option<bool>,
    verbose: Option<bool>,
    options: ReleaseOptions,
    log: LogSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogSettings {
    level: Option<String>,
    targets: Option<Vec<String>>,
}

impl LayerSettings {
    fn apply(self, config: &mut RelshConfig) {
        if let Some(dry_run) = self.dry_run {
            config.dry_run = dry_run;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        if let Some(path) = self.options.publish_path {
            config.options.publish_path = Some(path);
        }
        // [options] entries replace key by key
        config.options.extra.extend(self.options.extra);
        if let Some(level) = self.log.level {
            config.log.level = level;
        }
        if let Some(targets) = self.log.targets {
            config.log.targets = targets;
        }
    }
}

/// Configuration layers, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayerStack {
    layers: Vec<ConfigLayerEntry>,
}

impl ConfigLayerStack {
    pub fn new(layers: Vec<ConfigLayerEntry>) -> Self {
        Self { layers }
    }

    pub fn push(&mut self, layer: ConfigLayerEntry) {
        self.layers.push(layer);
    }

    /// Fold every layer over the defaults, later layers winning.
    pub fn effective_config(&self) -> Result<RelshConfig> {
        let mut config = RelshConfig::default();
        for layer in &self.layers {
            let settings: LayerSettings = layer
                .config
                .clone()
                .try_into()
                .with_context(|| format!("Invalid settings in {}", layer.source))?;
            tracing::trace!(source = %layer.source, "applying configuration layer");
            settings.apply(&mut config);
        }
        Ok(config)
    }

    pub fn layers(&self) -> &[ConfigLayerEntry] {
        &self.layers
    }

    /// The highest-precedence layer that came from a file.
    pub fn last_file(&self) -> Option<&PathBuf> {
        self.layers.iter().rev().find_map(|layer| layer.source.file())
    }
}
