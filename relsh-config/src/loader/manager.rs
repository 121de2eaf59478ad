use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relsh_commons::{ExecutionPolicy, PolicySource};

use crate::loader::config::RelshConfig;
use crate::loader::env::{RuntimeOverrides, environment_layer};
use crate::loader::layers::{ConfigLayerEntry, ConfigLayerSource, ConfigLayerStack};

pub const CONFIG_FILE_NAME: &str = "relsh.toml";
const CONFIG_DIR_NAME: &str = ".relsh";
const ENV_CONFIG_PATH: &str = "RELSH_CONFIG_PATH";

/// Configuration manager for loading and validating configurations
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: RelshConfig,
    config_path: Option<PathBuf>,
    workspace_root: Option<PathBuf>,
    layer_stack: ConfigLayerStack,
}

impl ConfigManager {
    /// Load configuration from `RELSH_CONFIG_PATH` or the current directory.
    pub fn load() -> Result<Self> {
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            let trimmed = config_path.trim();
            if !trimmed.is_empty() {
                return Self::load_from_file(trimmed).with_context(|| {
                    format!("Failed to load configuration from {ENV_CONFIG_PATH}={trimmed}")
                });
            }
        }

        Self::load_from_workspace(std::env::current_dir()?)
    }

    /// Load configuration from a specific workspace
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self> {
        let mut stack = ConfigLayerStack::default();
        Self::push_user_layers(&mut stack, &Self::user_config_paths());
        Self::load_workspace_layers(workspace.as_ref(), stack, |name| std::env::var(name).ok())
    }

    /// Like [`load_from_workspace`](Self::load_from_workspace) with explicit
    /// user config candidates and environment lookup.
    pub fn load_from_workspace_with(
        workspace: impl AsRef<Path>,
        user_paths: &[PathBuf],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut stack = ConfigLayerStack::default();
        Self::push_user_layers(&mut stack, user_paths);
        Self::load_workspace_layers(workspace.as_ref(), stack, env)
    }

    /// Load configuration from a specific file, on top of the user layers.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut layer_stack = ConfigLayerStack::default();
        Self::push_user_layers(&mut layer_stack, &Self::user_config_paths());

        let toml = Self::load_toml_from_file(path)?;
        layer_stack.push(ConfigLayerEntry::new(
            ConfigLayerSource::Workspace {
                file: path.to_path_buf(),
            },
            toml,
        ));
        if let Some(layer) = environment_layer(|name| std::env::var(name).ok()) {
            layer_stack.push(ConfigLayerEntry::new(ConfigLayerSource::Environment, layer));
        }

        let config = Self::resolve(&layer_stack).with_context(|| {
            format!("Failed to load effective config with file: {}", path.display())
        })?;

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
            workspace_root: path.parent().map(Path::to_path_buf),
            layer_stack,
        })
    }

    /// Apply the highest-precedence layer and re-validate.
    pub fn with_runtime_overrides(mut self, overrides: &RuntimeOverrides) -> Result<Self> {
        if overrides.is_empty() {
            return Ok(self);
        }
        self.layer_stack.push(ConfigLayerEntry::new(
            ConfigLayerSource::Runtime,
            overrides.to_layer(),
        ));
        self.config =
            Self::resolve(&self.layer_stack).context("Runtime overrides failed validation")?;
        Ok(self)
    }

    fn user_config_paths() -> Vec<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("relsh").join(CONFIG_FILE_NAME))
            .into_iter()
            .collect()
    }

    fn push_user_layers(stack: &mut ConfigLayerStack, user_paths: &[PathBuf]) {
        for path in user_paths {
            if !path.exists() {
                continue;
            }
            match Self::load_toml_from_file(path) {
                Ok(toml) => stack.push(ConfigLayerEntry::new(
                    ConfigLayerSource::User { file: path.clone() },
                    toml,
                )),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable user config");
                }
            }
        }
    }

    fn load_workspace_layers(
        workspace_root: &Path,
        mut layer_stack: ConfigLayerStack,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // .relsh/relsh.toml, then relsh.toml in the root which wins
        let candidates = [
            workspace_root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
            workspace_root.join(CONFIG_FILE_NAME),
        ];
        for file in candidates {
            if file.exists() {
                let toml = Self::load_toml_from_file(&file)?;
                layer_stack.push(ConfigLayerEntry::new(
                    ConfigLayerSource::Workspace { file },
                    toml,
                ));
            }
        }

        if let Some(layer) = environment_layer(env) {
            layer_stack.push(ConfigLayerEntry::new(ConfigLayerSource::Environment, layer));
        }

        let config = Self::resolve(&layer_stack)?;
        let config_path = layer_stack.last_file().cloned();

        Ok(Self {
            config,
            config_path,
            workspace_root: Some(workspace_root.to_path_buf()),
            layer_stack,
        })
    }

    fn resolve(layer_stack: &ConfigLayerStack) -> Result<RelshConfig> {
        let config = layer_stack.effective_config()?;
        config
            .validate()
            .context("Configuration failed validation")?;
        Ok(config)
    }

    fn load_toml_from_file(path: &Path) -> Result<toml::Value> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let value: toml::Value = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(value)
    }

    pub fn config(&self) -> &RelshConfig {
        &self.config
    }

    /// Highest-precedence file that contributed to the configuration.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    pub fn layer_stack(&self) -> &ConfigLayerStack {
        &self.layer_stack
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.config.policy()
    }
}

impl PolicySource for ConfigManager {
    fn snapshot(&self) -> ExecutionPolicy {
        self.policy()
    }
}
