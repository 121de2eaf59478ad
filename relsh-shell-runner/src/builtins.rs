//! Filesystem-backed implementations of the [`Builtin`] operations.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use relsh_commons::resolve_against;
use serde_json::Value;

use crate::executor::Builtin;

/// Working directory plus the directories saved by `pushd`.
#[derive(Debug, Clone)]
pub(crate) struct DirectoryState {
    cwd: PathBuf,
    // most recent first
    saved: Vec<PathBuf>,
}

impl DirectoryState {
    pub(crate) fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            saved: Vec::new(),
        }
    }

    pub(crate) fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub(crate) fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    fn push(&mut self, dir: PathBuf) {
        let previous = std::mem::replace(&mut self.cwd, dir);
        self.saved.insert(0, previous);
    }

    fn pop(&mut self) -> Option<PathBuf> {
        if self.saved.is_empty() {
            return None;
        }
        let restored = self.saved.remove(0);
        self.cwd = restored.clone();
        Some(restored)
    }

    /// The stack as `dirs` prints it: current directory first.
    fn listing(&self) -> Vec<PathBuf> {
        std::iter::once(self.cwd.clone())
            .chain(self.saved.iter().cloned())
            .collect()
    }
}

pub(crate) async fn invoke(
    builtin: Builtin,
    state: &Arc<Mutex<DirectoryState>>,
    args: Vec<String>,
    silent: bool,
) -> Result<Value> {
    match builtin {
        Builtin::Pushd => pushd(state, &args, silent).await,
        Builtin::Popd => popd(state, silent),
        Builtin::Cd => cd(state, &args).await,
        Builtin::Pwd => Ok(Value::String(state.lock().cwd().display().to_string())),
        Builtin::Rm => rm(state, &args).await,
        Builtin::Mkdir => mkdir(state, &args).await,
    }
}

/// Split `-rf`-style flag clusters from operands, rejecting unknown flags.
fn split_flags(
    builtin: Builtin,
    args: &[String],
    allowed: &[char],
) -> Result<(HashSet<char>, Vec<String>)> {
    let mut flags = HashSet::new();
    let mut operands = Vec::new();

    for arg in args {
        match arg.strip_prefix('-') {
            Some(cluster) if !cluster.is_empty() => {
                for flag in cluster.chars() {
                    if !allowed.contains(&flag) {
                        bail!("{builtin}: option not recognized: {flag}");
                    }
                    flags.insert(flag);
                }
            }
            _ => operands.push(arg.clone()),
        }
    }

    Ok((flags, operands))
}

fn current_dir(state: &Arc<Mutex<DirectoryState>>) -> PathBuf {
    state.lock().cwd().to_path_buf()
}

async fn ensure_directory(builtin: Builtin, path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("{builtin}: no such file or directory: {}", path.display()))?;
    if !metadata.is_dir() {
        bail!("{builtin}: not a directory: {}", path.display());
    }
    Ok(())
}

fn paths_value(paths: &[PathBuf]) -> Value {
    Value::Array(
        paths
            .iter()
            .map(|path| Value::String(path.display().to_string()))
            .collect(),
    )
}

fn announce_stack(stack: &[PathBuf], silent: bool) {
    if silent {
        return;
    }
    let rendered: Vec<String> = stack.iter().map(|dir| dir.display().to_string()).collect();
    println!("{}", rendered.join(" "));
}

async fn pushd(state: &Arc<Mutex<DirectoryState>>, args: &[String], silent: bool) -> Result<Value> {
    let (_, operands) = split_flags(Builtin::Pushd, args, &[])?;
    let Some(dir) = operands.first() else {
        bail!("pushd: no other directory");
    };

    let target = resolve_against(&current_dir(state), dir);
    ensure_directory(Builtin::Pushd, &target).await?;

    let stack = {
        let mut state = state.lock();
        state.push(target);
        state.listing()
    };
    announce_stack(&stack, silent);
    Ok(paths_value(&stack))
}

fn popd(state: &Arc<Mutex<DirectoryState>>, silent: bool) -> Result<Value> {
    let stack = {
        let mut state = state.lock();
        if state.pop().is_none() {
            bail!("popd: directory stack empty");
        }
        state.listing()
    };
    announce_stack(&stack, silent);
    Ok(paths_value(&stack))
}

async fn cd(state: &Arc<Mutex<DirectoryState>>, args: &[String]) -> Result<Value> {
    let (_, operands) = split_flags(Builtin::Cd, args, &[])?;
    let Some(dir) = operands.first() else {
        bail!("cd: a directory is required");
    };

    let target = resolve_against(&current_dir(state), dir);
    ensure_directory(Builtin::Cd, &target).await?;
    state.lock().cwd = target.clone();
    Ok(Value::String(target.display().to_string()))
}

async fn rm(state: &Arc<Mutex<DirectoryState>>, args: &[String]) -> Result<Value> {
    let (flags, operands) = split_flags(Builtin::Rm, args, &['r', 'R', 'f'])?;
    if operands.is_empty() {
        bail!("rm: no paths given");
    }
    let recursive = flags.contains(&'r') || flags.contains(&'R');
    let force = flags.contains(&'f');
    let cwd = current_dir(state);

    let mut removed = Vec::new();
    for operand in &operands {
        // an empty operand names no file
        if operand.is_empty() {
            continue;
        }
        let target = resolve_against(&cwd, operand);
        if cwd.starts_with(&target) {
            bail!(
                "rm: refusing to remove {}: it contains the working directory",
                target.display()
            );
        }
        let metadata = match tokio::fs::symlink_metadata(&target).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound && force => continue,
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("rm: no such file or directory: {}", target.display())
                });
            }
        };

        if metadata.is_dir() {
            if !recursive {
                bail!("rm: path is a directory: {}", target.display());
            }
            tokio::fs::remove_dir_all(&target)
                .await
                .with_context(|| format!("rm: failed to remove {}", target.display()))?;
        } else {
            tokio::fs::remove_file(&target)
                .await
                .with_context(|| format!("rm: failed to remove {}", target.display()))?;
        }
        removed.push(target);
    }

    Ok(paths_value(&removed))
}

async fn mkdir(state: &Arc<Mutex<DirectoryState>>, args: &[String]) -> Result<Value> {
    let (flags, operands) = split_flags(Builtin::Mkdir, args, &['p'])?;
    if operands.is_empty() {
        bail!("mkdir: no paths given");
    }
    let parents = flags.contains(&'p');
    let cwd = current_dir(state);

    let mut created = Vec::new();
    for operand in &operands {
        let target = resolve_against(&cwd, operand);
        if parents {
            tokio::fs::create_dir_all(&target)
                .await
                .with_context(|| format!("mkdir: failed to create {}", target.display()))?;
        } else {
            tokio::fs::create_dir(&target)
                .await
                .with_context(|| format!("mkdir: failed to create {}", target.display()))?;
        }
        created.push(target);
    }

    Ok(paths_value(&created))
}
