//! Glob-based file copying used by [`Shell::copy`](crate::Shell::copy).

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use glob::glob;
use tracing::warn;

/// Options forwarded to the copier unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Directory the patterns are expanded against. Defaults to the shell's
    /// working directory.
    pub cwd: Option<PathBuf>,
}

impl CopyOptions {
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
        }
    }
}

impl fmt::Display for CopyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cwd {
            Some(cwd) => write!(f, "{{cwd: {}}}", cwd.display()),
            None => f.write_str("{}"),
        }
    }
}

/// Copies the files matching a set of glob patterns into a target directory.
pub trait GlobCopy: Send + Sync {
    /// Copy every match of `patterns` into `target`, resolving with the list
    /// of destination paths written.
    fn copy(
        &self,
        patterns: &[String],
        options: &CopyOptions,
        target: &Path,
    ) -> BoxFuture<'static, Result<Vec<PathBuf>>>;
}

/// Filesystem copier: patterns are expanded with `glob` and matches keep
/// their path relative to the expansion directory.
#[derive(Debug, Clone)]
pub struct FsGlobCopy {
    base_dir: PathBuf,
}

impl FsGlobCopy {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl GlobCopy for FsGlobCopy {
    fn copy(
        &self,
        patterns: &[String],
        options: &CopyOptions,
        target: &Path,
    ) -> BoxFuture<'static, Result<Vec<PathBuf>>> {
        let base = match &options.cwd {
            Some(cwd) => relsh_commons::resolve_against(&self.base_dir, cwd),
            None => self.base_dir.clone(),
        };
        let target = relsh_commons::resolve_against(&self.base_dir, target);
        let patterns = patterns.to_vec();

        async move {
            let mut copied = Vec::new();
            for source in expand_patterns(&base, &patterns)? {
                let relative = source.strip_prefix(&base).unwrap_or(&source);
                let relative = if relative.is_absolute() {
                    PathBuf::from(relative.file_name().unwrap_or(relative.as_os_str()))
                } else {
                    relative.to_path_buf()
                };
                let destination = target.join(relative);
                if let Some(parent) = destination.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                tokio::fs::copy(&source, &destination).await.with_context(|| {
                    format!(
                        "failed to copy {} to {}",
                        source.display(),
                        destination.display()
                    )
                })?;
                copied.push(destination);
            }
            Ok(copied)
        }
        .boxed()
    }
}

/// Regular files matched by `patterns`, sorted per pattern, without
/// duplicates.
fn expand_patterns(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let resolved = base.join(pattern);
        let resolved = resolved.to_string_lossy();
        let mut matches: Vec<PathBuf> = glob(&resolved)
            .with_context(|| format!("invalid copy pattern `{pattern}`"))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!("Ignoring unreadable path for pattern `{pattern}`: {err}");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();

        if matches.is_empty() {
            warn!("Copy pattern `{pattern}` did not match any files");
            continue;
        }
        matches.sort();
        for path in matches {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn copies_matches_preserving_relative_paths() -> Result<()> {
        let temp = TempDir::new()?;
        temp.child("src/a.txt").write_str("a")?;
        temp.child("src/nested/b.txt").write_str("b")?;
        temp.child("src/skip.md").write_str("c")?;

        let copier = FsGlobCopy::new(temp.path());
        let copied = copier
            .copy(
                &["**/*.txt".to_owned()],
                &CopyOptions::with_cwd("src"),
                Path::new("out"),
            )
            .await?;

        assert_eq!(
            copied,
            vec![
                temp.path().join("out/a.txt"),
                temp.path().join("out/nested/b.txt"),
            ]
        );
        temp.child("out/nested/b.txt").assert("b");
        temp.child("out/skip.md").assert(predicates::path::missing());
        Ok(())
    }

    #[tokio::test]
    async fn unmatched_pattern_copies_nothing() -> Result<()> {
        let temp = TempDir::new()?;
        let copier = FsGlobCopy::new(temp.path());
        let copied = copier
            .copy(&["*.json".to_owned()], &CopyOptions::default(), Path::new("out"))
            .await?;
        assert!(copied.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_pattern_is_an_error() -> Result<()> {
        let temp = TempDir::new()?;
        let copier = FsGlobCopy::new(temp.path());
        let result = copier
            .copy(&["[".to_owned()], &CopyOptions::default(), Path::new("out"))
            .await;
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn options_display_shows_cwd() {
        assert_eq!(CopyOptions::default().to_string(), "{}");
        assert_eq!(CopyOptions::with_cwd("dist").to_string(), "{cwd: dist}");
    }
}
