//! Version bumps across JSON package manifests.
//!
//! Each file is read, has its `version` field replaced and is written back
//! with two-space indentation and a trailing newline. Files are handled
//! independently: a failure on one is logged and reported as
//! [`BumpOutcome::Skipped`] without affecting the others.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use relsh_commons::{ExecutionLog, resolve_against};
use serde_json::Value;
use thiserror::Error;

/// One or more manifest paths handed to a bump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestTargets(Vec<PathBuf>);

impl ManifestTargets {
    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for ManifestTargets {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<&str> for ManifestTargets {
    fn from(path: &str) -> Self {
        Self(vec![PathBuf::from(path)])
    }
}

impl From<String> for ManifestTargets {
    fn from(path: String) -> Self {
        Self(vec![PathBuf::from(path)])
    }
}

impl From<&Path> for ManifestTargets {
    fn from(path: &Path) -> Self {
        Self(vec![path.to_path_buf()])
    }
}

impl From<PathBuf> for ManifestTargets {
    fn from(path: PathBuf) -> Self {
        Self(vec![path])
    }
}

impl<T: Into<PathBuf>> From<Vec<T>> for ManifestTargets {
    fn from(paths: Vec<T>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PathBuf> + Clone> From<&[T]> for ManifestTargets {
    fn from(paths: &[T]) -> Self {
        Self(paths.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<PathBuf>, const N: usize> From<[T; N]> for ManifestTargets {
    fn from(paths: [T; N]) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PathBuf>> FromIterator<T> for ManifestTargets {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DryRun,
    Read,
    Parse,
    NotAnObject,
    Write,
}

/// Per-file result of a bump. Paths are reported as they were given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpOutcome {
    Bumped {
        path: PathBuf,
        /// `version` before the bump, when it held a string.
        previous_version: Option<String>,
    },
    Skipped {
        path: PathBuf,
        reason: SkipReason,
        detail: Option<String>,
    },
}

impl BumpOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Bumped { path, .. } | Self::Skipped { path, .. } => path,
        }
    }

    pub fn is_bumped(&self) -> bool {
        matches!(self, Self::Bumped { .. })
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Bumped { .. } => None,
            Self::Skipped { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} does not hold a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ManifestError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::NotAnObject { path }
            | Self::Serialize { path, .. }
            | Self::Write { path, .. } => path,
        }
    }

    pub fn reason(&self) -> SkipReason {
        match self {
            Self::Read { .. } => SkipReason::Read,
            Self::Parse { .. } => SkipReason::Parse,
            Self::NotAnObject { .. } => SkipReason::NotAnObject,
            Self::Serialize { .. } | Self::Write { .. } => SkipReason::Write,
        }
    }
}

/// Replace `version` in the manifest at `path`, returning the previous
/// string value if there was one.
pub async fn set_version(path: &Path, version: &str) -> Result<Option<String>, ManifestError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut document: Value =
        serde_json::from_str(&contents).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let Some(object) = document.as_object_mut() else {
        return Err(ManifestError::NotAnObject {
            path: path.to_path_buf(),
        });
    };
    let previous = object
        .insert("version".to_owned(), Value::String(version.to_owned()))
        .and_then(|value| value.as_str().map(str::to_owned));

    let mut serialized =
        serde_json::to_string_pretty(&document).map_err(|source| ManifestError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    serialized.push('\n');

    tokio::fs::write(path, serialized)
        .await
        .map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(previous)
}

/// Bump every target concurrently. Relative paths resolve against
/// `base_dir`. Never fails; problems are logged and reported per file.
pub(crate) async fn bump_all(
    targets: ManifestTargets,
    version: &str,
    base_dir: &Path,
    log: &dyn ExecutionLog,
) -> Vec<BumpOutcome> {
    join_all(
        targets
            .into_iter()
            .map(|path| bump_one(path, version, base_dir, log)),
    )
    .await
}

async fn bump_one(
    path: PathBuf,
    version: &str,
    base_dir: &Path,
    log: &dyn ExecutionLog,
) -> BumpOutcome {
    let resolved = resolve_against(base_dir, &path);
    match set_version(&resolved, version).await {
        Ok(previous_version) => BumpOutcome::Bumped {
            path,
            previous_version,
        },
        Err(err) => {
            match &err {
                ManifestError::Read { path: read, .. } => {
                    log.warn(&format!("There was a problem reading {}", read.display()));
                }
                _ => log.warn(&format!(
                    "There was a problem bumping the version in {}",
                    path.display()
                )),
            }
            log.debug(&err);
            BumpOutcome::Skipped {
                path,
                reason: err.reason(),
                detail: Some(err.to_string()),
            }
        }
    }
}

/// Outcomes for a dry-run bump: every file skipped, nothing read.
pub(crate) fn dry_run_outcomes(targets: ManifestTargets) -> Vec<BumpOutcome> {
    targets
        .into_iter()
        .map(|path| BumpOutcome::Skipped {
            path,
            reason: SkipReason::DryRun,
            detail: None,
        })
        .collect()
}
