//! Release-oriented operations on top of the [`Dispatcher`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use relsh_commons::{
    ExecutionLog, NoopTelemetry, PolicySource, TelemetrySink, UsageEvent, resolve_against,
};
use relsh_shell_runner::{
    Builtin, DispatchError, Dispatcher, Operation, Outcome, Sequence, ShellProcess,
};
use serde_json::Value;

use crate::copy::{CopyOptions, FsGlobCopy, GlobCopy};
use crate::manifest::{self, BumpOutcome, ManifestTargets};

/// Facade the release workflow talks to: command dispatch plus the build,
/// publish, copy and version-bump helpers.
#[derive(Clone)]
pub struct Shell {
    dispatcher: Dispatcher,
    copier: Arc<dyn GlobCopy>,
    tracker: Arc<dyn TelemetrySink<UsageEvent>>,
    base_dir: PathBuf,
}

impl Shell {
    /// Relative paths resolve against `base_dir` unless the capability keeps
    /// its own working directory.
    pub fn new(dispatcher: Dispatcher, base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            dispatcher,
            copier: Arc::new(FsGlobCopy::new(base_dir.clone())),
            tracker: Arc::new(NoopTelemetry),
            base_dir,
        }
    }

    /// Shell backed by the system shell, rooted at `working_dir`.
    pub fn system(working_dir: impl Into<PathBuf>, policy: Arc<dyn PolicySource>) -> Self {
        let working_dir = working_dir.into();
        let process = ShellProcess::new(working_dir.clone());
        Self::new(Dispatcher::new(Arc::new(process), policy), working_dir)
    }

    pub fn with_log(mut self, log: Arc<dyn ExecutionLog>) -> Self {
        self.dispatcher = self.dispatcher.with_log(log);
        self
    }

    pub fn with_copier(mut self, copier: Arc<dyn GlobCopy>) -> Self {
        self.copier = copier;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn TelemetrySink<UsageEvent>>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Directory relative paths currently resolve against.
    pub fn working_dir(&self) -> PathBuf {
        self.dispatcher
            .capability()
            .working_dir()
            .unwrap_or_else(|| self.base_dir.clone())
    }

    /// Run `name` with `args`: a built-in when the name matches one,
    /// otherwise the joined command line.
    pub async fn run<I, S>(&self, name: &str, args: I) -> Result<Outcome, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatcher.run_words(name, args).await
    }

    pub async fn run_operation(&self, operation: Operation) -> Result<Outcome, DispatchError> {
        self.dispatcher.run(operation).await
    }

    pub async fn pushd(&self, path: &str) -> Result<Outcome, DispatchError> {
        self.run_operation(Operation::builtin(Builtin::Pushd, [path]))
            .await
    }

    pub async fn popd(&self) -> Result<Outcome, DispatchError> {
        self.run_operation(Operation::builtin(Builtin::Popd, Vec::<String>::new()))
            .await
    }

    /// Recreate `dir` and run the build `command` in it, stopping at the
    /// first failing step.
    pub async fn build(
        &self,
        command: Option<&str>,
        dir: &str,
    ) -> Result<Vec<Outcome>, DispatchError> {
        self.track("npm", "run-script");

        let Some(command) = command.map(str::trim).filter(|command| !command.is_empty()) else {
            self.dispatcher
                .log()
                .verbose("No build command was provided.");
            return Ok(Vec::new());
        };

        Sequence::new()
            .then(Operation::builtin(Builtin::Rm, ["-rf", dir]))
            .then(Operation::builtin(Builtin::Mkdir, ["-p", dir]))
            .then(self.dispatcher.resolve(command, Vec::<String>::new()))
            .run(&self.dispatcher)
            .await
    }

    /// `npm publish` the configured `publish_path`, else `path`, else the
    /// current directory. Empty paths count as absent.
    pub async fn npm_publish(&self, path: Option<&str>) -> Result<Outcome, DispatchError> {
        self.track("npm", "publish");

        let policy = self.dispatcher.policy();
        let target = policy
            .options()
            .publish_path
            .as_deref()
            .filter(|configured| !configured.is_empty())
            .or(path.filter(|path| !path.is_empty()))
            .unwrap_or(".")
            .to_owned();
        let operation = Operation::command_line(["npm", "publish", target.as_str()]);
        self.dispatcher.run_with(&policy, operation).await
    }

    /// Copy the files matching `patterns` into `target`. Under dry-run the
    /// copier is never called.
    pub async fn copy(
        &self,
        patterns: &[String],
        options: &CopyOptions,
        target: &Path,
    ) -> Result<Outcome, DispatchError> {
        let line = format!(
            "copy {} {options} {}",
            patterns.join(" "),
            target.display()
        );
        self.dispatcher.log().execution(&line);

        if self.dispatcher.policy().is_dry_run() {
            return Ok(Outcome::DryRun);
        }

        let working_dir = self.working_dir();
        let options = match &options.cwd {
            Some(cwd) => CopyOptions::with_cwd(resolve_against(&working_dir, cwd)),
            None => CopyOptions::with_cwd(working_dir.clone()),
        };
        let target = resolve_against(&working_dir, target);
        let copied = self
            .copier
            .copy(patterns, &options, &target)
            .await
            .map_err(|source| DispatchError::capability(line, source))?;

        Ok(Outcome::Value(Value::Array(
            copied
                .iter()
                .map(|path| Value::String(path.display().to_string()))
                .collect(),
        )))
    }

    /// Set `version` in every target manifest. Never fails: each file is
    /// reported as bumped or skipped.
    pub async fn bump(
        &self,
        targets: impl Into<ManifestTargets>,
        version: &str,
    ) -> Vec<BumpOutcome> {
        let targets = targets.into();
        let log = self.dispatcher.log();
        let files = targets
            .paths()
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>();
        log.execution(&format!("bump {} {version}", files.join(" ")));

        if self.dispatcher.policy().is_dry_run() {
            return manifest::dry_run_outcomes(targets);
        }

        let base_dir = self.working_dir();
        manifest::bump_all(targets, version, &base_dir, log.as_ref()).await
    }

    fn track(&self, category: &str, action: &str) {
        if let Err(err) = self.tracker.record(&UsageEvent::new(category, action)) {
            tracing::debug!(error = %err, "failed to record usage event");
        }
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("dispatcher", &self.dispatcher)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}
