use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::Value;

use crate::builtins::{self, DirectoryState};
use crate::pipe;

/// Future returned by every [`ProcessCapability`] entry point.
pub type CapabilityFuture<T> = BoxFuture<'static, Result<T>>;

/// Named operations a capability implements directly instead of handing
/// them to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Pushd,
    Popd,
    Cd,
    Pwd,
    Rm,
    Mkdir,
}

impl Builtin {
    pub const ALL: [Self; 6] = [
        Self::Pushd,
        Self::Popd,
        Self::Cd,
        Self::Pwd,
        Self::Rm,
        Self::Mkdir,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pushd => "pushd",
            Self::Popd => "popd",
            Self::Cd => "cd",
            Self::Pwd => "pwd",
            Self::Rm => "rm",
            Self::Mkdir => "mkdir",
        }
    }

    /// Exact, case-sensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.as_str() == name)
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Builtin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).with_context(|| format!("unknown built-in `{s}`"))
    }
}

/// Shell family used to execute command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Unix,
    Windows,
}

impl ShellKind {
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    pub(crate) fn command(self, command_line: &str) -> tokio::process::Command {
        match self {
            Self::Unix => {
                let mut command = tokio::process::Command::new("sh");
                command.arg("-c").arg(command_line);
                command
            }
            Self::Windows => {
                let mut command = tokio::process::Command::new("powershell");
                command
                    .arg("-NoProfile")
                    .arg("-NonInteractive")
                    .arg("-Command")
                    .arg(command_line);
                command
            }
        }
    }
}

/// Exit code and combined stdout/stderr of a generic execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn new(code: i32, output: impl Into<String>) -> Self {
        Self {
            code,
            output: output.into(),
        }
    }

    pub fn success(output: impl Into<String>) -> Self {
        Self::new(0, output)
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// The process-level collaborator the dispatcher drives.
///
/// `builtin` and `exec` must read the silence flag (and any other state
/// they depend on) when they are called, not when the returned future is
/// first polled: the dispatcher restores the flag as soon as the call
/// returns.
pub trait ProcessCapability: Send + Sync {
    /// The built-in registered under `name`, if this capability has one.
    fn lookup_builtin(&self, name: &str) -> Option<Builtin> {
        Builtin::from_name(name)
    }

    fn is_builtin(&self, name: &str) -> bool {
        self.lookup_builtin(name).is_some()
    }

    fn builtin(&self, builtin: Builtin, args: &[String]) -> CapabilityFuture<Value>;

    /// Run a full command line and capture its exit code and combined output.
    fn exec(&self, command_line: &str) -> CapabilityFuture<CommandOutput>;

    fn is_silent(&self) -> bool;

    fn set_silent(&self, silent: bool);

    /// Directory relative paths resolve against, when the capability keeps one.
    fn working_dir(&self) -> Option<PathBuf> {
        None
    }
}

impl<T: ProcessCapability + ?Sized> ProcessCapability for Arc<T> {
    fn lookup_builtin(&self, name: &str) -> Option<Builtin> {
        (**self).lookup_builtin(name)
    }

    fn builtin(&self, builtin: Builtin, args: &[String]) -> CapabilityFuture<Value> {
        (**self).builtin(builtin, args)
    }

    fn exec(&self, command_line: &str) -> CapabilityFuture<CommandOutput> {
        (**self).exec(command_line)
    }

    fn is_silent(&self) -> bool {
        (**self).is_silent()
    }

    fn set_silent(&self, silent: bool) {
        (**self).set_silent(silent);
    }

    fn working_dir(&self) -> Option<PathBuf> {
        (**self).working_dir()
    }
}

/// Executes command lines through the system shell and implements the
/// built-ins against the filesystem.
///
/// The capability tracks its own working directory and directory stack;
/// `pushd`, `popd` and `cd` move it, and every other operation resolves
/// relative paths against it. The process-wide current directory is never
/// changed.
#[derive(Debug, Clone)]
pub struct ShellProcess {
    shell: ShellKind,
    state: Arc<Mutex<DirectoryState>>,
    silent: Arc<AtomicBool>,
}

impl ShellProcess {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell: ShellKind::detect(),
            state: Arc::new(Mutex::new(DirectoryState::new(working_dir.into()))),
            silent: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read the current directory")?;
        Ok(Self::new(cwd))
    }

    pub fn with_shell(mut self, shell: ShellKind) -> Self {
        self.shell = shell;
        self
    }

    pub fn shell(&self) -> ShellKind {
        self.shell
    }

    pub fn current_dir(&self) -> PathBuf {
        self.state.lock().cwd().to_path_buf()
    }

    /// Directories saved by `pushd`, most recent first.
    pub fn dir_stack(&self) -> Vec<PathBuf> {
        self.state.lock().saved().to_vec()
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        relsh_commons::resolve_against(self.state.lock().cwd(), path)
    }
}

impl ProcessCapability for ShellProcess {
    fn builtin(&self, builtin: Builtin, args: &[String]) -> CapabilityFuture<Value> {
        let state = Arc::clone(&self.state);
        let args = args.to_vec();
        let silent = self.is_silent();
        async move { builtins::invoke(builtin, &state, args, silent).await }.boxed()
    }

    fn exec(&self, command_line: &str) -> CapabilityFuture<CommandOutput> {
        let shell = self.shell;
        let cwd = self.current_dir();
        let command_line = command_line.to_owned();
        let silent = self.is_silent();
        async move { pipe::run_command_line(shell, &cwd, &command_line, silent).await }.boxed()
    }

    fn is_silent(&self) -> bool {
        self.silent.load(Ordering::SeqCst)
    }

    fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }

    fn working_dir(&self) -> Option<PathBuf> {
        Some(self.current_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_exact() {
        assert_eq!(Builtin::from_name("pushd"), Some(Builtin::Pushd));
        assert_eq!(Builtin::from_name("mkdir"), Some(Builtin::Mkdir));
        assert_eq!(Builtin::from_name("MKDIR"), None);
        assert_eq!(Builtin::from_name("mkdir -p"), None);
        assert_eq!(Builtin::from_name("npm"), None);
        assert!("exec".parse::<Builtin>().is_err());
    }

    #[test]
    fn silence_flag_is_shared_between_clones() {
        let process = ShellProcess::new("/tmp");
        let clone = process.clone();
        assert!(!clone.is_silent());
        process.set_silent(true);
        assert!(clone.is_silent());
    }

    #[test]
    fn resolves_relative_paths_against_working_dir() {
        let process = ShellProcess::new("/work/project");
        assert_eq!(process.resolve("dist"), PathBuf::from("/work/project/dist"));
        assert_eq!(process.resolve("../other"), PathBuf::from("/work/other"));
    }

    #[test]
    fn command_output_success_tracks_code() {
        assert!(CommandOutput::success("ok").is_success());
        assert!(!CommandOutput::new(2, "boom").is_success());
    }
}
