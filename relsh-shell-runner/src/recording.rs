//! A [`ProcessCapability`] that records calls instead of running them.
//!
//! Useful to preview what a workflow would do and as a test double: every
//! call is logged together with the silence flag observed when it was
//! initiated, and exit codes or built-in failures can be scripted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{self, FutureExt};
use parking_lot::Mutex;
use serde_json::Value;

use crate::executor::{Builtin, CapabilityFuture, CommandOutput, ProcessCapability};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedKind {
    Builtin(Builtin),
    Exec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: RecordedKind,
    /// Command line as a shell would see it.
    pub line: String,
    /// Silence flag at the moment the call was initiated.
    pub silent: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingProcess {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    exits: Arc<Mutex<HashMap<String, CommandOutput>>>,
    builtin_failures: Arc<Mutex<HashMap<Builtin, String>>>,
    disabled: HashSet<Builtin>,
    silent: Arc<AtomicBool>,
}

impl RecordingProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command_line` exit with `code`, producing `output`.
    pub fn with_exit(self, command_line: impl Into<String>, code: i32, output: &str) -> Self {
        self.exits
            .lock()
            .insert(command_line.into(), CommandOutput::new(code, output));
        self
    }

    /// Make every call to `builtin` fail with `message`.
    pub fn with_builtin_failure(self, builtin: Builtin, message: impl Into<String>) -> Self {
        self.builtin_failures.lock().insert(builtin, message.into());
        self
    }

    /// Stop recognizing `builtin`, so its name falls through to execution.
    pub fn without_builtin(mut self, builtin: Builtin) -> Self {
        self.disabled.insert(builtin);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.lock().iter().map(|call| call.line.clone()).collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, kind: RecordedKind, line: String) {
        self.calls.lock().push(RecordedCall {
            kind,
            line,
            silent: self.is_silent(),
        });
    }
}

impl ProcessCapability for RecordingProcess {
    fn lookup_builtin(&self, name: &str) -> Option<Builtin> {
        Builtin::from_name(name).filter(|builtin| !self.disabled.contains(builtin))
    }

    fn builtin(&self, builtin: Builtin, args: &[String]) -> CapabilityFuture<Value> {
        let line = std::iter::once(builtin.as_str().to_owned())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.record(RecordedKind::Builtin(builtin), line);

        let result = match self.builtin_failures.lock().get(&builtin) {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(Value::Bool(true)),
        };
        future::ready(result).boxed()
    }

    fn exec(&self, command_line: &str) -> CapabilityFuture<CommandOutput> {
        self.record(RecordedKind::Exec, command_line.to_owned());
        let output = self
            .exits
            .lock()
            .get(command_line)
            .cloned()
            .unwrap_or_else(|| CommandOutput::success(""));
        future::ready(Ok(output)).boxed()
    }

    fn is_silent(&self) -> bool {
        self.silent.load(Ordering::SeqCst)
    }

    fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }
}
