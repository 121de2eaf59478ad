use std::fmt;

/// Logging surface the harness reports through. Every call is fire and
/// forget; nothing downstream depends on a return value.
pub trait ExecutionLog: Send + Sync {
    /// A command line that is about to run (or would run, under dry-run).
    fn execution(&self, line: &str);

    /// Chatty progress information only interesting in verbose mode.
    fn verbose(&self, message: &str);

    fn warn(&self, message: &str);

    /// Low-level detail, typically the underlying error of a warning.
    fn debug(&self, detail: &dyn fmt::Display);
}

/// Forwards the logging surface to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ExecutionLog for TracingLog {
    fn execution(&self, line: &str) {
        tracing::info!(target: "relsh::execution", "{line}");
    }

    fn verbose(&self, message: &str) {
        tracing::debug!(target: "relsh::verbose", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "relsh", "{message}");
    }

    fn debug(&self, detail: &dyn fmt::Display) {
        tracing::debug!(target: "relsh", detail = %detail);
    }
}
