//! In-memory adapters for the commons traits. Hosts that have no logging or
//! telemetry backend yet, and the test suites, use these to capture what the
//! harness reported.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

use crate::logging::ExecutionLog;
use crate::telemetry::TelemetrySink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Execution,
    Verbose,
    Warn,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// [`ExecutionLog`] that keeps every entry in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Messages logged at `level`, oldest first.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.clone())
            .collect()
    }

    fn push(&self, level: LogLevel, message: String) {
        self.entries.lock().push(LogEntry { level, message });
    }
}

impl ExecutionLog for MemoryLog {
    fn execution(&self, line: &str) {
        self.push(LogLevel::Execution, line.to_owned());
    }

    fn verbose(&self, message: &str) {
        self.push(LogLevel::Verbose, message.to_owned());
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message.to_owned());
    }

    fn debug(&self, detail: &dyn fmt::Display) {
        self.push(LogLevel::Debug, detail.to_string());
    }
}

/// Telemetry sink that buffers events in memory.
#[derive(Debug, Clone)]
pub struct MemoryTelemetry<Event> {
    events: Arc<Mutex<Vec<Event>>>,
}

impl<Event> Default for MemoryTelemetry<Event> {
    fn default() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<Event: Clone> MemoryTelemetry<Event> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl<Event: Clone + Send + Sync> TelemetrySink<Event> for MemoryTelemetry<Event> {
    fn record(&self, event: &Event) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
