//! Shared traits and helper types reused across the relsh crates. The goal
//! is to keep the dispatcher in `relsh-shell-runner` decoupled from the
//! configuration loader and from whichever logging or telemetry backend the
//! host application wires in, while still sharing common contracts.
//!
//! The [`reference`] module carries in-memory adapters that tests and
//! downstream consumers can use to observe what the harness reported.

pub mod logging;
pub mod paths;
pub mod policy;
pub mod reference;
pub mod telemetry;

pub use logging::{ExecutionLog, TracingLog};
pub use paths::{normalize_path, resolve_against};
pub use policy::{ExecutionPolicy, PolicySource, ReleaseOptions, StaticPolicy};
pub use reference::{LogEntry, LogLevel, MemoryLog, MemoryTelemetry};
pub use telemetry::{NoopTelemetry, TelemetrySink, UsageEvent};
