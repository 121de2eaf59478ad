use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A lightweight sink used to record telemetry events emitted by the harness.
/// The `Event` type is generic so hosts can supply their own schema; the
/// shell facade emits [`UsageEvent`]s.
pub trait TelemetrySink<Event>: Send + Sync {
    /// Record an event produced by the component.
    fn record(&self, event: &Event) -> Result<()>;

    /// Flush any buffered telemetry data to its destination.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// A telemetry sink that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl<Event> TelemetrySink<Event> for NoopTelemetry {
    fn record(&self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

/// Usage-tracking event: which workflow ran, grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageEvent {
    pub category: String,
    pub action: String,
}

impl UsageEvent {
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
        }
    }
}
