//! Telemetry hook for user submissions.

/// A fire-and-forget analytics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub category: &'static str,
    pub action: &'static str,
    pub label: &'static str,
}

impl TelemetryEvent {
    /// Recorded on every user submission, before any validation.
    pub const fn sent_message() -> Self {
        Self {
            category: "Chatbot",
            action: "Sent message",
            label: "Sent message",
        }
    }
}

/// Records telemetry events. Must not block or fail the turn.
pub trait Telemetry: Send + Sync {
    fn track(&self, event: &TelemetryEvent);
}

/// Writes events to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn track(&self, event: &TelemetryEvent) {
        tracing::info!(
            target: "converse::telemetry",
            category = event.category,
            action = event.action,
            label = event.label,
            "Telemetry event"
        );
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn track(&self, _event: &TelemetryEvent) {}
}
