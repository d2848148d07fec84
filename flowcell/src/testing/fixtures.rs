//! Test fixtures: recording sinks and tracing setup.

use crate::events::EventSink;
use async_trait::async_trait;
use parking_lot::RwLock;

/// An event sink that records every event it receives, for assertions.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl RecordingEventSink {
    /// Creates a new recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns events whose type starts with `type_prefix`.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

/// Installs a compact tracing subscriber honoring `RUST_LOG`, routed to
/// the test writer. Safe to call from multiple tests; only the first call
/// installs.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_captures_events() {
        let sink = RecordingEventSink::new();
        assert!(sink.is_empty());

        sink.try_emit("one", None);
        tokio_test::block_on(sink.emit("two", Some(serde_json::json!({"k": 1}))));

        assert_eq!(sink.len(), 2);
        let events = sink.events();
        assert_eq!(events[0].0, "one");
        assert_eq!(events[1].0, "two");
    }

    #[test]
    fn test_recording_sink_filters_by_prefix() {
        let sink = RecordingEventSink::new();
        sink.try_emit("pipeline.run.started", None);
        sink.try_emit("pipeline.run.completed", None);
        sink.try_emit("pipeline.lazy.resolved", None);

        assert_eq!(sink.events_of_type("pipeline.run.").len(), 2);
        assert_eq!(sink.events_of_type("pipeline.lazy.").len(), 1);
    }

    #[test]
    fn test_recording_sink_clear() {
        let sink = RecordingEventSink::new();
        sink.try_emit("event", None);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
    }
}
