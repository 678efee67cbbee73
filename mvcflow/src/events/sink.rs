//! Destinations for controller lifecycle events.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, Level};

/// One recorded lifecycle event: its type and optional payload.
pub type RecordedEvent = (String, Option<Value>);

/// Receives the lifecycle events a controller emits during `execute`.
///
/// Event types are dotted names such as `controller.exited`; payloads are
/// JSON objects describing the controller, action and outcome.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers an event, awaiting the sink.
    async fn emit(&self, event_type: &str, data: Option<Value>);

    /// Delivers an event from synchronous code.
    ///
    /// The controller calls this on its hot path, so implementations
    /// swallow their own failures.
    fn try_emit(&self, event_type: &str, data: Option<Value>);
}

/// Drops every event. Used when no sink is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Writes each event as a `tracing` record.
///
/// Levels other than `DEBUG` are written at `INFO`.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggingEventSink {
    /// Creates a sink writing at `level`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a sink writing at `DEBUG`.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn write(&self, event_type: &str, data: Option<&Value>) {
        if self.level == Level::DEBUG {
            debug!(event_type, event_data = ?data, "controller event");
        } else {
            info!(event_type, event_data = ?data, "controller event");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.write(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.write(event_type, data.as_ref());
    }
}

/// Keeps events in memory so tests can assert on the lifecycle.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    recorded: Mutex<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.recorded.lock().clone()
    }

    /// Returns the recorded event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.recorded
            .lock()
            .iter()
            .map(|(event_type, _)| event_type.clone())
            .collect()
    }

    /// Returns the recorded events whose type starts with `prefix`.
    #[must_use]
    pub fn events_of_type(&self, prefix: &str) -> Vec<RecordedEvent> {
        self.recorded
            .lock()
            .iter()
            .filter(|(event_type, _)| event_type.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recorded.lock().len()
    }

    /// True until the first event arrives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recorded.lock().is_empty()
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.recorded.lock().clear();
    }

    fn record(&self, event_type: &str, data: Option<Value>) {
        self.recorded.lock().push((event_type.to_string(), data));
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_sink_accepts_events() {
        let sink = NoOpEventSink;
        sink.emit("controller.completed", None).await;
        sink.try_emit("controller.exited", Some(json!({"status": 404})));
    }

    #[tokio::test]
    async fn test_logging_sink_at_both_levels() {
        LoggingEventSink::debug()
            .emit("controller.exited", Some(json!({"status": 404})))
            .await;
        LoggingEventSink::default().try_emit("controller.completed", None);
    }

    #[tokio::test]
    async fn test_collecting_sink_keeps_emission_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("controller.stage.started", Some(json!({"stage": "setup"})))
            .await;
        sink.try_emit("controller.exited", Some(json!({"status": 503})));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.event_types(),
            vec!["controller.stage.started", "controller.exited"]
        );
        assert_eq!(
            sink.events_of_type("controller.exited"),
            vec![(
                "controller.exited".to_string(),
                Some(json!({"status": 503}))
            )]
        );

        sink.clear();
        assert!(sink.events().is_empty());
    }
}
