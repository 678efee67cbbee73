//! Event sinks for controller observability.
//!
//! Controllers emit lifecycle events (stage starts, exits, errors and
//! completion) to an [`EventSink`]. Unless a controller is given its own
//! sink it uses the process-wide one, which discards events until
//! [`set_event_sink`] installs another.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};

use parking_lot::RwLock;
use std::sync::Arc;

static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the process-wide event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the process-wide event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the process-wide event sink.
///
/// Returns a `NoOpEventSink` if no sink is set.
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_global_sink_default() {
        clear_event_sink();
        let sink = get_event_sink();
        sink.try_emit("test", None);
    }

    #[tokio::test]
    async fn test_set_and_get_sink() {
        let sink: Arc<dyn EventSink> = Arc::new(LoggingEventSink::default());
        set_event_sink(sink);

        let retrieved = get_event_sink();
        retrieved.try_emit("controller.completed", Some(serde_json::json!({"status": 200})));

        clear_event_sink();
    }
}
