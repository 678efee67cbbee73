//! Tracing integration for controller executions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Attributes describing one controller execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionSpanAttributes {
    /// Controller type name.
    pub controller: String,
    /// Per-call execution ID.
    pub execution_id: Option<String>,
    /// Resolved action identifier.
    pub action: Option<String>,
    /// Final status code.
    pub status: Option<u16>,
    /// Whether the pipeline exited early.
    pub exited: Option<bool>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
}

impl ExecutionSpanAttributes {
    /// Creates attributes for a controller type.
    #[must_use]
    pub fn new(controller: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            ..Self::default()
        }
    }

    /// Sets the execution ID.
    #[must_use]
    pub fn with_execution_id(mut self, id: impl Into<String>) -> Self {
        self.execution_id = Some(id.into());
        self
    }

    /// Sets the action identifier.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Records the outcome.
    #[must_use]
    pub fn with_outcome(mut self, status: u16, exited: bool, duration_ms: f64) -> Self {
        self.status = Some(status);
        self.exited = Some(exited);
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Converts to a JSON object for event payloads.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Converts to flat OpenTelemetry-style attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("controller.name".to_string(), self.controller.clone());

        if let Some(ref v) = self.execution_id {
            attrs.insert("controller.execution_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.action {
            attrs.insert("controller.action".to_string(), v.clone());
        }
        if let Some(v) = self.status {
            attrs.insert("http.status_code".to_string(), v.to_string());
        }
        if let Some(v) = self.exited {
            attrs.insert("controller.exited".to_string(), v.to_string());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("controller.duration_ms".to_string(), format!("{v:.3}"));
        }

        attrs
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns false when a
/// global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
