//! Mock mixins for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::controller::Stage;
use crate::errors::{HookResult, MvcError};
use crate::mixins::Mixin;
use crate::state::ExecutionState;

/// A mixin that records every hook call as `<name>.<hook>`.
///
/// Several recorders may share one log to observe ordering across mixins.
#[derive(Debug)]
pub struct RecordingMixin {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingMixin {
    /// Creates a recorder with its own log.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_log(name, Arc::new(Mutex::new(Vec::new())))
    }

    /// Creates a recorder writing to a shared log.
    #[must_use]
    pub fn with_log(name: impl Into<String>, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }

    /// Returns the recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Returns how often `hook` was recorded for this mixin.
    #[must_use]
    pub fn call_count(&self, hook: &str) -> usize {
        let entry = format!("{}.{hook}", self.name);
        self.log.lock().iter().filter(|call| **call == entry).count()
    }

    /// Clears the log.
    pub fn reset(&self) {
        self.log.lock().clear();
    }

    fn record(&self, hook: &str) {
        self.log.lock().push(format!("{}.{hook}", self.name));
    }
}

#[async_trait]
impl Mixin for RecordingMixin {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, _state: &ExecutionState) {
        self.record("init");
    }

    async fn setup(&self, _state: &ExecutionState) -> HookResult {
        self.record("setup");
        Ok(())
    }

    async fn before(&self, _state: &ExecutionState) -> HookResult {
        self.record("before");
        Ok(())
    }

    async fn execute(&self, full_action_name: &str, _state: &ExecutionState) -> HookResult {
        self.record(&format!("execute:{full_action_name}"));
        Ok(())
    }

    async fn after(&self, _state: &ExecutionState) -> HookResult {
        self.record("after");
        Ok(())
    }

    async fn exit(&self, _state: &ExecutionState) -> HookResult {
        self.record("exit");
        Ok(())
    }
}

/// A mixin that calls `exit(status)` during one stage.
#[derive(Debug)]
pub struct ExitingMixin {
    stage: Stage,
    status: u16,
    exit_calls: AtomicUsize,
}

impl ExitingMixin {
    /// Creates a mixin exiting with `status` during `stage`.
    #[must_use]
    pub fn new(stage: Stage, status: u16) -> Self {
        Self {
            stage,
            status,
            exit_calls: AtomicUsize::new(0),
        }
    }

    /// Returns how often the exit hook ran.
    #[must_use]
    pub fn exit_calls(&self) -> usize {
        self.exit_calls.load(Ordering::SeqCst)
    }

    fn exit_during(&self, stage: Stage, state: &ExecutionState) {
        if self.stage == stage {
            state.exit(self.status);
        }
    }
}

#[async_trait]
impl Mixin for ExitingMixin {
    fn name(&self) -> &str {
        "exiting"
    }

    async fn setup(&self, state: &ExecutionState) -> HookResult {
        self.exit_during(Stage::Setup, state);
        Ok(())
    }

    async fn before(&self, state: &ExecutionState) -> HookResult {
        self.exit_during(Stage::Before, state);
        Ok(())
    }

    async fn execute(&self, _full_action_name: &str, state: &ExecutionState) -> HookResult {
        self.exit_during(Stage::Action, state);
        Ok(())
    }

    async fn after(&self, state: &ExecutionState) -> HookResult {
        self.exit_during(Stage::After, state);
        Ok(())
    }

    async fn exit(&self, _state: &ExecutionState) -> HookResult {
        self.exit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A mixin that fails during one stage.
#[derive(Debug)]
pub struct FailingMixin {
    stage: Stage,
    message: Option<String>,
}

impl FailingMixin {
    /// Creates a mixin failing with `message` during `stage`.
    #[must_use]
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: Some(message.into()),
        }
    }

    /// Creates a mixin failing without a message.
    #[must_use]
    pub const fn unspecified(stage: Stage) -> Self {
        Self {
            stage,
            message: None,
        }
    }

    fn fail_during(&self, stage: Stage) -> HookResult {
        if self.stage != stage {
            return Ok(());
        }
        match &self.message {
            Some(message) => Err(MvcError::action(message.clone())),
            None => Err(MvcError::Unspecified),
        }
    }
}

#[async_trait]
impl Mixin for FailingMixin {
    fn name(&self) -> &str {
        "failing"
    }

    async fn setup(&self, _state: &ExecutionState) -> HookResult {
        self.fail_during(Stage::Setup)
    }

    async fn before(&self, _state: &ExecutionState) -> HookResult {
        self.fail_during(Stage::Before)
    }

    async fn execute(&self, _full_action_name: &str, _state: &ExecutionState) -> HookResult {
        self.fail_during(Stage::Action)
    }

    async fn after(&self, _state: &ExecutionState) -> HookResult {
        self.fail_during(Stage::After)
    }
}

/// A mixin that writes one state entry during one stage.
#[derive(Debug)]
pub struct StateWriterMixin {
    name: String,
    stage: Stage,
    key: String,
    value: Value,
}

impl StateWriterMixin {
    /// Creates a mixin writing `key = value` during `stage`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        stage: Stage,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            stage,
            key: key.into(),
            value: value.into(),
        }
    }

    fn write_during(&self, stage: Stage, state: &ExecutionState) {
        if self.stage == stage {
            state.set(self.key.clone(), self.value.clone());
        }
    }
}

#[async_trait]
impl Mixin for StateWriterMixin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self, state: &ExecutionState) -> HookResult {
        self.write_during(Stage::Setup, state);
        Ok(())
    }

    async fn before(&self, state: &ExecutionState) -> HookResult {
        self.write_during(Stage::Before, state);
        Ok(())
    }

    async fn execute(&self, _full_action_name: &str, state: &ExecutionState) -> HookResult {
        self.write_during(Stage::Action, state);
        Ok(())
    }

    async fn after(&self, state: &ExecutionState) -> HookResult {
        self.write_during(Stage::After, state);
        Ok(())
    }
}

/// A mixin that sleeps in `before` and in `exit`.
#[derive(Debug)]
pub struct SlowMixin {
    delay: Duration,
}

impl SlowMixin {
    /// Creates a slow mixin.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Mixin for SlowMixin {
    fn name(&self) -> &str {
        "slow"
    }

    async fn before(&self, _state: &ExecutionState) -> HookResult {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn exit(&self, _state: &ExecutionState) -> HookResult {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_mixin_shared_log() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = RecordingMixin::with_log("a", log.clone());
        let b = RecordingMixin::with_log("b", log);
        let state = ExecutionState::new();

        a.before(&state).await.unwrap();
        b.before(&state).await.unwrap();
        a.exit(&state).await.unwrap();

        assert_eq!(a.calls(), vec!["a.before", "b.before", "a.exit"]);
        assert_eq!(a.call_count("before"), 1);
        assert_eq!(b.call_count("exit"), 0);

        a.reset();
        assert!(b.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exiting_mixin() {
        let mixin = ExitingMixin::new(Stage::After, 503);
        let state = ExecutionState::new();

        mixin.before(&state).await.unwrap();
        assert!(!state.is_exited());
        mixin.after(&state).await.unwrap();
        assert!(state.is_exited());
        assert_eq!(state.status(), 503);
    }

    #[tokio::test]
    async fn test_failing_mixin() {
        let state = ExecutionState::new();
        let err = FailingMixin::new(Stage::Setup, "boom")
            .setup(&state)
            .await
            .unwrap_err();
        assert_eq!(err.message(), Some("boom".to_string()));

        let err = FailingMixin::unspecified(Stage::After)
            .after(&state)
            .await
            .unwrap_err();
        assert!(matches!(err, MvcError::Unspecified));
    }

    #[tokio::test]
    async fn test_state_writer_mixin() {
        let mixin = StateWriterMixin::new("writer", Stage::Action, "foo", "bar");
        let state = ExecutionState::new();
        mixin.execute("action_index", &state).await.unwrap();
        assert_eq!(state.get_str("foo"), Some("bar".to_string()));
    }
}
