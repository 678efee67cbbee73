//! Mixin chain for ordered cross-cutting hooks.

use crate::errors::{HookResult, MvcError};
use crate::state::ExecutionState;
use async_trait::async_trait;
use futures::future::join_all;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// A stateless cross-cutting extension attached to a controller type.
///
/// Every hook receives the shared [`ExecutionState`] as its only conduit
/// for data. The same mixin value may be attached several times and shared
/// between unrelated controller types, so implementations must not keep
/// per-request data in their own fields.
#[async_trait]
pub trait Mixin: Send + Sync + Debug {
    /// Returns the name of the mixin.
    fn name(&self) -> &str;

    /// Called while the controller is being constructed.
    ///
    /// Runs before any async stage; intended for seeding constant values.
    fn init(&self, _state: &ExecutionState) {}

    /// Stage 0: async initialization.
    async fn setup(&self, _state: &ExecutionState) -> HookResult {
        Ok(())
    }

    /// Stage 1: pre-action logic.
    async fn before(&self, _state: &ExecutionState) -> HookResult {
        Ok(())
    }

    /// Returns true if the mixin contributes to `full_action_name`.
    fn has_action(&self, _full_action_name: &str) -> bool {
        false
    }

    /// Runs the mixin's contribution to `full_action_name`.
    ///
    /// Only called when [`has_action`](Mixin::has_action) answers true.
    async fn action(&self, _full_action_name: &str, _state: &ExecutionState) -> HookResult {
        Ok(())
    }

    /// Stage 2: dispatches to the action-specific contribution, if any.
    async fn execute(&self, full_action_name: &str, state: &ExecutionState) -> HookResult {
        if !self.has_action(full_action_name) {
            return Ok(());
        }
        self.action(full_action_name, state).await
    }

    /// Stage 3: post-action logic.
    async fn after(&self, _state: &ExecutionState) -> HookResult {
        Ok(())
    }

    /// Teardown, called once per execution when the pipeline exits.
    async fn exit(&self, _state: &ExecutionState) -> HookResult {
        Ok(())
    }
}

/// An ordered list of mixins.
///
/// Stage runners check the exited flag before every hook and stop at the
/// first mixin that sets it. A failing hook aborts the rest of the stage.
#[derive(Debug, Clone, Default)]
pub struct MixinChain {
    mixins: Vec<Arc<dyn Mixin>>,
}

impl MixinChain {
    /// Creates a new empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self { mixins: Vec::new() }
    }

    /// Appends a mixin. Duplicates are kept and run once per occurrence.
    pub fn add(&mut self, mixin: Arc<dyn Mixin>) {
        self.mixins.push(mixin);
    }

    /// Runs every `init` hook.
    pub fn init(&self, state: &ExecutionState) {
        for mixin in &self.mixins {
            mixin.init(state);
        }
    }

    /// Runs the `setup` hooks.
    pub async fn setup(&self, state: &ExecutionState) -> HookResult {
        for mixin in &self.mixins {
            if state.is_exited() {
                break;
            }
            debug!(mixin = mixin.name(), "mixin setup");
            mixin.setup(state).await?;
        }
        Ok(())
    }

    /// Runs the `before` hooks.
    pub async fn before(&self, state: &ExecutionState) -> HookResult {
        for mixin in &self.mixins {
            if state.is_exited() {
                break;
            }
            debug!(mixin = mixin.name(), "mixin before");
            mixin.before(state).await?;
        }
        Ok(())
    }

    /// Runs the `execute` hooks for `full_action_name`.
    pub async fn execute(&self, full_action_name: &str, state: &ExecutionState) -> HookResult {
        for mixin in &self.mixins {
            if state.is_exited() {
                break;
            }
            debug!(mixin = mixin.name(), action = full_action_name, "mixin execute");
            mixin.execute(full_action_name, state).await?;
        }
        Ok(())
    }

    /// Runs the `after` hooks.
    pub async fn after(&self, state: &ExecutionState) -> HookResult {
        for mixin in &self.mixins {
            if state.is_exited() {
                break;
            }
            debug!(mixin = mixin.name(), "mixin after");
            mixin.after(state).await?;
        }
        Ok(())
    }

    /// Runs every `exit` hook concurrently and waits for all of them.
    ///
    /// Returns the failures, paired with the failing mixin's name.
    pub async fn exit(&self, state: &ExecutionState) -> Vec<(String, MvcError)> {
        let results = join_all(self.mixins.iter().map(|mixin| mixin.exit(state))).await;

        self.mixins
            .iter()
            .zip(results)
            .filter_map(|(mixin, result)| result.err().map(|err| (mixin.name().to_string(), err)))
            .collect()
    }

    /// Returns the mixin names in attachment order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.mixins.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of mixins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mixins.len()
    }

    /// Returns true if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }
}

impl FromIterator<Arc<dyn Mixin>> for MixinChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Mixin>>>(iter: I) -> Self {
        Self {
            mixins: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct CountingMixin {
        name: String,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl CountingMixin {
        fn new(name: &str, calls: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Mixin> {
            Arc::new(Self {
                name: name.to_string(),
                calls: calls.clone(),
            })
        }
    }

    #[async_trait]
    impl Mixin for CountingMixin {
        fn name(&self) -> &str {
            &self.name
        }

        async fn before(&self, _state: &ExecutionState) -> HookResult {
            self.calls.lock().push(format!("{}.before", self.name));
            Ok(())
        }

        async fn exit(&self, _state: &ExecutionState) -> HookResult {
            self.calls.lock().push(format!("{}.exit", self.name));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct StopMixin;

    #[async_trait]
    impl Mixin for StopMixin {
        fn name(&self) -> &str {
            "stop"
        }

        async fn before(&self, state: &ExecutionState) -> HookResult {
            state.exit(503);
            Ok(())
        }

        async fn exit(&self, _state: &ExecutionState) -> HookResult {
            Err(MvcError::action("teardown failed"))
        }
    }

    #[derive(Debug)]
    struct ActionMixin;

    #[async_trait]
    impl Mixin for ActionMixin {
        fn name(&self) -> &str {
            "action"
        }

        fn has_action(&self, full_action_name: &str) -> bool {
            full_action_name == "action_test2"
        }

        async fn action(&self, _full_action_name: &str, state: &ExecutionState) -> HookResult {
            state.set("name", "hello 2");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_chain_creation() {
        let chain = MixinChain::new();
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_chain_keeps_attachment_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MixinChain::new();
        chain.add(CountingMixin::new("b", &calls));
        chain.add(CountingMixin::new("a", &calls));
        chain.add(CountingMixin::new("b", &calls));

        assert_eq!(chain.names(), vec!["b", "a", "b"]);

        let state = ExecutionState::new();
        chain.before(&state).await.unwrap();
        assert_eq!(*calls.lock(), vec!["b.before", "a.before", "b.before"]);
    }

    #[tokio::test]
    async fn test_chain_stops_at_exit() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain: MixinChain = vec![
            CountingMixin::new("first", &calls),
            Arc::new(StopMixin) as Arc<dyn Mixin>,
            CountingMixin::new("last", &calls),
        ]
        .into_iter()
        .collect();

        let state = ExecutionState::new();
        chain.before(&state).await.unwrap();

        assert_eq!(*calls.lock(), vec!["first.before"]);
        assert_eq!(state.status(), 503);
    }

    #[tokio::test]
    async fn test_exit_runs_every_hook_and_collects_failures() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain: MixinChain = vec![
            CountingMixin::new("first", &calls),
            Arc::new(StopMixin) as Arc<dyn Mixin>,
            CountingMixin::new("last", &calls),
        ]
        .into_iter()
        .collect();

        let failures = chain.exit(&ExecutionState::new()).await;

        assert_eq!(calls.lock().len(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "stop");
    }

    #[tokio::test]
    async fn test_default_execute_dispatches_by_action_name() {
        let chain: MixinChain = std::iter::once(Arc::new(ActionMixin) as Arc<dyn Mixin>).collect();
        let state = ExecutionState::new();

        chain.execute("action_test1", &state).await.unwrap();
        assert!(state.get("name").is_none());

        chain.execute("action_test2", &state).await.unwrap();
        assert_eq!(state.get_str("name"), Some("hello 2".to_string()));
    }
}
