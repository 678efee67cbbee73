//! The controller's own overridable hooks and actions.

use crate::errors::HookResult;
use crate::state::ExecutionState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;

/// Prefix turning an action name into its identifier.
pub const ACTION_PREFIX: &str = "action_";
/// Action run when neither the caller nor the route names one.
pub const DEFAULT_ACTION: &str = "index";
/// Identifier of the default action.
pub const INDEX_ACTION: &str = "action_index";

/// Formats the identifier of an action name.
#[must_use]
pub fn full_action_name(action: &str) -> String {
    format!("{ACTION_PREFIX}{action}")
}

/// The controller-level hooks and the action table.
///
/// Every controller answers [`INDEX_ACTION`] with a no-op unless the
/// implementation says otherwise. The set of actions is fixed by the
/// implementation; nothing can be patched in at runtime.
#[async_trait]
pub trait ActionHandler: Send {
    /// Returns true if the controller has an action with this identifier.
    fn has_action(&self, full_action_name: &str) -> bool {
        full_action_name == INDEX_ACTION
    }

    /// Stage 1, after the mixins' `before` hooks.
    async fn before(&mut self, _state: &ExecutionState) -> HookResult {
        Ok(())
    }

    /// Stage 2, after the mixins' `execute` hooks: runs the action.
    async fn invoke(&mut self, _full_action_name: &str, _state: &ExecutionState) -> HookResult {
        Ok(())
    }

    /// Stage 3, after the mixins' `after` hooks.
    async fn after(&mut self, _state: &ExecutionState) -> HookResult {
        Ok(())
    }

    /// Called once the mixins' `exit` hooks have completed.
    async fn on_exit(&mut self, _state: &ExecutionState) -> HookResult {
        Ok(())
    }
}

/// Handler of the base controller: only the no-op index action.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseActions;

impl ActionHandler for BaseActions {}

type SyncAction = Box<dyn Fn(&ExecutionState) -> HookResult + Send + Sync>;

/// A handler built from synchronous closures keyed by action name.
#[derive(Default)]
pub struct ActionTable {
    actions: HashMap<String, SyncAction>,
}

impl ActionTable {
    /// Creates a table answering only the no-op index action.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action` under `name` (without the `action_` prefix).
    #[must_use]
    pub fn with_action<F>(mut self, name: &str, action: F) -> Self
    where
        F: Fn(&ExecutionState) -> HookResult + Send + Sync + 'static,
    {
        self.actions.insert(full_action_name(name), Box::new(action));
        self
    }

    /// Returns the registered identifiers.
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Debug for ActionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionTable")
            .field("actions", &self.action_names())
            .finish()
    }
}

#[async_trait]
impl ActionHandler for ActionTable {
    fn has_action(&self, full_action_name: &str) -> bool {
        full_action_name == INDEX_ACTION || self.actions.contains_key(full_action_name)
    }

    async fn invoke(&mut self, full_action_name: &str, state: &ExecutionState) -> HookResult {
        match self.actions.get(full_action_name) {
            Some(action) => action(state),
            None => Ok(()),
        }
    }
}
