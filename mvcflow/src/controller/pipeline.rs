//! The staged controller pipeline.
//!
//! One [`Controller`] serves one request record. `execute` resolves the
//! action, then runs four stages (setup, before, action, after) across the
//! attached mixins and the controller's own [`ActionHandler`]. The exited
//! flag is consulted before every hook; once it is set nothing but the
//! exit notification runs.

use super::handler::{full_action_name, ActionHandler, BaseActions, DEFAULT_ACTION};
use super::ControllerType;
use crate::errors::{HookResult, MvcError, INTERNAL_SERVER_ERROR_BODY};
use crate::events::{get_event_sink, EventSink};
use crate::observability::{ExecutionSpanAttributes, SpanTimer};
use crate::state::{keys, ExecutionState, Request, Response};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// One of the four ordered phases of an execute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Async initialization.
    Setup,
    /// Pre-action logic.
    Before,
    /// The action itself.
    Action,
    /// Post-action logic.
    After,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Before => "before",
            Self::Action => "action",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A controller instance: a sealed type, a handler and the shared state.
///
/// Concurrent execute calls on one instance are ruled out by `&mut self`.
pub struct Controller<H: ActionHandler = BaseActions> {
    class: Arc<ControllerType>,
    handler: H,
    request: Request,
    initial_state: HashMap<String, Value>,
    state: ExecutionState,
    placeholders: HashSet<String>,
    error: Option<MvcError>,
    needs_seed: bool,
    event_sink: Arc<dyn EventSink>,
}

impl Controller<BaseActions> {
    /// Creates a base controller for `request`.
    #[must_use]
    pub fn base(request: Request) -> Self {
        Self::new(Arc::new(ControllerType::base()), BaseActions, request)
    }
}

impl<H: ActionHandler> Controller<H> {
    /// Creates a controller and seeds its state from `request`.
    #[must_use]
    pub fn new(class: Arc<ControllerType>, handler: H, request: Request) -> Self {
        Self::with_initial_state(class, handler, request, HashMap::new())
    }

    /// Creates a controller whose seeded state is overlaid with
    /// `initial_state`. Overlaid values win over the derived ones.
    #[must_use]
    pub fn with_initial_state(
        class: Arc<ControllerType>,
        handler: H,
        request: Request,
        initial_state: HashMap<String, Value>,
    ) -> Self {
        let mut controller = Self {
            class,
            handler,
            request,
            initial_state,
            state: ExecutionState::new(),
            placeholders: HashSet::new(),
            error: None,
            needs_seed: true,
            event_sink: get_event_sink(),
        };
        controller.seed_state();
        controller
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the controller type.
    #[must_use]
    pub fn class(&self) -> &Arc<ControllerType> {
        &self.class
    }

    /// Returns the controller type name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Returns the request this controller was built for.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the shared state.
    #[must_use]
    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the handler mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Returns the failure captured by the last execute call.
    #[must_use]
    pub fn error(&self) -> Option<&MvcError> {
        self.error.as_ref()
    }

    /// Runs the pipeline and builds the response.
    ///
    /// `action` wins over the routed action, which wins over `index`.
    /// Unless `retain_state` is set the state is cleared before returning
    /// and rebuilt from the request on the next call.
    pub async fn execute(&mut self, action: Option<&str>, retain_state: bool) -> Response {
        self.error = None;
        self.ensure_seeded();

        let full_action = self.resolve_action(action);
        let execution_id = Uuid::new_v4().to_string();
        let timer = SpanTimer::start("controller.execute");
        let span = info_span!(
            "controller.execute",
            controller = %self.class.name(),
            execution_id = %execution_id,
            action = %full_action,
        );

        async {
            if let Err(err) = self.run_stages(&full_action).await {
                self.server_error(err).await;
            }
        }
        .instrument(span)
        .await;

        let response = self.state.to_response();
        let attributes = ExecutionSpanAttributes::new(self.class.name())
            .with_execution_id(execution_id)
            .with_action(full_action)
            .with_outcome(response.status, self.state.is_exited(), timer.finish());
        self.event_sink
            .try_emit("controller.completed", Some(attributes.to_value()));

        if !retain_state {
            self.state.reset();
            self.needs_seed = true;
        }
        response
    }

    /// Stops the pipeline with `code` and notifies every exit hook.
    pub async fn exit(&mut self, code: u16) {
        self.ensure_seeded();
        self.state.exit(code);
        self.notify_exit().await;
    }

    /// Redirects to `location` and stops the pipeline with `302`.
    pub async fn redirect(&mut self, location: &str, keep_query_string: bool) {
        self.ensure_seeded();
        self.state.redirect(location, keep_query_string);
        self.notify_exit().await;
    }

    /// Stops the pipeline with `403 / <msg>`.
    pub async fn forbidden(&mut self, msg: &str) {
        self.ensure_seeded();
        self.state.forbidden(msg);
        self.notify_exit().await;
    }

    /// Dispatches `full_action_name` to the mixins' action hooks.
    pub async fn mixins_action(&mut self, full_action_name: &str) -> HookResult {
        let class = Arc::clone(&self.class);
        class.mixins().execute(full_action_name, &self.state).await?;
        self.notify_exit().await;
        Ok(())
    }

    fn ensure_seeded(&mut self) {
        if self.needs_seed {
            self.seed_state();
        }
    }

    fn seed_state(&mut self) {
        if let Err(err) = self
            .state
            .seed(self.class.name(), &self.request, self.class.options())
        {
            warn!(error = %err, "Failed to seed execution state");
            self.error = Some(err);
        }
        for (key, value) in &self.initial_state {
            self.state.set(key.clone(), value.clone());
        }
        self.class.mixins().init(&self.state);
        self.needs_seed = false;
    }

    fn resolve_action(&self, action: Option<&str>) -> String {
        let action = action
            .filter(|name| !name.is_empty())
            .map(String::from)
            .or_else(|| self.state.get_str(keys::ACTION).filter(|name| !name.is_empty()))
            .unwrap_or_else(|| DEFAULT_ACTION.to_string());
        full_action_name(&action)
    }

    async fn run_stages(&mut self, full_action: &str) -> HookResult {
        self.state.set(keys::FULL_ACTION_NAME, full_action);
        // An exit posted by an init hook is still owed its notification.
        self.notify_exit().await;

        if !self.handler.has_action(full_action) && !self.placeholders.contains(full_action) {
            self.action_not_found(full_action).await;
        }

        let class = Arc::clone(&self.class);
        let mixins = class.mixins();

        if !self.state.is_exited() {
            self.stage_started(Stage::Setup);
            mixins.setup(&self.state).await?;
            self.notify_exit().await;
        }

        if !self.state.is_exited() {
            self.stage_started(Stage::Before);
            mixins.before(&self.state).await?;
            self.notify_exit().await;
        }
        if !self.state.is_exited() {
            self.handler.before(&self.state).await?;
            self.notify_exit().await;
        }

        if !self.state.is_exited() {
            self.stage_started(Stage::Action);
            mixins.execute(full_action, &self.state).await?;
            self.notify_exit().await;
        }
        if !self.state.is_exited() {
            if !self.placeholders.contains(full_action) {
                self.handler.invoke(full_action, &self.state).await?;
            }
            self.notify_exit().await;
        }

        if !self.state.is_exited() {
            self.stage_started(Stage::After);
            mixins.after(&self.state).await?;
            self.notify_exit().await;
        }
        if !self.state.is_exited() {
            self.handler.after(&self.state).await?;
            self.notify_exit().await;
        }

        Ok(())
    }

    async fn action_not_found(&mut self, full_action: &str) {
        if self.class.options().suppress_action_not_found {
            debug!(action = full_action, "Installing no-op action");
            self.placeholders.insert(full_action.to_string());
            return;
        }

        debug!(action = full_action, "Action not found");
        self.event_sink.try_emit(
            "controller.action_not_found",
            Some(json!({"action": full_action})),
        );
        self.state
            .set_body(format!("404 / {}::{full_action} not found", self.class.name()));
        self.exit(404).await;
    }

    async fn server_error(&mut self, err: MvcError) {
        warn!(error = %err, "Controller execution failed");
        self.event_sink
            .try_emit("controller.error", Some(json!(err.to_dict())));

        if !self.state.has_body() {
            let body = err
                .message()
                .unwrap_or_else(|| INTERNAL_SERVER_ERROR_BODY.to_string());
            self.state.set_body(body);
        }
        self.error = Some(err);
        self.exit(500).await;
    }

    fn stage_started(&self, stage: Stage) {
        debug!(stage = %stage, "Stage started");
        self.event_sink
            .try_emit("controller.stage.started", Some(json!({"stage": stage.as_str()})));
    }

    /// Delivers a pending exit to the mixins and the handler.
    async fn notify_exit(&mut self) {
        if !self.state.take_exit_request() {
            return;
        }

        let status = self.state.status();
        debug!(status, "Controller exited");
        self.event_sink
            .try_emit("controller.exited", Some(json!({"status": status})));

        let class = Arc::clone(&self.class);
        for (mixin, err) in class.mixins().exit(&self.state).await {
            warn!(mixin = %mixin, error = %err, "Mixin exit hook failed");
            self.record_teardown_error(err);
        }

        if let Err(err) = self.handler.on_exit(&self.state).await {
            warn!(error = %err, "Controller exit hook failed");
            self.record_teardown_error(err);
        }
    }

    fn record_teardown_error(&mut self, err: MvcError) {
        self.event_sink
            .try_emit("controller.error", Some(json!(err.to_dict())));
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

impl<H: ActionHandler> fmt::Debug for Controller<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("class", &self.class.name())
            .field("state_keys", &self.state.len())
            .field("exited", &self.state.is_exited())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Setup.to_string(), "setup");
        assert_eq!(Stage::After.as_str(), "after");
    }

    #[test]
    fn test_resolve_action() {
        let controller = Controller::base(Request::new());
        assert_eq!(controller.resolve_action(None), "action_index");
        assert_eq!(controller.resolve_action(Some("")), "action_index");
        assert_eq!(controller.resolve_action(Some("foo")), "action_foo");

        let routed = Controller::base(Request::new().with_param("action", "test"));
        assert_eq!(routed.resolve_action(None), "action_test");
        assert_eq!(routed.resolve_action(Some("foo")), "action_foo");
    }

    #[test]
    fn test_construction_seeds_state() {
        let controller = Controller::base(Request::new());
        assert_eq!(controller.state().get_str(keys::CLIENT).as_deref(), Some("Controller"));
        assert_eq!(controller.state().status(), 200);
        assert!(controller.error().is_none());
    }
}
