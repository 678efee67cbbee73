//! # Mvcflow
//!
//! A request controller with an ordered, short-circuiting mixin pipeline.
//!
//! Mvcflow provides:
//!
//! - **Staged execution**: setup, before, action and after, run across the
//!   controller's own hooks and every attached mixin
//! - **Early exit**: any hook may stop the pipeline; teardown hooks still
//!   run exactly once
//! - **Type composition**: controller types extend their parent's mixin
//!   list and are sealed once shared
//! - **Event-driven observability**: lifecycle events and `tracing` spans
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mvcflow::prelude::*;
//!
//! let class = ControllerType::base()
//!     .subtype("Articles")
//!     .with_mixin(Arc::new(SessionMixin))
//!     .build()?;
//!
//! let mut controller = Controller::new(class, ArticleActions::default(), request);
//! let response = controller.execute(Some("read"), false).await;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod controller;
pub mod errors;
pub mod events;
pub mod helpers;
pub mod mixins;
pub mod observability;
pub mod state;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::controller::{
        ActionHandler, ActionTable, BaseActions, Controller, ControllerOptions, ControllerType,
        Stage,
    };
    pub use crate::errors::{HookResult, MvcError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::helpers::{Model, View, ViewRender};
    pub use crate::mixins::{Mixin, MixinChain};
    pub use crate::state::{keys, Cookie, ExecutionState, Request, Response};
}
