//! Controllers and the staged execution pipeline.
//!
//! This module provides:
//! - [`ControllerType`]: the sealed, shareable type of a controller (name,
//!   ordered mixins, options)
//! - [`ActionHandler`]: the controller's own hooks and action table
//! - [`Controller`]: one instance per request, running the pipeline
//! - [`ControllerOptions`]: serde-loadable configuration

mod class;
mod handler;
mod options;
mod pipeline;

pub use class::{ControllerType, BASE_CONTROLLER_NAME};
pub use handler::{
    full_action_name, ActionHandler, ActionTable, BaseActions, ACTION_PREFIX, DEFAULT_ACTION,
    INDEX_ACTION,
};
pub use options::ControllerOptions;
pub use pipeline::{Controller, Stage};
