//! Small collaborators used alongside controllers.
//!
//! - [`View`]: a template identifier plus a data bag, rendered through a
//!   replaceable process-wide factory
//! - [`Model`]: typed fields with an append-only snapshot history

mod model;
mod view;

pub use model::{Model, Snapshot};
pub use view::{
    clear_default_view_factory, set_default_view_factory, View, ViewFactory, ViewRender,
};
