//! Testing utilities for mvcflow controllers.
//!
//! This module provides:
//! - Mock mixins that record, exit, fail, write state or sleep
//! - Assertions for response records

mod assertions;
mod mocks;

pub use assertions::{assert_body, assert_header, assert_status};
pub use mocks::{ExitingMixin, FailingMixin, RecordingMixin, SlowMixin, StateWriterMixin};
