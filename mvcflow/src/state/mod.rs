//! Execution state and the request/response records around it.
//!
//! This module provides:
//! - The shared, mutable [`ExecutionState`] every hook reads and writes
//! - The reserved [`keys`] the controller seeds into it
//! - The inbound [`Request`] and outbound [`Response`] records

mod execution;
pub mod keys;
mod request;
mod response;

pub use execution::{ExecutionState, DEFAULT_STATUS};
pub use request::{encode_query, RawRequest, Request, FALLBACK_CLIENT_IP};
pub use response::{Cookie, CookieOptions, Response};
