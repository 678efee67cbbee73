//! Reserved keys of the execution state.
//!
//! Mixins may add their own keys but must not reuse these.

/// Name of the controller type that owns the state.
pub const CLIENT: &str = "client";
/// Action name carried by the route parameters.
pub const ACTION: &str = "action";
/// Resolved action identifier (`action_<name>`).
pub const FULL_ACTION_NAME: &str = "fullActionName";
/// Monotonic termination flag.
pub const EXITED: &str = "exited";

/// The inbound request record.
pub const REQUEST: &str = "request";
/// Body of the inbound request.
pub const REQUEST_BODY: &str = "requestBody";
/// Headers of the inbound request.
pub const REQUEST_HEADERS: &str = "requestHeaders";
/// Cookies of the inbound request.
pub const REQUEST_COOKIES: &str = "requestCookies";
/// Parsed query mapping.
pub const QUERY: &str = "query";
/// Parsed route parameters.
pub const PARAMS: &str = "params";
/// Host name of the inbound request.
pub const HOSTNAME: &str = "hostname";
/// Derived client address.
pub const CLIENT_IP: &str = "clientIP";
/// Derived user agent.
pub const USER_AGENT: &str = "userAgent";
/// Requested language.
pub const LANGUAGE: &str = "language";
/// Checkpoint token from the query.
pub const CHECKPOINT: &str = "checkpoint";

/// Response status code.
pub const STATUS: &str = "status";
/// Response body.
pub const BODY: &str = "body";
/// Response headers.
pub const HEADERS: &str = "headers";
/// Outgoing cookies.
pub const COOKIES: &str = "cookies";

/// Every reserved key, in seeding order.
pub const RESERVED: &[&str] = &[
    CLIENT,
    ACTION,
    EXITED,
    REQUEST,
    REQUEST_BODY,
    REQUEST_HEADERS,
    REQUEST_COOKIES,
    QUERY,
    PARAMS,
    LANGUAGE,
    CLIENT_IP,
    USER_AGENT,
    HOSTNAME,
    CHECKPOINT,
    STATUS,
    BODY,
    HEADERS,
    COOKIES,
    FULL_ACTION_NAME,
];

/// Returns true if `key` is reserved by the controller.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED.contains(&key)
}
