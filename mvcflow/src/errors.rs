//! Error types for the mvcflow controller pipeline.
//!
//! Errors raised by hooks and actions never escape `Controller::execute`;
//! they are turned into a `500` response there. This module defines the
//! taxonomy those failures are expressed in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Body used for a server error whose cause carries no message.
pub const INTERNAL_SERVER_ERROR_BODY: &str = "500 / Internal Server Error";

/// Result type returned by every lifecycle hook and action.
pub type HookResult = Result<(), MvcError>;

/// The main error type for mvcflow operations.
#[derive(Debug, Error)]
pub enum MvcError {
    /// A hook or action failed with a message.
    #[error("{0}")]
    Action(String),

    /// A hook or action failed without saying why.
    #[error("{}", INTERNAL_SERVER_ERROR_BODY)]
    Unspecified,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid controller configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Any other error bubbled up from hook code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MvcError {
    /// Creates an action error with a message.
    #[must_use]
    pub fn action(message: impl Into<String>) -> Self {
        Self::Action(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns the error message, or `None` when the error carries none.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Unspecified => None,
            Self::Action(message) if message.is_empty() => None,
            other => {
                let message = other.to_string();
                (!message.is_empty()).then_some(message)
            }
        }
    }

    /// Returns a short type tag for the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Action(_) => ErrorKind::Action,
            Self::Unspecified => ErrorKind::Unspecified,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Config(_) => ErrorKind::Config,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        if let Some(message) = self.message() {
            map.insert("message".to_string(), serde_json::json!(message));
        }
        map
    }
}

/// Coarse classification of an [`MvcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Failure raised by a hook or action with a message.
    Action,
    /// Failure without a message.
    Unspecified,
    /// Serialization failure.
    Serialization,
    /// Configuration failure.
    Config,
    /// Foreign error.
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_message() {
        let err = MvcError::action("Expected Error");
        assert_eq!(err.to_string(), "Expected Error");
        assert_eq!(err.message(), Some("Expected Error".to_string()));
    }

    #[test]
    fn test_missing_message() {
        assert_eq!(MvcError::Unspecified.message(), None);
        assert_eq!(MvcError::action("").message(), None);
        assert_eq!(MvcError::Unspecified.to_string(), INTERNAL_SERVER_ERROR_BODY);
    }

    #[test]
    fn test_anyhow_is_transparent() {
        let err: MvcError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.message(), Some("disk full".to_string()));
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_to_dict() {
        let dict = MvcError::config("bad").to_dict();
        assert_eq!(dict.get("type").unwrap(), "config");
        assert_eq!(dict.get("message").unwrap(), "Invalid configuration: bad");

        let dict = MvcError::Unspecified.to_dict();
        assert!(dict.get("message").is_none());
    }
}
