//! Configuration of a controller type.

use crate::errors::MvcError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options shared by every controller of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerOptions {
    /// Run unknown actions as no-ops instead of answering 404.
    #[serde(default)]
    pub suppress_action_not_found: bool,
    /// Headers every response starts with.
    #[serde(default = "default_headers")]
    pub default_headers: BTreeMap<String, String>,
    /// Request headers naming the client address, in precedence order.
    #[serde(default = "default_client_ip_headers")]
    pub client_ip_headers: Vec<String>,
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("X-Content-Type-Options".to_string(), "nosniff".to_string())])
}

fn default_client_ip_headers() -> Vec<String> {
    [
        "cf-connecting-ip",
        "x-real-ip",
        "x-real_ip",
        "x-forwarded-for",
        "remote_addr",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            suppress_action_not_found: false,
            default_headers: default_headers(),
            client_ip_headers: default_client_ip_headers(),
        }
    }
}

impl ControllerOptions {
    /// Creates options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a JSON document; missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, MvcError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks the options for consistency.
    pub fn validate(&self) -> Result<(), MvcError> {
        if self.client_ip_headers.is_empty() {
            return Err(MvcError::config("client_ip_headers must not be empty"));
        }
        if let Some(name) = self.client_ip_headers.iter().find(|h| h.trim().is_empty()) {
            return Err(MvcError::config(format!("invalid client ip header name {name:?}")));
        }
        Ok(())
    }

    /// Sets the 404-suppression toggle.
    #[must_use]
    pub fn with_suppress_action_not_found(mut self, suppress: bool) -> Self {
        self.suppress_action_not_found = suppress;
        self
    }

    /// Adds a default response header.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }
}
