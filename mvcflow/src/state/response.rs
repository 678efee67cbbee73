//! The response record produced by a controller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Options attached to an outgoing cookie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CookieOptions {
    /// Restricts the cookie to secure transports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// Lifetime in seconds.
    #[serde(default, rename = "maxAge", skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    /// Hides the cookie from scripts.
    #[serde(default, rename = "httpOnly", skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// Path scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Domain scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Same-site policy.
    #[serde(default, rename = "sameSite", skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    /// Options the transport understands but this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An outgoing cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Cookie options.
    #[serde(default)]
    pub options: CookieOptions,
}

impl Cookie {
    /// Creates a cookie with default options.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options: CookieOptions::default(),
        }
    }

    /// Marks the cookie as secure.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.options.secure = Some(secure);
        self
    }

    /// Sets the lifetime in seconds.
    #[must_use]
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.options.max_age = Some(seconds);
        self
    }

    /// Marks the cookie as HTTP only.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.options.http_only = Some(http_only);
        self
    }

    /// Sets the path scope.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.options.path = Some(path.into());
        self
    }
}

/// The response-like record returned by `Controller::execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: String,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Outgoing cookies.
    pub cookies: Vec<Cookie>,
}

impl Response {
    /// Looks a header up, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cookie_wire_shape() {
        let cookie = Cookie::new("sid", "abc").secure(true).max_age(3600);
        assert_eq!(
            serde_json::to_value(&cookie).unwrap(),
            json!({"name": "sid", "value": "abc", "options": {"secure": true, "maxAge": 3600}})
        );
    }

    #[test]
    fn test_cookie_keeps_unknown_options() {
        let cookie: Cookie = serde_json::from_value(json!({
            "name": "sid",
            "value": "abc",
            "options": {"priority": "high"}
        }))
        .unwrap();
        assert_eq!(cookie.options.extra.get("priority"), Some(&json!("high")));
        assert_eq!(cookie.options.secure, None);
    }

    #[test]
    fn test_response_header_lookup() {
        let response = Response {
            status: 302,
            body: String::new(),
            headers: BTreeMap::from([("location".to_string(), "/home".to_string())]),
            cookies: Vec::new(),
        };
        assert_eq!(response.header("Location"), Some("/home"));
        assert!(!response.is_success());
    }
}
