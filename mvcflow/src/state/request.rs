//! The inbound request record consumed by a controller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Address reported when no header or request field names the client.
pub const FALLBACK_CLIENT_IP: &str = "0.0.0.0";

/// Transport-level details of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequest {
    /// Host name the request was addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// A request-like record, as handed over by the transport and router.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Parsed query string.
    #[serde(default)]
    pub query: Map<String, Value>,
    /// Route parameters (`action`, `language`, ...).
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Transport details.
    #[serde(default)]
    pub raw: RawRequest,
    /// Request body.
    #[serde(default)]
    pub body: Value,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request cookies.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// Peer address reported by the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl Request {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query entry.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Adds a route parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the peer address.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Sets the host name.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.raw.hostname = Some(hostname.into());
        self
    }

    /// Looks a header up, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Returns the action carried by the route parameters.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.params
            .get("action")
            .and_then(Value::as_str)
            .filter(|action| !action.is_empty())
    }

    /// Returns the requested language (route parameter first, then query).
    #[must_use]
    pub fn language(&self) -> Value {
        first_truthy([self.params.get("language"), self.query.get("language")])
    }

    /// Returns the checkpoint token (`checkpoint`, then `cp`).
    #[must_use]
    pub fn checkpoint(&self) -> Value {
        first_truthy([self.query.get("checkpoint"), self.query.get("cp")])
    }

    /// Returns the user agent header, if any.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// Derives the client address.
    ///
    /// `headers` are consulted in order, then the request's own `ip`, then
    /// [`FALLBACK_CLIENT_IP`]. Empty values are skipped.
    ///
    /// A comma-separated forwarded list (`x-forwarded-for: a, b`) resolves to
    /// its first hop `a`, not to the raw header value.
    #[must_use]
    pub fn client_ip<S: AsRef<str>>(&self, headers: &[S]) -> String {
        headers
            .iter()
            .filter_map(|name| self.header(name.as_ref()))
            .map(|value| value.split(',').next().unwrap_or_default().trim())
            .find(|value| !value.is_empty())
            .or_else(|| self.ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty()))
            .unwrap_or(FALLBACK_CLIENT_IP)
            .to_string()
    }

    /// Serializes the query mapping as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn query_string(&self) -> String {
        encode_query(&self.query)
    }
}

/// Serializes a query mapping as `application/x-www-form-urlencoded`.
///
/// Keys keep their insertion order. Arrays are joined with commas.
#[must_use]
pub fn encode_query(query: &Map<String, Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        serializer.append_pair(key, &query_value(value));
    }
    serializer.finish()
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(query_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_truthy<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Value {
    candidates
        .into_iter()
        .flatten()
        .find(|value| is_truthy(value))
        .cloned()
        .unwrap_or(Value::Null)
}
