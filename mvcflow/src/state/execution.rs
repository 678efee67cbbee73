//! The shared, mutable execution state of one controller.

use super::request::encode_query;
use super::{keys, Cookie, Request, Response};
use crate::controller::ControllerOptions;
use crate::errors::{HookResult, MvcError};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Status of a fresh state.
pub const DEFAULT_STATUS: u16 = 200;

/// A thread-safe key/value store carried through the controller pipeline.
///
/// The exited flag is a latch: once set it stays set until the owning
/// controller finishes the execution and resets the state.
#[derive(Debug, Default)]
pub struct ExecutionState {
    entries: RwLock<HashMap<String, Value>>,
    exited: AtomicBool,
    exit_pending: AtomicBool,
    exit_notified: AtomicBool,
}

impl ExecutionState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state from existing data.
    #[must_use]
    pub fn from_data(data: HashMap<String, Value>) -> Self {
        let state = Self::new();
        for (key, value) in data {
            state.set(key, value);
        }
        state
    }

    /// Populates the reserved keys from a request.
    pub(crate) fn seed(
        &self,
        client: &str,
        request: &Request,
        options: &ControllerOptions,
    ) -> Result<(), MvcError> {
        let mut entries = HashMap::with_capacity(keys::RESERVED.len());
        entries.insert(keys::CLIENT, Value::from(client));
        entries.insert(keys::ACTION, request.action().map_or(Value::Null, Value::from));
        entries.insert(keys::EXITED, Value::Bool(false));
        entries.insert(keys::REQUEST, serde_json::to_value(request)?);
        entries.insert(keys::REQUEST_BODY, request.body.clone());
        entries.insert(keys::REQUEST_HEADERS, serde_json::to_value(&request.headers)?);
        entries.insert(keys::REQUEST_COOKIES, serde_json::to_value(&request.cookies)?);
        entries.insert(keys::QUERY, Value::Object(request.query.clone()));
        entries.insert(keys::PARAMS, Value::Object(request.params.clone()));
        entries.insert(keys::LANGUAGE, request.language());
        entries.insert(
            keys::CLIENT_IP,
            Value::from(request.client_ip(&options.client_ip_headers)),
        );
        entries.insert(keys::USER_AGENT, request.user_agent().map_or(Value::Null, Value::from));
        entries.insert(
            keys::HOSTNAME,
            request.raw.hostname.as_deref().map_or(Value::Null, Value::from),
        );
        entries.insert(keys::CHECKPOINT, request.checkpoint());
        entries.insert(keys::STATUS, Value::from(DEFAULT_STATUS));
        entries.insert(keys::BODY, Value::from(""));
        entries.insert(keys::HEADERS, serde_json::to_value(&options.default_headers)?);
        entries.insert(keys::COOKIES, Value::Array(Vec::new()));

        let mut data = self.entries.write();
        data.extend(entries.into_iter().map(|(k, v)| (k.to_string(), v)));
        Ok(())
    }

    /// Gets a value from the state.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    /// Gets a string value from the state.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .get(key)
            .and_then(Value::as_str)
            .map(String::from)
    }

    /// Gets a value and deserializes it.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, MvcError> {
        self.get(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(MvcError::from)
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Sets a value, overwriting any previous one.
    ///
    /// Writing a non-true value to [`keys::EXITED`] after the latch is set
    /// is ignored.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();

        if key == keys::EXITED {
            if value == Value::Bool(true) {
                self.exited.store(true, Ordering::SeqCst);
            } else if self.is_exited() {
                warn!(value = %value, "Ignoring attempt to reset the exited flag");
                return;
            }
        }

        self.entries.write().insert(key, value);
    }

    /// Serializes a value and stores it.
    pub fn set_as<T: Serialize + ?Sized>(&self, key: impl Into<String>, value: &T) -> HookResult {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    /// Updates a value in place, inserting `null` first when absent.
    pub fn update<F>(&self, key: &str, f: F)
    where
        F: FnOnce(&mut Value),
    {
        if key == keys::EXITED {
            let mut value = self.get(key).unwrap_or(Value::Null);
            f(&mut value);
            self.set(key, value);
            return;
        }

        let mut entries = self.entries.write();
        f(entries.entry(key.to_string()).or_insert(Value::Null));
    }

    /// Removes a value, returning it.
    pub fn remove(&self, key: &str) -> Option<Value> {
        if key == keys::EXITED && self.is_exited() {
            warn!("Ignoring attempt to remove the exited flag");
            return self.get(key);
        }
        self.entries.write().remove(key)
    }

    /// Removes every entry.
    ///
    /// The exit latch survives: a latched state keeps `exited = true` and
    /// the exit status.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        if !self.is_exited() {
            entries.clear();
            return;
        }
        let status = entries.remove(keys::STATUS);
        entries.clear();
        entries.insert(keys::EXITED.to_string(), Value::Bool(true));
        if let Some(status) = status {
            entries.insert(keys::STATUS.to_string(), status);
        }
    }

    /// Removes every entry and re-arms the exit latch for the next execution.
    pub(crate) fn reset(&self) {
        self.entries.write().clear();
        self.exited.store(false, Ordering::SeqCst);
        self.exit_pending.store(false, Ordering::SeqCst);
        self.exit_notified.store(false, Ordering::SeqCst);
    }

    /// Returns a copy of all data.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        self.entries.read().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the state is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns true once the pipeline has been told to stop.
    #[must_use]
    pub fn is_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.get(keys::STATUS)
            .and_then(|v| v.as_u64())
            .and_then(|status| u16::try_from(status).ok())
            .unwrap_or(DEFAULT_STATUS)
    }

    /// Sets the response status.
    pub fn set_status(&self, status: u16) {
        self.set(keys::STATUS, status);
    }

    /// Returns the response body.
    #[must_use]
    pub fn body(&self) -> String {
        match self.get(keys::BODY) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(body)) => body,
            Some(other) => other.to_string(),
        }
    }

    /// Sets the response body.
    pub fn set_body(&self, body: impl Into<String>) {
        let body: String = body.into();
        self.set(keys::BODY, body);
    }

    /// Returns true once a non-empty body has been written.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body().is_empty()
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> BTreeMap<String, String> {
        match self.get(keys::HEADERS) {
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(name, value)| match value {
                    Value::String(s) => (name, s),
                    other => (name, other.to_string()),
                })
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    /// Returns one response header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers().remove(name)
    }

    /// Sets a response header.
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = Value::String(value.into());
        let mut entries = self.entries.write();
        let headers = entries
            .entry(keys::HEADERS.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        match headers {
            Value::Object(map) => {
                map.insert(name, value);
            }
            other => {
                let mut map = Map::new();
                map.insert(name, value);
                *other = Value::Object(map);
            }
        }
    }

    /// Returns the outgoing cookies.
    #[must_use]
    pub fn cookies(&self) -> Vec<Cookie> {
        match self.get(keys::COOKIES) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Queues an outgoing cookie.
    pub fn add_cookie(&self, cookie: &Cookie) -> HookResult {
        let cookie = serde_json::to_value(cookie)?;
        let mut entries = self.entries.write();
        let cookies = entries
            .entry(keys::COOKIES.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));

        match cookies {
            Value::Array(items) => items.push(cookie),
            other => *other = Value::Array(vec![cookie]),
        }
        Ok(())
    }

    /// Returns the query mapping.
    #[must_use]
    pub fn query(&self) -> Map<String, Value> {
        match self.get(keys::QUERY) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Returns the resolved action identifier, once execution started.
    #[must_use]
    pub fn full_action_name(&self) -> Option<String> {
        self.get_str(keys::FULL_ACTION_NAME)
    }

    /// Returns the derived client address.
    #[must_use]
    pub fn client_ip(&self) -> Option<String> {
        self.get_str(keys::CLIENT_IP)
    }

    /// Stops the pipeline with `code`.
    ///
    /// The owning controller notifies the mixins' `exit` hooks as soon as
    /// the running hook returns.
    pub fn exit(&self, code: u16) {
        self.set_status(code);
        self.set(keys::EXITED, true);
        self.exit_pending.store(true, Ordering::SeqCst);
    }

    /// Redirects to `location` and stops the pipeline with `302`.
    ///
    /// With `keep_query_string` the request's query is appended, joined with
    /// `&` when `location` already has a query and `?` otherwise.
    pub fn redirect(&self, location: &str, keep_query_string: bool) {
        let query = if keep_query_string {
            encode_query(&self.query())
        } else {
            String::new()
        };

        let target = if query.is_empty() {
            location.to_string()
        } else {
            let delimiter = if location.contains('?') { '&' } else { '?' };
            format!("{location}{delimiter}{query}")
        };

        self.set_header("location", target);
        self.exit(302);
    }

    /// Stops the pipeline with `403 / <msg>`.
    pub fn forbidden(&self, msg: &str) {
        self.set_body(format!("403 / {msg}"));
        self.exit(403);
    }

    /// Builds the response record.
    #[must_use]
    pub fn to_response(&self) -> Response {
        Response {
            status: self.status(),
            body: self.body(),
            headers: self.headers(),
            cookies: self.cookies(),
        }
    }

    /// Consumes a pending exit notification.
    ///
    /// Returns true at most once per execution.
    pub(crate) fn take_exit_request(&self) -> bool {
        self.exit_pending.swap(false, Ordering::SeqCst)
            && !self.exit_notified.swap(true, Ordering::SeqCst)
    }
}
