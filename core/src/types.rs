//! Request descriptor types.
//!
//! # Design
//! Blocks pass their inputs as a flat `Params` map instead of spreading a
//! dynamic object into the request. `None` marks an input the caller never
//! set; `Some(Value::Null)` is an explicit null and survives filtering.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::http::HttpMethod;

/// Flat mapping of parameter names to possibly-absent values.
pub type Params = BTreeMap<String, Option<Value>>;

/// Everything about a request except its path.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    /// Appended to the URL as a query string. Absent and null entries are skipped.
    pub query: Params,
    /// Serialized as the JSON request body when present.
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            query: Params::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn delete() -> Self {
        Self::new(HttpMethod::Delete)
    }

    pub fn post(body: Value) -> Self {
        Self::new(HttpMethod::Post).with_body(body)
    }

    pub fn put(body: Value) -> Self {
        Self::new(HttpMethod::Put).with_body(body)
    }

    pub fn patch(body: Value) -> Self {
        Self::new(HttpMethod::Patch).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), Some(value.into()));
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}
