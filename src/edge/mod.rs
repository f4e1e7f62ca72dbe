//! Edge tier: query parameter normalization
//!
//! Runs on every viewer request before the cache lookup. Recognized
//! operation parameters are moved out of the query string and into the
//! path as a canonical suffix, so equivalent requests share a cache key:
//!
//! ```text
//! /Bernie.png?Format=jpg&width=2000  →  /Bernie.png/format=jpeg,width=1024
//! ```

pub mod handlers;
pub mod normalizer;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use handlers::{HandlerTable, OperationHandler};
pub use normalizer::QueryNormalizer;

/// Signed-URL query parameters, forwarded untouched
pub const SIGNING_QUERY_PARAMS: [&str; 3] = ["Expires", "Signature", "Key-Pair-Id"];

/// Failure inside a single normalization attempt
///
/// Never leaves the normalizer; the request falls back to its original path.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("handler for '{operation}' failed: {message}")]
    Handler { operation: String, message: String },
}

/// Viewer-request event as delivered to the edge function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<serde_json::Value>,
    pub request: EdgeRequest,
}

impl EdgeEvent {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

/// A viewer request, mutated in place by the normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub uri: String,
    /// Query parameters keyed by name, case as received
    #[serde(default)]
    pub querystring: BTreeMap<String, QueryValue>,
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderValue>,
    #[serde(default)]
    pub cookies: BTreeMap<String, serde_json::Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// A query parameter; `value` is absent for bare keys like `?width`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl QueryValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderValue {
    #[serde(default)]
    pub value: String,
}

impl EdgeRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            method: default_method(),
            uri: uri.into(),
            querystring: BTreeMap::new(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.querystring.insert(name.into(), QueryValue::new(value));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(
            name.into(),
            HeaderValue {
                value: value.into(),
            },
        );
        self
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, header)| header.value.as_str())
    }
}
