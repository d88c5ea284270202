//! Per-request options forwarded to the transport

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{Map, Value};

use super::transport::{HttpRequest, RequestBody};
use crate::config::resolve_url;

/// Headers, query parameters and transport options for one call
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Extra headers; the client's auth header wins over a caller-supplied one
    pub headers: HeaderMap,
    /// Query parameters, also part of the GET cache key
    pub params: Option<Map<String, Value>>,
    /// Timeout for this request only
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Query string pairs; `null` params are dropped, non-string values are
    /// sent in their JSON form
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .flatten()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key.clone(), s.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect()
    }

    /// Resolves `path` against `base_url` and assembles the wire request
    pub fn into_request(
        self,
        method: Method,
        base_url: &str,
        path: &str,
        body: Option<RequestBody>,
    ) -> HttpRequest {
        let query = self.query_pairs();
        HttpRequest {
            method,
            url: resolve_url(base_url, path),
            query,
            headers: self.headers,
            body,
            timeout: self.timeout,
        }
    }
}
