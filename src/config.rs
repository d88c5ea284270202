//! Client configuration
//!
//! All relative request paths resolve against `<API_ROOT>/api`. The API root
//! defaults to a local development server and can be overridden through the
//! `ESTATE_API_ROOT` environment variable or the `--api-root` CLI flag.

use std::time::Duration;

use crate::api::RetryPolicy;
use crate::cache::DEFAULT_TTL;

/// API root used when nothing else is configured
pub const DEFAULT_API_ROOT: &str = "http://localhost:5000";

/// Environment variable overriding the API root
pub const API_ROOT_ENV: &str = "ESTATE_API_ROOT";

/// Settings for [`ApiClient`](crate::api::ApiClient)
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Server root, without the `/api` suffix
    pub api_root: String,
    /// Freshness window of cached GET responses
    pub cache_ttl: Duration,
    /// Backoff applied to HTTP 429 responses
    pub retry: RetryPolicy,
    /// Overall per-request timeout; `None` keeps the transport default
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            cache_ttl: DEFAULT_TTL,
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }
}

impl ApiConfig {
    /// Defaults, with the API root taken from `ESTATE_API_ROOT` when set
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(API_ROOT_ENV).ok())
    }

    fn from_env_value(api_root: Option<String>) -> Self {
        match api_root.filter(|root| !root.trim().is_empty()) {
            Some(root) => Self::default().with_api_root(root),
            None => Self::default(),
        }
    }

    /// Replaces the API root
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into().trim().to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Base URL all relative paths resolve against: `<API_ROOT>/api`
    pub fn base_url(&self) -> String {
        format!("{}/api", self.api_root.trim_end_matches('/'))
    }
}

/// Joins a request path onto a base URL.
///
/// Absolute `http(s)://` paths are used as-is.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
