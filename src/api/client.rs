//! Primary API client
//!
//! Every request issued through [`ApiClient`] carries the stored bearer token
//! (re-read on each dispatch, retries included) and is retried with
//! exponential backoff when the server answers 429. Successful GETs are written
//! to the client's [`ResponseCache`] and, when the caller opts in, served from
//! it for the TTL window.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::request::RequestConfig;
use super::response::ApiResponse;
use super::retry::{with_retry, RetryContext, RetryPolicy};
use super::transport::{json_headers, HttpRequest, RequestBody, ReqwestTransport, Transport};
use super::ApiError;
use crate::cache::ResponseCache;
use crate::config::ApiConfig;
use crate::storage::TokenStore;

/// Client for the marketplace REST API
///
/// Clones share the transport, cache and token store.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    cache: Arc<ResponseCache>,
    tokens: Arc<dyn TokenStore>,
    retry: RetryPolicy,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("cached_entries", &self.cache.len())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client sending JSON over reqwest
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(json_headers(), config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport), tokens))
    }

    /// Creates a client over a custom transport
    pub fn with_transport(
        config: &ApiConfig,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            base_url: config.base_url(),
            transport,
            cache: Arc::new(ResponseCache::new(config.cache_ttl)),
            tokens,
            retry: config.retry,
        }
    }

    /// Replaces the response cache, e.g. to share one between clients
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// GET `path`, serving a fresh cached payload when `use_cache` is set.
    ///
    /// Every successful network GET refreshes the cache entry, regardless of
    /// `use_cache`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
        use_cache: bool,
    ) -> Result<ApiResponse<T>, ApiError> {
        let key = ResponseCache::key(path, config.params.as_ref());

        if use_cache {
            if let Some(hit) = self.cache.get(&key) {
                debug!(%key, age_ms = hit.age.as_millis() as u64, "serving cached response");
                return ApiResponse {
                    data: hit.data,
                    status: hit.status,
                    headers: Default::default(),
                    from_cache: true,
                }
                .decode();
            }
        }

        let response = self.send(Method::GET, path, config, None).await?;
        let status = response.status;
        self.cache.insert(key, response.data.clone(), status);
        response.decode()
    }

    /// POST `body` as JSON to `path`
    pub async fn post<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.send(Method::POST, path, config, body).await?.decode()
    }

    /// PUT `body` as JSON to `path`
    pub async fn put<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.send(Method::PUT, path, config, body).await?.decode()
    }

    /// DELETE `path`
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.send(Method::DELETE, path, config, None)
            .await?
            .decode()
    }

    /// Drops every cached response
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("response cache cleared");
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let request = config.into_request(method, &self.base_url, path, body);
        with_retry(self.retry, |ctx| self.dispatch(&request, ctx)).await
    }

    /// One attempt: attach the current token, send, interpret the status
    async fn dispatch(
        &self,
        request: &HttpRequest,
        ctx: RetryContext,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let mut outgoing = request.clone();
        if let Some(token) = self.tokens.token() {
            outgoing.headers.insert(AUTHORIZATION, bearer(&token)?);
        }

        debug!(
            method = %outgoing.method,
            url = %outgoing.url,
            attempt = ctx.attempt(),
            authenticated = outgoing.headers.contains_key(AUTHORIZATION),
            "dispatching request"
        );

        let raw = self.transport.send(&outgoing).await?;
        debug!(status = raw.status.as_u16(), url = %outgoing.url, "response received");
        ApiResponse::from_raw(raw)
    }
}

/// `Authorization` header value for a bearer token
pub(crate) fn bearer(token: &str) -> Result<HeaderValue, ApiError> {
    let message = "bearer token is not a valid header value";
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| ApiError::InvalidRequest(message.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Serializes an optional request body to JSON
pub(crate) fn json_body<B: Serialize + ?Sized>(
    body: Option<&B>,
) -> Result<Option<RequestBody>, ApiError> {
    match body {
        Some(body) => match serde_json::to_value(body) {
            Ok(value) => Ok(Some(RequestBody::Json(value))),
            Err(e) => Err(ApiError::InvalidRequest(format!("body is not JSON: {e}"))),
        },
        None => Ok(None),
    }
}
