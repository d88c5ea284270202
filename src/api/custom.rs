//! Independently configured clients
//!
//! A [`CustomClient`] shares nothing with the primary
//! [`ApiClient`](super::ApiClient): no response cache, no stored-token lookup
//! and no retry. It exists for calls that need their own transport settings,
//! such as `multipart/form-data` media uploads.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::client::{bearer, json_body};
use super::request::RequestConfig;
use super::response::ApiResponse;
use super::transport::{FilePart, RequestBody, ReqwestTransport, Transport};
use super::ApiError;

/// Settings for [`create_custom_client`]
#[derive(Debug, Clone, Default)]
pub struct CustomClientConfig {
    /// Base URL relative paths resolve against
    pub base_url: String,
    /// Headers sent with every request
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

impl CustomClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sends `Authorization: Bearer <token>` on every request
    pub fn bearer_token(mut self, token: &str) -> Result<Self, ApiError> {
        self.headers.insert(AUTHORIZATION, bearer(token)?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Builds a client with its own reqwest instance and settings
pub fn create_custom_client(config: CustomClientConfig) -> Result<CustomClient, ApiError> {
    let transport = Arc::new(ReqwestTransport::new(config.headers, config.timeout)?);
    Ok(CustomClient::with_transport(config.base_url, transport))
}

/// Plain client: one request, one response, nothing remembered
#[derive(Clone)]
pub struct CustomClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for CustomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CustomClient {
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.send(Method::GET, path, config, None).await?.decode()
    }

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

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.send(Method::DELETE, path, config, None)
            .await?
            .decode()
    }

    /// POSTs `files` as `multipart/form-data`.
    ///
    /// The content type (with its boundary) is set by the multipart body, so
    /// the config should not carry one.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        files: Vec<FilePart>,
        config: RequestConfig,
    ) -> Result<ApiResponse<T>, ApiError> {
        if files.is_empty() {
            return Err(ApiError::InvalidRequest("no files to upload".to_string()));
        }
        debug!(path, files = files.len(), "uploading media");
        let body = RequestBody::Multipart(files);
        self.send(Method::POST, path, config, Some(body))
            .await?
            .decode()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let request = config.into_request(method, &self.base_url, path, body);
        let raw = self.transport.send(&request).await?;
        ApiResponse::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use serde_json::json;

    fn custom() -> (CustomClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        let client = CustomClient::with_transport("http://localhost:5000/api", transport.clone());
        (client, transport)
    }

    #[test]
    fn test_config_builder() {
        let config = CustomClientConfig::new("http://media.local/api")
            .bearer_token("abc")
            .unwrap()
            .timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "http://media.local/api");
        assert_eq!(config.headers[AUTHORIZATION], "Bearer abc");
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert!(create_custom_client(config).is_ok());
    }

    #[tokio::test]
    async fn test_get_is_never_cached() {
        let (client, transport) = custom();
        transport.respond(200, json!([1])).respond(200, json!([2]));

        let first: ApiResponse<Vec<u32>> =
            client.get("/media", RequestConfig::new()).await.unwrap();
        let second: ApiResponse<Vec<u32>> =
            client.get("/media", RequestConfig::new()).await.unwrap();

        assert_eq!(first.data, vec![1]);
        assert_eq!(second.data, vec![2]);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_429_is_not_retried() {
        let (client, transport) = custom();
        transport.respond(429, json!({})).respond(200, json!({}));

        let err = client
            .post::<Value, Value>("/media", Some(&json!({"a": 1})), RequestConfig::new())
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_body() {
        let (client, transport) = custom();
        let uploaded = json!({"status": "success", "data": {"urls": ["a.jpg"]}});
        transport.respond(201, uploaded);

        let part = FilePart::new("images", "a.jpg", "image/jpeg", vec![0xff, 0xd8]);
        let response: ApiResponse<Value> = client
            .upload("/media/upload", vec![part], RequestConfig::new())
            .await
            .unwrap();

        assert_eq!(response.data["data"]["urls"][0], "a.jpg");
        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url, "http://localhost:5000/api/media/upload");
        match &requests[0].body {
            Some(RequestBody::Multipart(parts)) => assert_eq!(parts[0].file_name, "a.jpg"),
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_requires_files() {
        let (client, transport) = custom();
        let result = client
            .upload::<Value>("/media/upload", Vec::new(), RequestConfig::new())
            .await;

        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
        assert!(transport.requests().is_empty());
    }
}
