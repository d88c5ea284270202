//! Wire-level request/response types and the transport seam
//!
//! [`ApiClient`](super::ApiClient) talks to the network only through the
//! [`Transport`] trait, so caching, auth and retry logic can be exercised
//! against an in-memory transport.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use super::ApiError;

/// Body of an outgoing request
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(Vec<FilePart>),
}

/// One file field of a `multipart/form-data` upload
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name (e.g. `images`)
    pub field: String,
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing the MIME type from its extension
    pub fn from_path(field: impl Into<String>, path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_for_extension(path.extension().and_then(|e| e.to_str()));
        Ok(Self::new(field, file_name, mime, bytes))
    }
}

/// Maps the file extensions the media endpoint accepts to MIME types
fn mime_for_extension(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// A fully resolved request, ready to be sent as-is (and re-sent on retry)
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }
}

/// A response as received, before status interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Parses the body as JSON.
    ///
    /// An empty body becomes `null`. A body that is not JSON (an HTML error
    /// page from a proxy, plain text) is kept as a lossy UTF-8 string.
    pub fn json(&self) -> Value {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Value::Null;
        }
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }
}

/// Sends a single request and returns whatever the server answered.
///
/// Implementations must not interpret the status code: a 429 or 500 is a
/// successful `send` carrying that status.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, Result<RawResponse, ApiError>>;
}

/// Headers sent on every request of the primary client
pub fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// [`Transport`] backed by a reqwest [`Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a client with the given default headers and overall timeout
    pub fn new(default_headers: HeaderMap, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wraps an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<RawResponse, ApiError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method.clone(), &request.url)
                .headers(request.headers.clone());

            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }
            builder = match &request.body {
                Some(RequestBody::Json(value)) => builder.json(value),
                Some(RequestBody::Multipart(parts)) => builder.multipart(multipart_form(parts)?),
                None => builder,
            };

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?.to_vec();

            Ok(RawResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn multipart_form(parts: &[FilePart]) -> Result<Form, ApiError> {
    parts.iter().try_fold(Form::new(), |form, part| {
        let file = Part::bytes(part.bytes.clone())
            .file_name(part.file_name.clone())
            .mime_str(&part.mime)?;
        Ok(form.part(part.field.clone(), file))
    })
}
