//! Access layer for the marketplace REST API
//!
//! [`ApiClient`] is the shared client used for everything JSON: it injects the
//! bearer token, caches GET responses and retries rate-limited requests.
//! [`create_custom_client`] builds a stand-alone client for calls that need
//! different transport settings, such as multipart media uploads.

mod client;
mod custom;
mod error;
mod request;
mod response;
mod retry;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

pub use client::ApiClient;
pub use custom::{create_custom_client, CustomClient, CustomClientConfig};
pub use error::ApiError;
pub use request::RequestConfig;
pub use response::ApiResponse;
pub use retry::{with_retry, RetryContext, RetryPolicy};
pub use transport::{
    json_headers, FilePart, HttpRequest, RawResponse, RequestBody, ReqwestTransport, Transport,
};
