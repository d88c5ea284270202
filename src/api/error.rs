//! Error taxonomy for the API access layer

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by [`ApiClient`](super::ApiClient) and
/// [`CustomClient`](super::CustomClient)
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Status {
        status: StatusCode,
        /// Response body, parsed as JSON when possible, otherwise a JSON string
        body: Value,
        message: String,
    },

    /// The payload did not match the type expected by the caller
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API answered 2xx but flagged the operation as failed in its envelope
    #[error("API rejected the request: {0}")]
    Rejected(String),

    /// Building the request failed before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading or writing persisted client storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    /// Builds a status error from a raw response body.
    ///
    /// The message is taken from a top-level `message` field when the body is
    /// a JSON object carrying one, otherwise from the canonical reason phrase.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let body = serde_json::from_slice::<Value>(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            });

        ApiError::Status {
            status,
            body,
            message,
        }
    }

    /// HTTP status of the failed response, if one was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(err) => err.status(),
            _ => None,
        }
    }

    /// Whether this error is a rate-limit rejection (HTTP 429)
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS)
    }
}
