//! In-memory transport for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

use super::transport::{HttpRequest, RawResponse, Transport};
use super::ApiError;

/// Answers from a queue of canned responses and records every request.
///
/// Running out of responses yields `ApiError::InvalidRequest`, which stands in
/// for a transport failure.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn respond(&self, status: u16, body: Value) -> &Self {
        self.responses.lock().unwrap().push_back(RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: serde_json::to_vec(&body).unwrap(),
        });
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<RawResponse, ApiError>> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        Box::pin(async move {
            next.ok_or_else(|| ApiError::InvalidRequest("no scripted response left".to_string()))
        })
    }
}
