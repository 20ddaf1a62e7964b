//! Mock HTTP transport.
//!
//! Returns canned responses matched by URL prefix and records every request
//! so tests can assert on what would have gone over the wire.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TransportError;
use crate::transport::{HttpResponse, HttpTransport};

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: String,
}

/// Canned outcome of a request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(HttpResponse),
    Error(TransportError),
}

impl MockResponse {
    /// A 200 response with a JSON body.
    pub fn ok_json(body: serde_json::Value) -> Self {
        MockResponse::Success(HttpResponse::new(200, body.to_string()))
    }

    pub fn status(status: u16) -> Self {
        MockResponse::Success(HttpResponse::new(status, ""))
    }
}

/// Mock transport. Clones share responses and recorded requests.
///
/// # Examples
///
/// ```
/// use tagwatch_cloud::HttpTransport;
/// use tagwatch_cloud::mock::{MockResponse, MockTransport};
///
/// #[tokio::main]
/// async fn main() {
///     let transport = MockTransport::new();
///     transport.set_response("https://db.test/", MockResponse::status(200));
///
///     let response = transport
///         .post_json("https://db.test/rfid_logs.json", "{}")
///         .await
///         .unwrap();
///
///     assert_eq!(response.status, 200);
///     assert_eq!(transport.get_requests().len(), 1);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<Vec<(String, MockResponse)>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests whose URL starts with `prefix`. Later registrations
    /// of the same prefix replace earlier ones.
    pub fn set_response(&self, prefix: &str, response: MockResponse) {
        let mut responses = lock(&self.responses);
        responses.retain(|(p, _)| p != prefix);
        responses.push((prefix.to_string(), response));
    }

    /// Answer every request without a prefix match.
    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn response_for(&self, url: &str) -> Option<MockResponse> {
        let responses = lock(&self.responses);
        responses
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, response)| response.clone())
            .or_else(|| lock(&self.default_response).clone())
    }
}

impl HttpTransport for MockTransport {
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            body: body.to_string(),
        });

        match self.response_for(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(TransportError::Other(format!("no mock response for {url}"))),
        }
    }
}
