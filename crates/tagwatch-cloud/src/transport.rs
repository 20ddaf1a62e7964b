//! HTTP transport abstraction.
//!
//! Both remote exchanges are a JSON `POST` followed by a status and a body,
//! so the transport exposes exactly that. Production code uses
//! [`ReqwestTransport`](crate::client::ReqwestTransport); tests use
//! [`MockTransport`](crate::mock::MockTransport) or a local wiremock server.

#![allow(async_fn_in_trait)]

use bytes::Bytes;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::error::TransportError;

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Sends a JSON body with `POST` and returns whatever the server answered.
///
/// A non-2xx status is still `Ok`; callers decide what a status means.
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError>;
}

/// Parse `base` and append `name=value` to its query, percent-encoded.
///
/// Only `base` appears in the error, never `value`.
pub fn with_query(base: &str, name: &str, value: &str) -> Result<Url, TransportError> {
    let mut url =
        Url::parse(base).map_err(|e| TransportError::InvalidUrl(format!("'{base}': {e}")))?;
    url.query_pairs_mut().append_pair(name, value);
    Ok(url)
}

/// Replace the value of an `auth=` query parameter with `***` for logging.
pub fn redact_auth(url: &str) -> String {
    let Some(start) = url.find("auth=").map(|i| i + "auth=".len()) else {
        return url.to_string();
    };
    let end = url[start..]
        .find('&')
        .map_or(url.len(), |offset| start + offset);
    format!("{}***{}", &url[..start], &url[end..])
}
