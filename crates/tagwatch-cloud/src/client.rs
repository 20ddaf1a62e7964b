//! Reqwest-backed transport.
//!
//! Outbound TLS trusts exactly one root: the certificate bundled under
//! `certs/` (GTS Root R1, cross-signed by GlobalSign), or a PEM file named
//! by `cloud.root_ca_path`. The platform and webpki root stores are not
//! consulted.

use std::path::Path;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tagwatch_core::CloudConfig;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{HttpResponse, HttpTransport};

/// Bundled trust anchor for the identity and database hosts.
pub const BUNDLED_ROOT_PEM: &[u8] = include_bytes!("../certs/gts-root-r1.pem");

/// Production transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Client pinned to the configured root with the configured timeout.
    ///
    /// # Errors
    /// Returns `TransportError::Tls` when the root certificate cannot be read
    /// or parsed, or the client cannot be built.
    pub fn from_config(config: &CloudConfig) -> Result<Self, TransportError> {
        let pem = match &config.root_ca_path {
            Some(path) => read_pem(Path::new(path))?,
            None => BUNDLED_ROOT_PEM.to_vec(),
        };
        Self::pinned(&pem, config.request_timeout())
    }

    /// Client trusting only the certificates in `pem`.
    ///
    /// # Errors
    /// Returns `TransportError::Tls` for an unparsable certificate.
    pub fn pinned(pem: &[u8], timeout: Duration) -> Result<Self, TransportError> {
        let root = reqwest::Certificate::from_pem(pem)
            .map_err(|e| TransportError::Tls(format!("invalid root certificate: {e}")))?;

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .add_root_certificate(root)
            .https_only(true)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Tls(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap a preconfigured client, e.g. one talking plain HTTP to a local
    /// test server.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Classify a reqwest failure. The request URL is dropped first since its
    /// query carries the API key or the bearer token.
    fn convert_error(err: reqwest::Error) -> TransportError {
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .await
            .map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Self::convert_error)?;
        debug!("Received {} bytes with status {}", body.len(), status);

        Ok(HttpResponse::new(status, body))
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, TransportError> {
    std::fs::read(path)
        .map_err(|e| TransportError::Tls(format!("cannot read {}: {e}", path.display())))
}
