//! Remote log submission.
//!
//! Each access event is appended to the `rfid_logs` collection of the
//! realtime database as one `POST` of `{"uid", "timestamp"}`, authorized by
//! the session token in the `auth` query parameter.
//!
//! What counts as a successful submission is a [`SubmissionPolicy`]:
//! [`TransportCompletion`] accepts any completed exchange and only logs
//! the status, [`StatusAware`] additionally requires a 2xx status.

use reqwest::Url;
use serde::Deserialize;
use tagwatch_core::constants::LOG_COLLECTION_PATH;
use tagwatch_core::{AccessLogEntry, CloudConfig};
use tracing::{debug, info, warn};

use crate::error::{SubmitError, TransportError};
use crate::session::AuthSession;
use crate::transport::{HttpResponse, HttpTransport, redact_auth, with_query};

/// Decides whether a completed exchange counts as a submitted entry.
pub trait SubmissionPolicy: Send + Sync {
    /// # Errors
    /// Returns `SubmitError::Rejected` when the response is not acceptable.
    fn evaluate(&self, response: &HttpResponse) -> Result<(), SubmitError>;
}

/// Any response is success. The status is only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportCompletion;

impl SubmissionPolicy for TransportCompletion {
    fn evaluate(&self, response: &HttpResponse) -> Result<(), SubmitError> {
        if !response.is_success() {
            warn!("Log POST returned status {}, counted as sent", response.status);
        }
        Ok(())
    }
}

/// Only 2xx responses are success.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusAware;

impl SubmissionPolicy for StatusAware {
    fn evaluate(&self, response: &HttpResponse) -> Result<(), SubmitError> {
        if response.is_success() {
            Ok(())
        } else {
            Err(SubmitError::Rejected {
                status: response.status,
                body: response.text(),
            })
        }
    }
}

/// Policy chosen at runtime from configuration.
#[derive(Debug, Clone, Copy)]
pub enum AnyPolicy {
    TransportCompletion(TransportCompletion),
    StatusAware(StatusAware),
}

impl AnyPolicy {
    /// `StatusAware` when `strict`, otherwise `TransportCompletion`.
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            AnyPolicy::StatusAware(StatusAware)
        } else {
            AnyPolicy::TransportCompletion(TransportCompletion)
        }
    }
}

impl Default for AnyPolicy {
    fn default() -> Self {
        AnyPolicy::TransportCompletion(TransportCompletion)
    }
}

impl SubmissionPolicy for AnyPolicy {
    fn evaluate(&self, response: &HttpResponse) -> Result<(), SubmitError> {
        match self {
            AnyPolicy::TransportCompletion(policy) => policy.evaluate(response),
            AnyPolicy::StatusAware(policy) => policy.evaluate(response),
        }
    }
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub status: u16,
    /// Key the database assigned to the new record, when it reported one.
    pub key: Option<String>,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

/// Posts access log entries for an authenticated session.
#[derive(Debug, Clone)]
pub struct LogSubmitter<P: SubmissionPolicy = TransportCompletion> {
    database_root: String,
    policy: P,
}

impl LogSubmitter<TransportCompletion> {
    /// Submitter for the database at `database_root`
    /// (e.g. `https://acme-default-rtdb.firebaseio.com`).
    pub fn new(database_root: impl Into<String>) -> Self {
        Self::with_policy(database_root, TransportCompletion)
    }
}

impl LogSubmitter<AnyPolicy> {
    /// Database root and policy from configuration.
    pub fn from_config(config: &CloudConfig, strict_status: bool) -> Self {
        Self::with_policy(config.database_root(), AnyPolicy::from_strict(strict_status))
    }
}

impl<P: SubmissionPolicy> LogSubmitter<P> {
    pub fn with_policy(database_root: impl Into<String>, policy: P) -> Self {
        Self {
            database_root: database_root.into().trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn database_root(&self) -> &str {
        &self.database_root
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Collection URL authorized with `token`.
    ///
    /// # Errors
    /// Returns `TransportError::InvalidUrl` if the database root does not
    /// parse as a URL.
    pub fn collection_url(&self, token: &str) -> Result<Url, TransportError> {
        let collection = format!("{}/{LOG_COLLECTION_PATH}", self.database_root);
        with_query(&collection, "auth", token)
    }

    /// Append one entry to the remote log.
    ///
    /// The entry is consumed whatever the outcome.
    ///
    /// # Errors
    /// - `SubmitError::NoToken` if the session holds no token; nothing is sent
    /// - `SubmitError::Transport` if the exchange did not complete
    /// - `SubmitError::Rejected` if the policy refuses the response
    pub async fn submit<H: HttpTransport>(
        &self,
        transport: &H,
        session: &AuthSession,
        entry: AccessLogEntry,
    ) -> Result<SubmitReceipt, SubmitError> {
        let Some(token) = session.current_token() else {
            debug!("No token for {}, not posting", entry.uid());
            return Err(SubmitError::NoToken);
        };

        let body = serde_json::to_string(&entry)?;
        let url = self.collection_url(token.expose())?;
        debug!("POST {} {}", redact_auth(url.as_str()), body);

        let response = match transport.post_json(url.as_str(), &body).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Log POST for {} failed: {}", entry.uid(), e);
                return Err(e.into());
            }
        };
        info!("Log POST status {}", response.status);

        self.policy.evaluate(&response)?;

        let key = response.json::<PushResponse>().ok().map(|push| push.name);
        Ok(SubmitReceipt {
            status: response.status,
            key,
        })
    }
}
