//! Authentication session.
//!
//! The terminal signs in once with email and password and keeps the
//! returned `idToken` for every later submission.
//!
//! # States
//!
//! ```text
//! Unauthenticated ──sign_in ok──► Authenticated ──sign_in ok──► Authenticated
//!        │                              │
//!        └────────sign_in error─────────┴──────────► Failed (terminal)
//! ```
//!
//! `Failed` holds no token. A session in that state refuses to sign in
//! again; the process has to be restarted with working credentials.

use std::fmt;

use serde::{Deserialize, Serialize};
use tagwatch_core::CloudConfig;
use tagwatch_core::constants::DEFAULT_IDENTITY_URL;
use tracing::{error, info, warn};

use crate::error::AuthError;
use crate::transport::{HttpTransport, with_query};

/// Opaque bearer token. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building request URLs.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(***)")
    }
}

/// Project API key plus account credentials.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &CloudConfig) -> Self {
        Self::new(&config.api_key, &config.email, &config.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(BearerToken),
    /// A sign-in attempt failed. Terminal.
    Failed { reason: String },
}

/// Sign-in state machine around the identity endpoint.
#[derive(Debug)]
pub struct AuthSession {
    identity_url: String,
    state: SessionState,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_URL)
    }
}

impl AuthSession {
    /// Unauthenticated session against `identity_url` (the password sign-in
    /// endpoint, without the `key` parameter).
    pub fn new(identity_url: impl Into<String>) -> Self {
        Self {
            identity_url: identity_url.into(),
            state: SessionState::Unauthenticated,
        }
    }

    pub fn from_config(config: &CloudConfig) -> Self {
        Self::new(&config.identity_url)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Token of an authenticated session.
    pub fn current_token(&self) -> Option<&BearerToken> {
        match &self.state {
            SessionState::Authenticated(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, SessionState::Failed { .. })
    }

    /// Exchange credentials for a token.
    ///
    /// Called again on an authenticated session this refreshes the token.
    ///
    /// # Errors
    /// Any failure moves the session to `Failed` and drops a previously held
    /// token. A failed session returns `AuthError::SessionFailed` without
    /// contacting the endpoint.
    pub async fn sign_in<H: HttpTransport>(
        &mut self,
        transport: &H,
        credentials: &Credentials,
    ) -> Result<BearerToken, AuthError> {
        if let SessionState::Failed { reason } = &self.state {
            warn!("Sign-in refused, session already failed: {}", reason);
            return Err(AuthError::SessionFailed(reason.clone()));
        }

        match self.exchange(transport, credentials).await {
            Ok(token) => {
                info!("Signed in as {}", credentials.email);
                self.state = SessionState::Authenticated(token.clone());
                Ok(token)
            }
            Err(e) => {
                error!("Sign-in failed: {}", e);
                self.state = SessionState::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    async fn exchange<H: HttpTransport>(
        &self,
        transport: &H,
        credentials: &Credentials,
    ) -> Result<BearerToken, AuthError> {
        let url = with_query(&self.identity_url, "key", &credentials.api_key)?;
        let body = serde_json::to_string(&SignInRequest {
            email: &credentials.email,
            password: &credentials.password,
            return_secure_token: true,
        })
        .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        let response = transport.post_json(url.as_str(), &body).await?;
        info!("Sign-in HTTP status {}", response.status);

        if !response.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| response.text());
            return Err(AuthError::Rejected {
                status: response.status,
                message,
            });
        }

        let parsed: SignInResponse = response
            .json()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        match parsed.id_token {
            Some(token) if !token.is_empty() => Ok(BearerToken::new(token)),
            _ => Err(AuthError::MissingToken),
        }
    }
}
