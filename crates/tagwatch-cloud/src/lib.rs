//! Remote services of the tagwatch terminal.
//!
//! - [`session`]: password sign-in and the resulting bearer token
//! - [`submitter`]: access log submission with a pluggable success policy
//! - [`transport`]: the HTTP seam, with [`ReqwestTransport`] as the
//!   production implementation pinned to a single root certificate

pub mod client;
pub mod error;
pub mod mock;
pub mod session;
pub mod submitter;
pub mod transport;

pub use client::ReqwestTransport;
pub use error::{AuthError, SubmitError, TransportError};
pub use session::{AuthSession, BearerToken, Credentials, SessionState};
pub use submitter::{
    AnyPolicy, LogSubmitter, StatusAware, SubmissionPolicy, SubmitReceipt, TransportCompletion,
};
pub use transport::{HttpResponse, HttpTransport};
