//! Error taxonomy for the reconciliation core
//!
//! Errors are typed inside the core and converted to [`Diagnostic`]s at the
//! operation boundary; nothing here ever crosses that boundary as an `Err`.
//!
//! [`Diagnostic`]: super::diagnostics::Diagnostic

use super::diagnostics::ErrorClass;
use thiserror::Error;

/// Failure of one of the two remote calls (fetch by id, apply by parts)
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request rejected locally before anything was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered, but with zero items for the identifier
    #[error("no videos found for ID")]
    NotFound { id: String },

    /// 401 / 403 from the API
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// A previous call in this session got a 401; no further calls are made
    #[error("access token was rejected by the YouTube API earlier in this session; reconfigure the provider with a valid token")]
    CredentialRejected,

    /// Any other non-success status
    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    /// Connection, TLS or timeout failure
    #[error("failed to reach the YouTube API: {0}")]
    Transport(#[source] reqwest::Error),

    /// Response body was not the JSON we expected
    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The invocation context was cancelled while the call was in flight
    #[error("operation cancelled while waiting for the YouTube API")]
    Cancelled,
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Diagnostic class this failure is reported under
    pub fn class(&self) -> ErrorClass {
        if self.is_not_found() {
            ErrorClass::NotFound
        } else {
            ErrorClass::Gateway
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

/// One schema or shape violation found while decoding a declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("attribute {attribute:?}: {reason}")]
pub struct ValidationError {
    pub attribute: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}

/// Everything that can stop a reconciler operation
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Unsupported(String),
}

impl From<ValidationError> for ReconcileError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(vec![err])
    }
}

impl From<Vec<ValidationError>> for ReconcileError {
    fn from(errs: Vec<ValidationError>) -> Self {
        Self::Validation(errs)
    }
}

/// Failure to bring up a provider session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("access_token must be set to a non-empty value")]
    MissingCredential,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] GatewayError),
}
