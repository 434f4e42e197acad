use thiserror::Error;

/// Top-level error type for the `redirectctl-api` crate.
///
/// Covers the token endpoint, the Graph `applications` collection, and the
/// transport underneath both. `redirectctl-core` maps these into
/// reconciliation failures carrying operation context.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// A required client-credential input was empty.
    #[error("Missing credential input: {field} must not be empty")]
    MissingInput { field: &'static str },

    /// The token endpoint answered with a non-success status.
    #[error("Token request rejected (HTTP {status}): {body}")]
    TokenRejected { status: u16, body: String },

    /// The token endpoint answered 2xx but the body was not a token response.
    #[error("Token response could not be decoded: {message}")]
    TokenDecode { message: String },

    /// The token endpoint answered 2xx with an empty `access_token`.
    #[error("Token endpoint returned an empty access token")]
    EmptyToken,

    /// Graph refused the bearer token (expired or revoked).
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup error (bad CA bundle, client build failure).
    #[error("TLS error: {0}")]
    Tls(String),

    /// The caller cancelled the request before it completed.
    #[error("Request cancelled")]
    Cancelled,

    // ── Graph ───────────────────────────────────────────────────────
    /// The `appId` filter matched no application.
    #[error("Application with appId '{app_id}' not found")]
    NotFound { app_id: String },

    /// `If-Match` did not match: the application changed after it was fetched.
    #[error("Application {id} changed since it was fetched (HTTP 412)")]
    PreconditionFailed { id: String },

    /// Any other non-success status from Graph.
    #[error("Graph rejected {method} {url} (HTTP {status}): {body}")]
    Rejected {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the credential is the problem and a fresh token
    /// might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } | Self::Cancelled => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` for every authentication-stage failure.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. }
                | Self::TokenRejected { .. }
                | Self::TokenDecode { .. }
                | Self::EmptyToken
                | Self::Unauthorized { .. }
        )
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenRejected { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::PreconditionFailed { .. } => Some(412),
            Self::Unauthorized { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Map a reqwest send failure, folding timeouts into [`Error::Timeout`].
    pub(crate) fn from_send(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else {
            Self::Transport(err)
        }
    }
}
