// ── Reconciliation error types ──
//
// What hosts see when an operation fails. Raw HTTP statuses only survive
// inside `RemoteRejected`; everything else is translated into the outcome
// the host has to act on. Every variant names the operation and the entry
// it was working on.

use thiserror::Error;

use crate::model::ManagedEntry;

/// Which step produced an error. Broader than [`Operation`](crate::Operation)
/// so planning and lookups can be named too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    Plan,
    Import,
    Show,
}

/// Why a transient failure happened. Hosts pick exit codes and hints from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TransientCause {
    Timeout,
    Cancelled,
    /// Connection, DNS, or TLS failure.
    Network,
    /// 429 or 5xx from Graph.
    Throttled,
}

/// Unified error type for the reconciliation engine.
#[derive(Debug, Error)]
pub enum ReconcileError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("{operation} {app_id}: authentication failed: {message}")]
    AuthFailure {
        operation: OperationKind,
        app_id: String,
        message: String,
    },

    // ── Remote state ─────────────────────────────────────────────────
    #[error("{operation} {redirect_uri}: application with appId '{app_id}' not found")]
    NotFound {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
    },

    #[error("{operation}: redirect URI {redirect_uri} is not present on application {app_id}")]
    NotPresent {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
    },

    #[error("{operation}: redirect URI {redirect_uri} already exists on application {app_id}")]
    AlreadyExists {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
    },

    /// The value an Update expected to replace is no longer live.
    #[error(
        "{operation}: redirect URI {redirect_uri} was removed from application {app_id} outside this tool"
    )]
    Drift {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
    },

    // ── Write failures ───────────────────────────────────────────────
    #[error("{operation} {redirect_uri} on {app_id}: Graph rejected the request (HTTP {status}): {body}")]
    RemoteRejected {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
        status: u16,
        body: String,
    },

    /// Compare-and-swap attempts exhausted.
    #[error(
        "{operation} {redirect_uri} on {app_id}: application kept changing, gave up after {attempts} attempts"
    )]
    Conflict {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
        attempts: u32,
    },

    /// Network failure, timeout, rate limit, or cancellation.
    #[error("{operation} {redirect_uri} on {app_id}: {reason}")]
    Transient {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
        cause: TransientCause,
        reason: String,
    },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{operation} {redirect_uri} on {app_id}: {message}")]
    Unexpected {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
        message: String,
    },
}

impl ReconcileError {
    /// Whether running the same operation again may succeed without any
    /// change on the caller's side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Conflict { .. })
    }
}

// ── Conversion from API errors ───────────────────────────────────────

/// Operation and entry an API error is attributed to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a> {
    pub operation: OperationKind,
    pub app_id: &'a str,
    pub redirect_uri: &'a str,
}

impl<'a> Context<'a> {
    pub fn new(operation: OperationKind, entry: &'a ManagedEntry) -> Self {
        Self {
            operation,
            app_id: &entry.app_id,
            redirect_uri: &entry.redirect_uri,
        }
    }

    pub fn already_exists(&self) -> ReconcileError {
        ReconcileError::AlreadyExists {
            operation: self.operation,
            app_id: self.app_id.to_owned(),
            redirect_uri: self.redirect_uri.to_owned(),
        }
    }

    pub fn not_present(&self) -> ReconcileError {
        ReconcileError::NotPresent {
            operation: self.operation,
            app_id: self.app_id.to_owned(),
            redirect_uri: self.redirect_uri.to_owned(),
        }
    }

    pub fn drift(&self, missing: &str) -> ReconcileError {
        ReconcileError::Drift {
            operation: self.operation,
            app_id: self.app_id.to_owned(),
            redirect_uri: missing.to_owned(),
        }
    }

    pub fn conflict(&self, attempts: u32) -> ReconcileError {
        ReconcileError::Conflict {
            operation: self.operation,
            app_id: self.app_id.to_owned(),
            redirect_uri: self.redirect_uri.to_owned(),
            attempts,
        }
    }

    /// Translate a transport-layer error.
    pub fn error(&self, err: redirectctl_api::Error) -> ReconcileError {
        use redirectctl_api::Error as Api;

        let operation = self.operation;
        let app_id = self.app_id.to_owned();
        let redirect_uri = self.redirect_uri.to_owned();

        if err.is_authentication() {
            return ReconcileError::AuthFailure {
                operation,
                app_id,
                message: err.to_string(),
            };
        }
        if err.is_transient() {
            let cause = match &err {
                Api::Timeout { .. } => TransientCause::Timeout,
                Api::Transport(e) if e.is_timeout() => TransientCause::Timeout,
                Api::Cancelled => TransientCause::Cancelled,
                Api::Rejected { .. } => TransientCause::Throttled,
                _ => TransientCause::Network,
            };
            return ReconcileError::Transient {
                operation,
                app_id,
                redirect_uri,
                cause,
                reason: err.to_string(),
            };
        }

        match err {
            Api::NotFound { .. } => ReconcileError::NotFound {
                operation,
                app_id,
                redirect_uri,
            },
            Api::Rejected { status, body, .. } => ReconcileError::RemoteRejected {
                operation,
                app_id,
                redirect_uri,
                status,
                body,
            },
            Api::PreconditionFailed { .. } => ReconcileError::Conflict {
                operation,
                app_id,
                redirect_uri,
                attempts: 1,
            },
            // Connection-level failures that reqwest does not flag as
            // timeout/connect still leave the remote untouched.
            Api::Transport(e) => ReconcileError::Transient {
                operation,
                app_id,
                redirect_uri,
                cause: TransientCause::Network,
                reason: e.to_string(),
            },
            other => ReconcileError::Unexpected {
                operation,
                app_id,
                redirect_uri,
                message: other.to_string(),
            },
        }
    }
}
