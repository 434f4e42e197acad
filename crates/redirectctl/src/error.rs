//! CLI error types with miette diagnostics.
//!
//! Maps `ReconcileError` variants into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use redirectctl_config::ConfigError;
use redirectctl_core::{OperationKind, ReconcileError, TransientCause};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const DRIFT: i32 = 9;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(redirectctl::auth_failed),
        help(
            "Verify tenant_id, client_id, and the client secret for this profile.\n\
             Run: redirectctl config set-secret"
        )
    )]
    AuthFailed { message: String },

    #[error("No client secret configured for profile '{profile}'")]
    #[diagnostic(
        code(redirectctl::no_credentials),
        help(
            "Store one with: redirectctl config set-secret --profile {profile}\n\
             Or set the REDIRECTCTL_CLIENT_SECRET environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Remote state ─────────────────────────────────────────────────
    #[error("Application with appId '{app_id}' not found")]
    #[diagnostic(
        code(redirectctl::not_found),
        help("Check the application (client) ID, and that the signed-in client may read it.")
    )]
    NotFound { app_id: String },

    #[error("Redirect URI {redirect_uri} is not present on application {app_id}")]
    #[diagnostic(
        code(redirectctl::not_present),
        help("Add it with: redirectctl apply --app-id {app_id} --redirect-uri {redirect_uri}")
    )]
    NotPresent {
        app_id: String,
        redirect_uri: String,
    },

    #[error("Redirect URI {redirect_uri} already exists on application {app_id}")]
    #[diagnostic(
        code(redirectctl::already_exists),
        help(
            "Start tracking it instead: \
             redirectctl import --app-id {app_id} --redirect-uri {redirect_uri}"
        )
    )]
    AlreadyExists {
        app_id: String,
        redirect_uri: String,
    },

    #[error(
        "{operation} of {redirect_uri} on application {app_id}: application kept changing; \
         gave up after {attempts} attempts"
    )]
    #[diagnostic(
        code(redirectctl::conflict),
        help("Another writer is editing this application. Retry the command.")
    )]
    Conflict {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
        attempts: u32,
    },

    #[error("Redirect URI {redirect_uri} was removed from application {app_id} outside redirectctl")]
    #[diagnostic(
        code(redirectctl::drift),
        help(
            "Run: redirectctl refresh\n\
             Then apply again; the entry will be re-created."
        )
    )]
    Drift {
        app_id: String,
        redirect_uri: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error(
        "{operation} of {redirect_uri} on application {app_id}: \
         Graph rejected the request (HTTP {status}): {body}"
    )]
    #[diagnostic(code(redirectctl::rejected))]
    Rejected {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
        status: u16,
        body: String,
    },

    #[error(
        "{operation} of {redirect_uri} on application {app_id}: \
         could not reach Microsoft Graph: {reason}"
    )]
    #[diagnostic(
        code(redirectctl::connection_failed),
        help("Check network access to the auth and Graph hosts, then retry.")
    )]
    ConnectionFailed {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
        reason: String,
    },

    #[error(
        "{operation} of {redirect_uri} on application {app_id}: \
         request timed out: {reason}"
    )]
    #[diagnostic(
        code(redirectctl::timeout),
        help("Increase timeout with --timeout, then retry.")
    )]
    Timeout {
        operation: OperationKind,
        app_id: String,
        redirect_uri: String,
        reason: String,
    },

    #[error("Interrupted")]
    #[diagnostic(code(redirectctl::interrupted))]
    Interrupted,

    #[error("{message}")]
    #[diagnostic(code(redirectctl::internal))]
    Internal { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(redirectctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(redirectctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: redirectctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No tenant and client configured")]
    #[diagnostic(
        code(redirectctl::no_config),
        help(
            "Create a profile with: redirectctl config init\n\
             Expected at: {path}\n\
             Or pass --tenant-id, --client-id, and --client-secret."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(redirectctl::config))]
    Config(Box<ConfigError>),

    #[error("State file {path} is unreadable: {reason}")]
    #[diagnostic(
        code(redirectctl::state),
        help("Fix or remove the file; `redirectctl import` rebuilds entries.")
    )]
    State { path: String, reason: String },

    #[error("No tracked entry named '{name}'")]
    #[diagnostic(code(redirectctl::untracked), help("Run: redirectctl refresh to list tracked entries"))]
    Untracked { name: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(redirectctl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(redirectctl::json))]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NotPresent { .. } | Self::Untracked { .. } => {
                exit_code::NOT_FOUND
            }
            Self::AlreadyExists { .. } | Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Drift { .. } => exit_code::DRIFT,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Interrupted => exit_code::INTERRUPTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ReconcileError → CliError mapping ────────────────────────────────

impl From<ReconcileError> for CliError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::AuthFailure { message, .. } => Self::AuthFailed { message },

            ReconcileError::NotFound { app_id, .. } => Self::NotFound { app_id },

            ReconcileError::NotPresent {
                app_id,
                redirect_uri,
                ..
            } => Self::NotPresent {
                app_id,
                redirect_uri,
            },

            ReconcileError::AlreadyExists {
                app_id,
                redirect_uri,
                ..
            } => Self::AlreadyExists {
                app_id,
                redirect_uri,
            },

            ReconcileError::Drift {
                app_id,
                redirect_uri,
                ..
            } => Self::Drift {
                app_id,
                redirect_uri,
            },

            ReconcileError::Conflict {
                operation,
                app_id,
                redirect_uri,
                attempts,
            } => Self::Conflict {
                operation,
                app_id,
                redirect_uri,
                attempts,
            },

            ReconcileError::RemoteRejected {
                operation,
                app_id,
                redirect_uri,
                status,
                body,
            } => Self::Rejected {
                operation,
                app_id,
                redirect_uri,
                status,
                body,
            },

            ReconcileError::Transient {
                operation,
                app_id,
                redirect_uri,
                cause,
                reason,
            } => match cause {
                TransientCause::Timeout => Self::Timeout {
                    operation,
                    app_id,
                    redirect_uri,
                    reason,
                },
                TransientCause::Cancelled => Self::Interrupted,
                TransientCause::Network | TransientCause::Throttled => Self::ConnectionFailed {
                    operation,
                    app_id,
                    redirect_uri,
                    reason,
                },
            },

            ReconcileError::Invalid { field, reason } => Self::Validation {
                field: field.into(),
                reason,
            },

            ReconcileError::Unexpected { .. } => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_write_keeps_operation_and_uri() {
        let err = CliError::from(ReconcileError::RemoteRejected {
            operation: OperationKind::Create,
            app_id: "app-1".into(),
            redirect_uri: "https://b/cb".into(),
            status: 400,
            body: "Request_BadRequest".into(),
        });
        let message = err.to_string();
        assert!(message.starts_with("create of https://b/cb on application app-1"), "{message}");
        assert!(message.contains("HTTP 400"));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn transient_causes_pick_exit_codes_and_keep_context() {
        let transient = |cause| ReconcileError::Transient {
            operation: OperationKind::Delete,
            app_id: "app-1".into(),
            redirect_uri: "https://a/cb".into(),
            cause,
            reason: "boom".into(),
        };

        let timeout = CliError::from(transient(TransientCause::Timeout));
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);
        assert!(timeout.to_string().contains("delete of https://a/cb"));

        let network = CliError::from(transient(TransientCause::Throttled));
        assert_eq!(network.exit_code(), exit_code::CONNECTION);
        assert!(network.to_string().contains("on application app-1"));

        let cancelled = CliError::from(transient(TransientCause::Cancelled));
        assert_eq!(cancelled.exit_code(), exit_code::INTERRUPTED);
    }

    #[test]
    fn conflict_names_the_entry() {
        let err = CliError::from(ReconcileError::Conflict {
            operation: OperationKind::Update,
            app_id: "app-1".into(),
            redirect_uri: "https://c/cb".into(),
            attempts: 5,
        });
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
        assert!(err.to_string().contains("update of https://c/cb"));
        assert!(err.to_string().contains("5 attempts"));
    }
}
