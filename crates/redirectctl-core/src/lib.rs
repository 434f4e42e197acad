//! Reconciliation engine between `redirectctl-api` and hosts (the CLI, or
//! any orchestrator that persists declared and observed state).
//!
//! - **[`Reconciler`]** — Converges one [`ManagedEntry`] with the live
//!   `web.redirectUris` of its application through
//!   [`reconcile()`](Reconciler::reconcile), and answers dry runs through
//!   [`plan()`](Reconciler::plan). Every write is a compare-and-swap over
//!   Graph's full-object PATCH.
//!
//! - **[`TokenCache`]** — Reuses a client-credentials token until it nears
//!   expiry or Graph rejects it.
//!
//! - **[`presence`]** and **[`CollectionDiff`]** — Exact membership tests
//!   and added/removed reports between two observations.
//!
//! - **[`ReconcileError`]** — Typed failures carrying operation and entry
//!   context, with [`is_retryable()`](ReconcileError::is_retryable).

pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod presence;
pub mod reconciler;
pub mod token;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    DEFAULT_AUTH_HOST, DEFAULT_GRAPH_HOST, GraphConfig, RetryPolicy, UpdateStrategy,
};
pub use diff::CollectionDiff;
pub use error::{OperationKind, ReconcileError, TransientCause};
pub use model::{
    Action, EntryState, ManagedEntry, ObservedState, Operation, Plan, PlannedAction,
    ReconcileOutcome,
};
pub use reconciler::Reconciler;
pub use token::TokenCache;

// Hosts build credentials and records without depending on the API crate.
pub use redirectctl_api::{ApplicationRecord, ClientCredentials, TlsMode};
