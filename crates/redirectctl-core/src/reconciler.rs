// ── Reconciler ──
//
// Converges one declared redirect URI with the live `web.redirectUris` of
// its application. Graph only offers whole-object replacement, so every
// mutation is fetch, compute, write, wrapped in a compare-and-swap loop:
// the version read is enforced at write time and a lost race re-fetches
// and recomputes from fresh state.

use redirectctl_api::{
    Application, ApplicationRecord, GraphClient, TokenClient, TransportConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{GraphConfig, RetryPolicy, UpdateStrategy};
use crate::error::{Context, OperationKind, ReconcileError};
use crate::model::{Action, ManagedEntry, ObservedState, Operation, Plan, ReconcileOutcome};
use crate::presence;
use crate::token::TokenCache;

/// Placeholder URI for lookups that are not tied to one entry.
const ANY_URI: &str = "*";

/// What the compute step wants done with the collection it was shown.
enum Step {
    Write(Vec<String>),
    Converged,
}

/// How a compare-and-swap loop ended.
enum Applied {
    Written,
    /// No write was needed; carries the application as fetched.
    Unchanged(Application),
}

/// Reconciliation engine for a single tenant and client identity.
///
/// Holds the token cache, so one instance authenticates once and reuses
/// the token across operations until it nears expiry.
pub struct Reconciler {
    graph: GraphClient,
    tokens: TokenCache,
    retry: RetryPolicy,
    strategy: UpdateStrategy,
    cancel: CancellationToken,
}

impl Reconciler {
    /// Build HTTP clients from `config`. Does no network I/O.
    pub fn new(config: &GraphConfig) -> Result<Self, ReconcileError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            ..TransportConfig::default()
        }
        .with_timeout(config.timeout);

        let invalid = |e: redirectctl_api::Error| ReconcileError::Invalid {
            field: "transport",
            reason: e.to_string(),
        };
        let tokens = TokenClient::new(config.auth_host.clone(), &transport).map_err(invalid)?;
        let graph = GraphClient::new(config.graph_host.clone(), &transport).map_err(invalid)?;

        Ok(Self::from_parts(
            graph,
            TokenCache::new(tokens, config.credentials.clone()),
            config.retry,
            config.update_strategy,
        ))
    }

    /// Assemble from pre-built clients.
    pub fn from_parts(
        graph: GraphClient,
        tokens: TokenCache,
        retry: RetryPolicy,
        strategy: UpdateStrategy,
    ) -> Self {
        Self {
            graph,
            tokens,
            retry,
            strategy,
            cancel: CancellationToken::new(),
        }
    }

    /// Race every call against `cancel`. A cancelled call fails as
    /// `Transient`; it never reports success.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run one lifecycle operation for `declared`.
    ///
    /// `observed` is the state recorded by the previous reconciliation. Only
    /// Update needs it: its entry names the URI being replaced.
    pub async fn reconcile(
        &self,
        operation: Operation,
        declared: &ManagedEntry,
        observed: Option<&ObservedState>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        declared.validate()?;

        match operation {
            Operation::Create => self.create(declared).await,
            Operation::Read => self.read(declared).await,
            Operation::Update => {
                let Some(previous) = observed else {
                    return Err(ReconcileError::Invalid {
                        field: "observed",
                        reason: "update needs the previously observed entry".into(),
                    });
                };
                if previous.entry.app_id != declared.app_id {
                    return Err(ReconcileError::Invalid {
                        field: "appId",
                        reason: format!(
                            "cannot move a redirect URI from {} to {}; delete and create instead",
                            previous.entry.app_id, declared.app_id
                        ),
                    });
                }
                self.update(declared, &previous.entry.redirect_uri).await
            }
            Operation::Delete => self.delete(declared).await,
        }
    }

    /// Append `entry.redirect_uri`. Fails with `AlreadyExists`, writing
    /// nothing, when it is already live.
    pub async fn create(&self, entry: &ManagedEntry) -> Result<ReconcileOutcome, ReconcileError> {
        entry.validate()?;
        let ctx = Context::new(OperationKind::Create, entry);
        let uri = entry.redirect_uri.as_str();

        self.mutate(ctx, |current| {
            if presence::contains(current, uri) {
                warn!(app_id = %entry.app_id, redirect_uri = uri, "redirect URI already present");
                return Err(ctx.already_exists());
            }
            Ok(Step::Write(presence::with_value(current, uri)))
        })
        .await?;

        info!(app_id = %entry.app_id, redirect_uri = uri, "redirect URI added");
        let observed = self.observe(ctx, entry).await?;
        Ok(ReconcileOutcome {
            operation: Operation::Create,
            action: Action::Added,
            observed,
        })
    }

    /// Fetch and report the live collection verbatim.
    pub async fn read(&self, entry: &ManagedEntry) -> Result<ReconcileOutcome, ReconcileError> {
        entry.validate()?;
        let ctx = Context::new(OperationKind::Read, entry);
        let observed = self.observe(ctx, entry).await?;
        Ok(ReconcileOutcome {
            operation: Operation::Read,
            action: Action::Unchanged,
            observed,
        })
    }

    /// Replace `old` with `entry.redirect_uri`.
    ///
    /// Fails with `Drift` when `old` is no longer live and `AlreadyExists`
    /// when the new value already is. Equal values degrade to a Read.
    pub async fn update(
        &self,
        entry: &ManagedEntry,
        old: &str,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        entry.validate()?;
        if old == entry.redirect_uri {
            debug!(redirect_uri = old, "update to the same value, reading instead");
            let mut outcome = self.read(entry).await?;
            outcome.operation = Operation::Update;
            return Ok(outcome);
        }

        let ctx = Context::new(OperationKind::Update, entry);
        let new = entry.redirect_uri.as_str();
        let precheck = |current: &[String]| -> Result<(), ReconcileError> {
            if !presence::contains(current, old) {
                return Err(ctx.drift(old));
            }
            if presence::contains(current, new) {
                return Err(ctx.already_exists());
            }
            Ok(())
        };

        match self.strategy {
            UpdateStrategy::SingleReplace => {
                self.mutate(ctx, |current| {
                    precheck(current)?;
                    let without = presence::without_value(current, old);
                    Ok(Step::Write(presence::with_value(&without, new)))
                })
                .await?;
            }
            UpdateStrategy::TwoPhase => {
                self.mutate(ctx, |current| {
                    precheck(current)?;
                    Ok(Step::Write(presence::without_value(current, old)))
                })
                .await?;
                debug!(from = old, to = new, "old value removed, appending new value");
                self.mutate(ctx, |current| {
                    if presence::contains(current, new) {
                        return Ok(Step::Converged);
                    }
                    Ok(Step::Write(presence::with_value(current, new)))
                })
                .await?;
            }
        }

        info!(app_id = %entry.app_id, from = old, to = new, "redirect URI replaced");
        let observed = self.observe(ctx, entry).await?;
        Ok(ReconcileOutcome {
            operation: Operation::Update,
            action: Action::Replaced {
                from: old.to_owned(),
                to: new.to_owned(),
            },
            observed,
        })
    }

    /// Remove every occurrence of `entry.redirect_uri`. An absent value is
    /// already converged: nothing is written.
    pub async fn delete(&self, entry: &ManagedEntry) -> Result<ReconcileOutcome, ReconcileError> {
        entry.validate()?;
        let ctx = Context::new(OperationKind::Delete, entry);
        let uri = entry.redirect_uri.as_str();

        let applied = self
            .mutate(ctx, |current| {
                if presence::contains(current, uri) {
                    Ok(Step::Write(presence::without_value(current, uri)))
                } else {
                    Ok(Step::Converged)
                }
            })
            .await?;

        let (action, observed) = match applied {
            Applied::Written => {
                info!(app_id = %entry.app_id, redirect_uri = uri, "redirect URI removed");
                (Action::Removed, self.observe(ctx, entry).await?)
            }
            Applied::Unchanged(app) => {
                warn!(
                    app_id = %entry.app_id,
                    redirect_uri = uri,
                    "redirect URI not present, nothing to delete"
                );
                let record = ApplicationRecord::from(&app);
                (Action::Unchanged, ObservedState::new(entry.clone(), record))
            }
        };

        Ok(ReconcileOutcome {
            operation: Operation::Delete,
            action,
            observed,
        })
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Look up an application without managing any entry.
    pub async fn show(&self, app_id: &str) -> Result<ApplicationRecord, ReconcileError> {
        if app_id.trim().is_empty() {
            return Err(ReconcileError::Invalid {
                field: "appId",
                reason: "must not be empty".into(),
            });
        }
        let ctx = Context {
            operation: OperationKind::Show,
            app_id,
            redirect_uri: ANY_URI,
        };
        let app = self.fetch(ctx).await?;
        Ok(ApplicationRecord::from(&app))
    }

    /// Start tracking an entry that already exists remotely.
    pub async fn import(&self, entry: &ManagedEntry) -> Result<ObservedState, ReconcileError> {
        entry.validate()?;
        let ctx = Context::new(OperationKind::Import, entry);
        let observed = self.observe(ctx, entry).await?;
        if !observed.is_present() {
            return Err(ctx.not_present());
        }
        Ok(observed)
    }

    /// Which operation an apply would run, and what changed remotely since
    /// `previous` was observed. Never writes.
    pub async fn plan(
        &self,
        entry: &ManagedEntry,
        previous: Option<&ObservedState>,
    ) -> Result<Plan, ReconcileError> {
        entry.validate()?;
        let ctx = Context::new(OperationKind::Plan, entry);
        let app = self.fetch(ctx).await?;
        let plan = Plan::compute(entry, previous, ApplicationRecord::from(&app));

        if let Some(drift) = plan.drift.as_ref().filter(|d| !d.is_empty()) {
            warn!(app_id = %entry.app_id, %drift, "redirect URIs changed since last observation");
        }
        Ok(plan)
    }

    // ── Compare-and-swap ─────────────────────────────────────────────

    /// Fetch, let `decide` compute the next collection, and write it only
    /// if the application is still at the version that was read. A lost
    /// race backs off, re-fetches, and asks `decide` again.
    async fn mutate<F>(&self, ctx: Context<'_>, mut decide: F) -> Result<Applied, ReconcileError>
    where
        F: FnMut(&[String]) -> Result<Step, ReconcileError>,
    {
        let mut backoff = self.retry.initial_backoff;
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let current = self.fetch(ctx).await?;
            let next = match decide(current.redirect_uris())? {
                Step::Converged => return Ok(Applied::Unchanged(current)),
                Step::Write(next) => next,
            };

            let candidate = current.with_redirect_uris(next);
            if self.compare_and_swap(ctx, &current, &candidate).await? {
                return Ok(Applied::Written);
            }

            warn!(
                app_id = ctx.app_id,
                attempt,
                max_attempts,
                "application changed during write, retrying"
            );
            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => {
                        return Err(ctx.error(redirectctl_api::Error::Cancelled));
                    }
                    () = tokio::time::sleep(backoff) => {}
                }
                backoff = backoff.saturating_mul(2);
            }
        }

        Err(ctx.conflict(max_attempts))
    }

    /// Write `next` if the application still matches `current`.
    ///
    /// Uses `If-Match` when Graph supplied an etag. Otherwise re-reads right
    /// before the write and compares against the snapshot. `Ok(false)`
    /// means the race was lost and nothing was written.
    async fn compare_and_swap(
        &self,
        ctx: Context<'_>,
        current: &Application,
        next: &Application,
    ) -> Result<bool, ReconcileError> {
        let etag = current.etag.as_deref();
        if etag.is_none() {
            let fresh = self.fetch(ctx).await?;
            if fresh != *current {
                debug!(app_id = ctx.app_id, "snapshot changed before write");
                return Ok(false);
            }
        }

        match self.replace(next, etag).await {
            Ok(()) => Ok(true),
            Err(redirectctl_api::Error::PreconditionFailed { .. }) => Ok(false),
            Err(e) => Err(ctx.error(e)),
        }
    }

    // ── Authenticated calls ──────────────────────────────────────────

    async fn observe(
        &self,
        ctx: Context<'_>,
        entry: &ManagedEntry,
    ) -> Result<ObservedState, ReconcileError> {
        let app = self.fetch(ctx).await?;
        Ok(ObservedState::new(
            entry.clone(),
            ApplicationRecord::from(&app),
        ))
    }

    async fn fetch(&self, ctx: Context<'_>) -> Result<Application, ReconcileError> {
        let credential = self.guard(self.tokens.get()).await.map_err(|e| ctx.error(e))?;
        let first = self
            .guard(self.graph.fetch_application(&credential, ctx.app_id))
            .await;

        let result = match first {
            Err(e) if e.is_auth_expired() => {
                warn!("Graph rejected the cached token, re-authenticating");
                self.tokens.invalidate().await;
                let credential = self.guard(self.tokens.get()).await.map_err(|e| ctx.error(e))?;
                self.guard(self.graph.fetch_application(&credential, ctx.app_id))
                    .await
            }
            other => other,
        };
        result.map_err(|e| ctx.error(e))
    }

    /// Raw API result so the caller can tell a lost race from a failure.
    async fn replace(
        &self,
        next: &Application,
        if_match: Option<&str>,
    ) -> Result<(), redirectctl_api::Error> {
        let credential = self.guard(self.tokens.get()).await?;
        match self
            .guard(self.graph.replace_application(&credential, next, if_match))
            .await
        {
            Err(e) if e.is_auth_expired() => {
                warn!("Graph rejected the cached token, re-authenticating");
                self.tokens.invalidate().await;
                let credential = self.guard(self.tokens.get()).await?;
                self.guard(self.graph.replace_application(&credential, next, if_match))
                    .await
            }
            other => other,
        }
    }

    /// Race `fut` against cancellation.
    async fn guard<T>(
        &self,
        fut: impl Future<Output = Result<T, redirectctl_api::Error>>,
    ) -> Result<T, redirectctl_api::Error> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(redirectctl_api::Error::Cancelled),
            result = fut => result,
        }
    }
}
