// ── Domain model ──
//
// The declared unit of management, the observed snapshot handed back to the
// host, and the closed set of lifecycle operations the engine accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use redirectctl_api::ApplicationRecord;

use crate::diff::CollectionDiff;
use crate::error::ReconcileError;
use crate::presence;

/// One redirect URI declared for one application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedEntry {
    pub app_id: String,
    pub redirect_uri: String,
}

impl ManagedEntry {
    pub fn new(app_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Both fields are required and non-blank.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.app_id.trim().is_empty() {
            return Err(ReconcileError::Invalid {
                field: "appId",
                reason: "must not be empty".into(),
            });
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(ReconcileError::Invalid {
                field: "redirectUri",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for ManagedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.app_id, self.redirect_uri)
    }
}

/// Snapshot of the remote application after a read or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedState {
    /// The entry this observation was taken for.
    pub entry: ManagedEntry,
    pub application: ApplicationRecord,
    pub observed_at: DateTime<Utc>,
}

impl ObservedState {
    pub fn new(entry: ManagedEntry, application: ApplicationRecord) -> Self {
        Self {
            entry,
            application,
            observed_at: Utc::now(),
        }
    }

    pub fn redirect_uris(&self) -> &[String] {
        &self.application.web.redirect_uris
    }

    /// Whether the managed URI was present when observed.
    pub fn is_present(&self) -> bool {
        presence::contains(self.redirect_uris(), &self.entry.redirect_uri)
    }

    /// Changes to the collection between `previous` and this observation.
    pub fn drift_since(&self, previous: &ObservedState) -> CollectionDiff {
        CollectionDiff::between(previous.redirect_uris(), self.redirect_uris())
    }
}

// ── Operations ───────────────────────────────────────────────────────

/// Lifecycle operation requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    /// Move the entry from the previously observed URI to the declared one.
    Update,
    Delete,
}

/// What a reconciliation actually did to the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase", tag = "kind")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Added,
    Removed,
    Replaced { from: String, to: String },
    /// Nothing written; declared and live state already agreed.
    Unchanged,
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub operation: Operation,
    pub action: Action,
    /// Authoritative state, re-fetched after any write.
    pub observed: ObservedState,
}

// ── Planning ─────────────────────────────────────────────────────────

/// Where an entry stands, computed fresh from declared, tracked, and live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EntryState {
    /// Neither tracked nor live.
    Absent,
    /// Tracked (or declared) but missing from the live collection.
    PresentDeclaredOnly,
    /// Live but not tracked under this declaration.
    PresentObservedOnly,
    /// Tracked and live.
    Synced,
}

impl EntryState {
    /// `tracked` is true when the previous observation was taken for the
    /// same entry that is declared now.
    pub fn classify(tracked: bool, live: bool) -> Self {
        match (tracked, live) {
            (false, false) => Self::Absent,
            (true, false) => Self::PresentDeclaredOnly,
            (false, true) => Self::PresentObservedOnly,
            (true, true) => Self::Synced,
        }
    }
}

/// The operation an apply would run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PlannedAction {
    Create,
    Update { from: String, to: String },
    /// The URI is already live but nothing tracks it: Create would be
    /// rejected. Import it instead.
    Import,
    NoChange,
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update { from, to } => write!(f, "update {from} -> {to}"),
            Self::Import => f.write_str("import"),
            Self::NoChange => f.write_str("no change"),
        }
    }
}

/// Dry-run result for one declared entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub entry: ManagedEntry,
    pub state: EntryState,
    pub action: PlannedAction,
    /// Changes made outside this tool since the previous observation.
    pub drift: Option<CollectionDiff>,
    pub live: ApplicationRecord,
}

impl Plan {
    /// Derive a plan from the live record and the previous observation.
    pub fn compute(
        entry: &ManagedEntry,
        previous: Option<&ObservedState>,
        live: ApplicationRecord,
    ) -> Self {
        let live_uris = &live.web.redirect_uris;
        let declared_live = presence::contains(live_uris, &entry.redirect_uri);
        let tracked = previous.is_some_and(|p| p.entry == *entry);

        let action = match previous {
            Some(prev) if prev.entry.app_id == entry.app_id && prev.entry != *entry => {
                PlannedAction::Update {
                    from: prev.entry.redirect_uri.clone(),
                    to: entry.redirect_uri.clone(),
                }
            }
            Some(_) if tracked && declared_live => PlannedAction::NoChange,
            _ if declared_live => PlannedAction::Import,
            _ => PlannedAction::Create,
        };

        let drift = previous.map(|p| CollectionDiff::between(p.redirect_uris(), live_uris));

        Self {
            entry: entry.clone(),
            state: EntryState::classify(tracked, declared_live),
            action,
            drift,
            live,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use redirectctl_api::{ImplicitGrantRecord, WebRecord};

    use super::*;

    fn record(uris: &[&str]) -> ApplicationRecord {
        ApplicationRecord {
            app_id: "app-1".into(),
            display_name: "Portal".into(),
            id: "obj-1".into(),
            web: WebRecord {
                implicit_grant_settings: ImplicitGrantRecord {
                    enable_access_token_issuance: false,
                    enable_id_token_issuance: false,
                },
                redirect_uris: uris.iter().map(|s| (*s).to_owned()).collect(),
            },
        }
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert!(ManagedEntry::new("app-1", "https://a/cb").validate().is_ok());
        assert!(matches!(
            ManagedEntry::new(" ", "https://a/cb").validate(),
            Err(ReconcileError::Invalid { field: "appId", .. })
        ));
        assert!(matches!(
            ManagedEntry::new("app-1", "").validate(),
            Err(ReconcileError::Invalid {
                field: "redirectUri",
                ..
            })
        ));
    }

    #[test]
    fn classify_covers_all_states() {
        assert_eq!(EntryState::classify(false, false), EntryState::Absent);
        assert_eq!(
            EntryState::classify(true, false),
            EntryState::PresentDeclaredOnly
        );
        assert_eq!(
            EntryState::classify(false, true),
            EntryState::PresentObservedOnly
        );
        assert_eq!(EntryState::classify(true, true), EntryState::Synced);
    }

    #[test]
    fn plan_new_entry_is_create() {
        let entry = ManagedEntry::new("app-1", "https://b/cb");
        let plan = Plan::compute(&entry, None, record(&["https://a/cb"]));
        assert_eq!(plan.action, PlannedAction::Create);
        assert_eq!(plan.state, EntryState::Absent);
        assert!(plan.drift.is_none());
    }

    #[test]
    fn plan_untracked_live_entry_is_import() {
        let entry = ManagedEntry::new("app-1", "https://a/cb");
        let plan = Plan::compute(&entry, None, record(&["https://a/cb"]));
        assert_eq!(plan.action, PlannedAction::Import);
        assert_eq!(plan.state, EntryState::PresentObservedOnly);
    }

    #[test]
    fn plan_changed_declaration_is_update() {
        let previous = ObservedState::new(
            ManagedEntry::new("app-1", "https://a/cb"),
            record(&["https://a/cb"]),
        );
        let entry = ManagedEntry::new("app-1", "https://c/cb");
        let plan = Plan::compute(&entry, Some(&previous), record(&["https://a/cb"]));
        assert_eq!(
            plan.action,
            PlannedAction::Update {
                from: "https://a/cb".into(),
                to: "https://c/cb".into()
            }
        );
    }

    #[test]
    fn plan_reports_external_removal_as_create_with_drift() {
        let previous = ObservedState::new(
            ManagedEntry::new("app-1", "https://a/cb"),
            record(&["https://a/cb", "https://x/cb"]),
        );
        let entry = previous.entry.clone();
        let plan = Plan::compute(&entry, Some(&previous), record(&["https://x/cb"]));

        assert_eq!(plan.action, PlannedAction::Create);
        assert_eq!(plan.state, EntryState::PresentDeclaredOnly);
        let drift = plan.drift.unwrap();
        assert_eq!(drift.removed, vec!["https://a/cb".to_owned()]);
        assert!(drift.added.is_empty());
    }

    #[test]
    fn plan_synced_is_no_change() {
        let previous = ObservedState::new(
            ManagedEntry::new("app-1", "https://a/cb"),
            record(&["https://a/cb"]),
        );
        let plan = Plan::compute(&previous.entry, Some(&previous), record(&["https://a/cb"]));
        assert_eq!(plan.action, PlannedAction::NoChange);
        assert_eq!(plan.state, EntryState::Synced);
        assert!(plan.drift.unwrap().is_empty());
    }
}
