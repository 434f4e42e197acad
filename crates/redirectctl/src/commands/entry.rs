//! Entry lifecycle handlers: apply, import, destroy.
//!
//! Each handler loads the state file, runs the reconciler, and records the
//! new observation only after Graph accepted the change.

use std::fmt::Write as _;

use serde::Serialize;

use redirectctl_core::{
    Action, ManagedEntry, ObservedState, Operation, PlannedAction, ReconcileOutcome, Reconciler,
};

use crate::cli::{EntryArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;
use crate::state::StateFile;

use super::util;

/// What a lifecycle command reports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryReport {
    name: String,
    #[serde(flatten)]
    outcome: ReconcileOutcome,
}

fn detail(report: &EntryReport, color: bool) -> String {
    let entry = &report.outcome.observed.entry;
    let action = match &report.outcome.action {
        Action::Added => output::good("added", color),
        Action::Removed => output::bad("removed", color),
        Action::Replaced { from, to } => output::warn(&format!("replaced {from} -> {to}"), color),
        Action::Unchanged => "unchanged".to_owned(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Entry:          {}", report.name);
    let _ = writeln!(out, "Application:    {}", entry.app_id);
    let _ = writeln!(
        out,
        "Display name:   {}",
        report.outcome.observed.application.display_name
    );
    let _ = writeln!(out, "Redirect URI:   {}", entry.redirect_uri);
    let _ = writeln!(out, "Action:         {action}");
    let _ = write!(out, "Redirect URIs:");
    for uri in report.outcome.observed.redirect_uris() {
        let _ = write!(out, "\n  {uri}");
    }
    out
}

fn print_report(report: &EntryReport, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color_mode());
    let out = output::render_single(
        &global.output_format(),
        report,
        |r| detail(r, color),
        |r| r.outcome.action.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// A name may only ever track entries of one application.
fn check_same_app(name: &str, previous: &ObservedState, entry: &ManagedEntry) -> Result<(), CliError> {
    if previous.entry.app_id == entry.app_id {
        return Ok(());
    }
    Err(CliError::Validation {
        field: "app-id".into(),
        reason: format!(
            "entry '{name}' tracks application {}; destroy it before pointing it at {}",
            previous.entry.app_id, entry.app_id
        ),
    })
}

// ── Apply ────────────────────────────────────────────────────────────

/// Converge the declared entry: create it, or move the tracked URI to it.
pub async fn apply(
    reconciler: &Reconciler,
    args: EntryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (name, entry) = util::entry_from_args(args);
    let path = config::effective_state_path(global);
    let mut state = StateFile::load(&path)?;
    let previous = state.get(&name);
    if let Some(prev) = previous {
        check_same_app(&name, prev, &entry)?;
    }

    let plan = reconciler.plan(&entry, previous).await?;
    tracing::info!(entry = %name, action = %plan.action, state = %plan.state, "applying");

    let outcome = match plan.action {
        PlannedAction::Create => reconciler.reconcile(Operation::Create, &entry, None).await?,
        PlannedAction::Update { .. } => {
            reconciler
                .reconcile(Operation::Update, &entry, previous)
                .await?
        }
        PlannedAction::NoChange => reconciler.reconcile(Operation::Read, &entry, None).await?,
        PlannedAction::Import => {
            return Err(CliError::AlreadyExists {
                app_id: entry.app_id,
                redirect_uri: entry.redirect_uri,
            });
        }
    };

    state.insert(name.clone(), outcome.observed.clone());
    state.save(&path)?;
    print_report(&EntryReport { name, outcome }, global)
}

// ── Import ───────────────────────────────────────────────────────────

/// Start tracking a URI that is already live.
pub async fn import(
    reconciler: &Reconciler,
    args: EntryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (name, entry) = util::entry_from_args(args);
    let path = config::effective_state_path(global);
    let mut state = StateFile::load(&path)?;
    if let Some(prev) = state.get(&name) {
        if prev.entry != entry {
            return Err(CliError::Validation {
                field: "name".into(),
                reason: format!(
                    "entry '{name}' already tracks {}; destroy it or pick another --name",
                    prev.entry
                ),
            });
        }
    }

    let observed = reconciler.import(&entry).await?;
    state.insert(name.clone(), observed.clone());
    state.save(&path)?;

    let outcome = ReconcileOutcome {
        operation: Operation::Read,
        action: Action::Unchanged,
        observed,
    };
    print_report(&EntryReport { name, outcome }, global)
}

// ── Destroy ──────────────────────────────────────────────────────────

/// Remove the URI remotely, then forget it.
pub async fn destroy(
    reconciler: &Reconciler,
    args: EntryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (name, entry) = util::entry_from_args(args);

    let prompt = format!(
        "Remove {} from application {}?",
        entry.redirect_uri, entry.app_id
    );
    if !util::confirm("destroy", &prompt, global.yes)? {
        return Ok(());
    }

    let path = config::effective_state_path(global);
    let mut state = StateFile::load(&path)?;

    let outcome = reconciler.reconcile(Operation::Delete, &entry, None).await?;

    if state.get(&name).is_some_and(|prev| prev.entry == entry) {
        state.remove(&name);
        state.save(&path)?;
    } else {
        tracing::debug!(entry = %name, "destroyed entry was not tracked under this name");
    }

    print_report(&EntryReport { name, outcome }, global)
}
