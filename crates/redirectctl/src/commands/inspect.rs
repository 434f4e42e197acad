//! Read-only handlers: show, plan, refresh.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::Tabled;

use redirectctl_core::{
    ApplicationRecord, CollectionDiff, Operation, Plan, PlannedAction, Reconciler,
};

use crate::cli::{GlobalOpts, OutputFormat, SelectArgs, ShowArgs};
use crate::config;
use crate::error::CliError;
use crate::output;
use crate::state::StateFile;

// ── Show ─────────────────────────────────────────────────────────────

fn application_detail(app: &ApplicationRecord) -> String {
    let grants = &app.web.implicit_grant_settings;
    let mut out = String::new();
    let _ = writeln!(out, "Application:    {}", app.app_id);
    let _ = writeln!(out, "Object ID:      {}", app.id);
    let _ = writeln!(out, "Display name:   {}", app.display_name);
    let _ = writeln!(
        out,
        "Implicit grant: access tokens {}, ID tokens {}",
        on_off(grants.enable_access_token_issuance),
        on_off(grants.enable_id_token_issuance)
    );
    let _ = write!(out, "Redirect URIs:");
    if app.web.redirect_uris.is_empty() {
        let _ = write!(out, " (none)");
    }
    for uri in &app.web.redirect_uris {
        let _ = write!(out, "\n  {uri}");
    }
    out
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

pub async fn show(
    reconciler: &Reconciler,
    args: &ShowArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let app = reconciler.show(&args.app_id).await?;
    let out = output::render_single(&global.output_format(), &app, application_detail, |a| {
        a.web.redirect_uris.join("\n")
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Plan ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NamedPlan {
    name: String,
    #[serde(flatten)]
    plan: Plan,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Entry")]
    name: String,
    #[tabled(rename = "Application")]
    app_id: String,
    #[tabled(rename = "Redirect URI")]
    redirect_uri: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Drift")]
    drift: String,
}

fn drift_cell(drift: Option<&CollectionDiff>, color: bool) -> String {
    match drift {
        Some(d) if !d.is_empty() => output::warn(&d.to_string(), color),
        Some(_) => "none".into(),
        None => "-".into(),
    }
}

fn plan_row(p: &NamedPlan, color: bool) -> PlanRow {
    let action = match p.plan.action {
        PlannedAction::NoChange => output::good(&p.plan.action.to_string(), color),
        _ => output::warn(&p.plan.action.to_string(), color),
    };
    PlanRow {
        name: p.name.clone(),
        app_id: p.plan.entry.app_id.clone(),
        redirect_uri: p.plan.entry.redirect_uri.clone(),
        state: p.plan.state.to_string(),
        action,
        drift: drift_cell(p.plan.drift.as_ref(), color),
    }
}

/// Compare tracked entries with live state. Never writes.
pub async fn plan(
    reconciler: &Reconciler,
    args: &SelectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = StateFile::load(&config::effective_state_path(global))?;
    let selected = state.select(args.name.as_deref())?;
    if selected.is_empty() && matches!(global.output_format(), OutputFormat::Table) {
        if !global.quiet {
            eprintln!("No tracked entries. Start with: redirectctl apply or redirectctl import");
        }
        return Ok(());
    }

    let mut plans = Vec::with_capacity(selected.len());
    for (name, observed) in selected {
        let plan = reconciler.plan(&observed.entry, Some(&observed)).await?;
        plans.push(NamedPlan { name, plan });
    }

    let color = output::should_color(&global.color_mode());
    let out = output::render_list(
        &global.output_format(),
        &plans,
        |p| plan_row(p, color),
        |p| format!("{}\t{}", p.name, p.plan.action),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Refresh ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshReport {
    name: String,
    app_id: String,
    redirect_uri: String,
    present: bool,
    drift: CollectionDiff,
}

#[derive(Tabled)]
struct RefreshRow {
    #[tabled(rename = "Entry")]
    name: String,
    #[tabled(rename = "Redirect URI")]
    redirect_uri: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Drift")]
    drift: String,
}

fn refresh_row(r: &RefreshReport, color: bool) -> RefreshRow {
    let status = if r.present {
        output::good("in sync", color)
    } else {
        output::bad("removed remotely", color)
    };
    RefreshRow {
        name: r.name.clone(),
        redirect_uri: r.redirect_uri.clone(),
        status,
        drift: drift_cell(Some(&r.drift), color),
    }
}

/// Re-read tracked entries. Entries whose URI disappeared are dropped from
/// state so the next apply re-creates them.
pub async fn refresh(
    reconciler: &Reconciler,
    args: &SelectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = config::effective_state_path(global);
    let mut state = StateFile::load(&path)?;
    let selected = state.select(args.name.as_deref())?;

    let mut reports = Vec::with_capacity(selected.len());
    for (name, previous) in selected {
        let outcome = reconciler
            .reconcile(Operation::Read, &previous.entry, Some(&previous))
            .await?;
        let observed = outcome.observed;
        let drift = observed.drift_since(&previous);
        let present = observed.is_present();

        if present {
            state.insert(name.clone(), observed);
        } else {
            tracing::warn!(
                entry = %name,
                redirect_uri = %previous.entry.redirect_uri,
                "redirect URI removed outside redirectctl; no longer tracked"
            );
            state.remove(&name);
        }

        reports.push(RefreshReport {
            name,
            app_id: previous.entry.app_id,
            redirect_uri: previous.entry.redirect_uri,
            present,
            drift,
        });
    }
    state.save(&path)?;

    let color = output::should_color(&global.color_mode());
    let out = output::render_list(
        &global.output_format(),
        &reports,
        |r| refresh_row(r, color),
        |r| format!("{}\t{}", r.name, if r.present { "present" } else { "removed" }),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
