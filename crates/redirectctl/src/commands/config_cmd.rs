//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Input, Select};
use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "max_attempts = {}", cfg.defaults.max_attempts);
    let _ = writeln!(out, "update_strategy = \"{}\"", cfg.defaults.update_strategy);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "tenant_id = \"{}\"", p.tenant_id);
        let _ = writeln!(out, "client_id = \"{}\"", p.client_id);
        if p.client_secret.is_some() {
            let _ = writeln!(out, "client_secret = \"****\"");
        }
        if let Some(ref env) = p.client_secret_env {
            let _ = writeln!(out, "client_secret_env = \"{env}\"");
        }
        if let Some(ref scope) = p.scope {
            let _ = writeln!(out, "scope = \"{scope}\"");
        }
        if let Some(ref host) = p.auth_host {
            let _ = writeln!(out, "auth_host = \"{host}\"");
        }
        if let Some(ref host) = p.graph_host {
            let _ = writeln!(out, "graph_host = \"{host}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(attempts) = p.max_attempts {
            let _ = writeln!(out, "max_attempts = {attempts}");
        }
        if let Some(strategy) = p.update_strategy {
            let _ = writeln!(out, "update_strategy = \"{strategy}\"");
        }
    }

    out
}

/// Copy of the config safe to serialize for `config show -o json`.
fn redacted(cfg: &Config) -> Config {
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            ..cfg.defaults
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let mut p = p.clone();
                if p.client_secret.is_some() {
                    p.client_secret = Some("****".into());
                }
                (name.clone(), p)
            })
            .collect(),
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_secret() -> Result<String, CliError> {
    let secret = rpassword::prompt_password("Client secret: ").map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "client_secret".into(),
            reason: "client secret cannot be empty".into(),
        });
    }
    Ok(secret)
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

#[derive(Serialize)]
struct Paths {
    config: String,
    state: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => init(global),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global));
            let out = output::render_single(&global.output_format(), &cfg, format_config_redacted, |_| {
                config::effective_config_path(global).display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            let paths = Paths {
                config: config::effective_config_path(global).display().to_string(),
                state: config::effective_state_path(global).display().to_string(),
            };
            let out = output::render_single(
                &global.output_format(),
                &paths,
                |p| format!("config: {}\nstate:  {}", p.config, p.state),
                |p| p.config.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── SetSecret ───────────────────────────────────────────────
        ConfigCommand::SetSecret { profile } => {
            let cfg = config::load(global);
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let secret = prompt_secret()?;
            redirectctl_config::store_client_secret(&profile_name, &secret)?;
            eprintln!("✓ Client secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::effective_config_path(global);
    eprintln!("redirectctl configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Tenant and client
    let tenant_id: String = Input::new()
        .with_prompt("Directory (tenant) ID")
        .interact_text()
        .map_err(prompt_err)?;
    let client_id: String = Input::new()
        .with_prompt("Application (client) ID used to sign in")
        .interact_text()
        .map_err(prompt_err)?;

    // 3. Secret storage
    let choices = &[
        "Store in system keyring (recommended)",
        "Read from an environment variable",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where should the client secret come from?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let mut profile = Profile {
        tenant_id,
        client_id,
        ..Profile::default()
    };
    match selection {
        0 => {
            let secret = prompt_secret()?;
            redirectctl_config::store_client_secret(&profile_name, &secret)?;
            eprintln!("   ✓ Client secret stored in system keyring");
        }
        1 => {
            let env_name: String = Input::new()
                .with_prompt("Environment variable name")
                .default("AZURE_CLIENT_SECRET".into())
                .interact_text()
                .map_err(prompt_err)?;
            profile.client_secret_env = Some(env_name);
        }
        _ => profile.client_secret = Some(prompt_secret()?),
    }

    // 4. Merge into any existing config
    let mut cfg = config::load_config_from(&config_path).unwrap_or_else(|_| Config {
        default_profile: None,
        defaults: Defaults::default(),
        profiles: HashMap::new(),
    });
    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(profile_name.clone());
    }

    config::save_config_to(&cfg, &config_path)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Test it: redirectctl show --app-id <application-id>");
    Ok(())
}
