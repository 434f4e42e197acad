//! CLI configuration: thin wrapper around `redirectctl_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--tenant-id,
//! --client-secret, --graph-host, etc.) on top of the shared profile logic.

use std::path::PathBuf;

use clap::ValueEnum;
use secrecy::SecretString;

use redirectctl_core::{GraphConfig, UpdateStrategy};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat, UpdateStrategyArg};
use crate::error::CliError;

pub use redirectctl_config::{
    Config, Defaults, Profile, config_path, load_config_from, save_config_to, state_path,
};

// ── Paths ───────────────────────────────────────────────────────────

/// Config file in use: `--config` or the platform default.
pub fn effective_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// State file in use: `--state` or the platform default.
pub fn effective_state_path(global: &GlobalOpts) -> PathBuf {
    global.state.clone().unwrap_or_else(state_path)
}

/// Load the config file in use, falling back to defaults when unreadable.
pub fn load(global: &GlobalOpts) -> Config {
    let path = effective_config_path(global);
    load_config_from(&path).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
        Config::default()
    })
}

/// Fill `--output` and `--color` from `[defaults]` when neither flag nor
/// environment set them. Unknown values are ignored with a warning.
pub fn apply_display_defaults(global: &mut GlobalOpts, defaults: &Defaults) {
    if global.output.is_none() {
        match OutputFormat::from_str(&defaults.output, true) {
            Ok(format) => global.output = Some(format),
            Err(e) => tracing::warn!(value = %defaults.output, error = %e, "ignoring defaults.output"),
        }
    }
    if global.color.is_none() {
        match ColorMode::from_str(&defaults.color, true) {
            Ok(mode) => global.color = Some(mode),
            Err(e) => tracing::warn!(value = %defaults.color, error = %e, "ignoring defaults.color"),
        }
    }
}

// ── Profile resolution ──────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

impl From<UpdateStrategyArg> for UpdateStrategy {
    fn from(arg: UpdateStrategyArg) -> Self {
        match arg {
            UpdateStrategyArg::SingleReplace => Self::SingleReplace,
            UpdateStrategyArg::TwoPhase => Self::TwoPhase,
        }
    }
}

/// Build a `GraphConfig` from the config file, active profile, and flags.
///
/// Flag values override the profile. Without a matching profile, the
/// tenant, client, and secret must all come from flags or environment.
pub fn resolve_graph_config(global: &GlobalOpts) -> Result<GraphConfig, CliError> {
    let cfg = load(global);
    let profile_name = active_profile_name(global, &cfg);

    let explicit = global.profile.is_some();
    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if explicit => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            if global.tenant_id.is_none() || global.client_id.is_none() {
                return Err(CliError::NoConfig {
                    path: effective_config_path(global).display().to_string(),
                });
            }
            Profile::default()
        }
    };

    let profile = apply_overrides(base, global);

    // Secret: flag > profile chain (env var, keyring, plaintext)
    let secret = match global.client_secret {
        Some(ref secret) => SecretString::from(secret.clone()),
        None => redirectctl_config::resolve_client_secret(&profile, &profile_name)?,
    };

    Ok(redirectctl_config::build_graph_config(
        &profile,
        &cfg.defaults,
        secret,
    )?)
}

/// Layer flag values over a profile.
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref tenant_id) = global.tenant_id {
        profile.tenant_id.clone_from(tenant_id);
    }
    if let Some(ref client_id) = global.client_id {
        profile.client_id.clone_from(client_id);
    }
    if global.auth_host.is_some() {
        profile.auth_host.clone_from(&global.auth_host);
    }
    if global.graph_host.is_some() {
        profile.graph_host.clone_from(&global.graph_host);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    if global.max_attempts.is_some() {
        profile.max_attempts = global.max_attempts;
    }
    if let Some(strategy) = global.update_strategy {
        profile.update_strategy = Some(strategy.into());
    }
    profile
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["redirectctl"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["config", "path"]);
        match Cli::try_parse_from(argv) {
            Ok(cli) => cli.global,
            Err(e) => panic!("{e}"),
        }
    }

    fn defaults(output: &str, color: &str) -> Defaults {
        Defaults {
            output: output.into(),
            color: color.into(),
            ..Defaults::default()
        }
    }

    #[test]
    fn config_defaults_fill_unset_display_flags() {
        let mut opts = global(&[]);
        apply_display_defaults(&mut opts, &defaults("json-compact", "never"));
        assert!(matches!(opts.output_format(), OutputFormat::JsonCompact));
        assert!(matches!(opts.color_mode(), ColorMode::Never));
    }

    #[test]
    fn flags_win_over_config_defaults() {
        let mut opts = global(&["-o", "yaml", "--color", "always"]);
        apply_display_defaults(&mut opts, &defaults("json", "never"));
        assert!(matches!(opts.output_format(), OutputFormat::Yaml));
        assert!(matches!(opts.color_mode(), ColorMode::Always));
    }

    #[test]
    fn unknown_config_values_fall_back() {
        let mut opts = global(&[]);
        apply_display_defaults(&mut opts, &defaults("xml", "sometimes"));
        assert!(matches!(opts.output_format(), OutputFormat::Table));
        assert!(matches!(opts.color_mode(), ColorMode::Auto));
    }
}
