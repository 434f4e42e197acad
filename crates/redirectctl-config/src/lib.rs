//! Configuration for redirectctl.
//!
//! TOML profiles, client-secret resolution (env + keyring + plaintext),
//! and translation to `redirectctl_core::GraphConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use redirectctl_core::{
    ClientCredentials, DEFAULT_AUTH_HOST, DEFAULT_GRAPH_HOST, GraphConfig, RetryPolicy, TlsMode,
    UpdateStrategy,
};

/// Keyring service name; entries are keyed `{profile}/client-secret`.
pub const KEYRING_SERVICE: &str = "redirectctl";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no client secret configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named tenant/client profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile named `name`, or the default profile when `None`.
    pub fn profile(&self, name: Option<&str>) -> Option<(&str, &Profile)> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub update_strategy: UpdateStrategy,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            max_attempts: default_max_attempts(),
            update_strategy: UpdateStrategy::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    5
}

/// A named tenant + client identity.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Directory (tenant) ID.
    pub tenant_id: String,

    /// Application (client) ID used to authenticate. Not necessarily the
    /// application whose redirect URIs are managed.
    pub client_id: String,

    /// Client secret (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret_env: Option<String>,

    /// Token scope; `https://graph.microsoft.com/.default` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_type: Option<String>,

    /// Token endpoint host root (sovereign clouds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_host: Option<String>,

    /// Graph host root (sovereign clouds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_host: Option<String>,

    /// Path to an extra CA certificate (TLS-intercepting proxies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override timeout (seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override compare-and-swap attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_strategy: Option<UpdateStrategy>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "redirectctl", "redirectctl")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the state file.
pub fn state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

fn dirs_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("redirectctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `REDIRECTCTL_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("REDIRECTCTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/client-secret"))
}

/// Resolve the client secret from the credential chain (no CLI flag step).
pub fn resolve_client_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's client_secret_env → env var lookup
    if let Some(ref env_name) = profile.client_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref secret) = profile.client_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a client secret in the system keyring for `profile_name`.
pub fn store_client_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(secret)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_host(field: &str, value: Option<&str>, default: &str) -> Result<Url, ConfigError> {
    let raw = value.unwrap_or(default);
    Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `GraphConfig` from a profile with an already-resolved secret.
///
/// Profile values override `defaults`.
pub fn build_graph_config(
    profile: &Profile,
    defaults: &Defaults,
    client_secret: SecretString,
) -> Result<GraphConfig, ConfigError> {
    if profile.tenant_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "tenant_id".into(),
            reason: "must not be empty".into(),
        });
    }
    if profile.client_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "client_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let max_attempts = profile.max_attempts.unwrap_or(defaults.max_attempts);
    if max_attempts == 0 {
        return Err(ConfigError::Validation {
            field: "max_attempts".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut credentials = ClientCredentials::new(
        profile.tenant_id.clone(),
        profile.client_id.clone(),
        client_secret,
    );
    credentials.scope.clone_from(&profile.scope);
    if let Some(ref grant_type) = profile.grant_type {
        credentials.grant_type.clone_from(grant_type);
    }

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    Ok(GraphConfig {
        auth_host: parse_host("auth_host", profile.auth_host.as_deref(), DEFAULT_AUTH_HOST)?,
        graph_host: parse_host("graph_host", profile.graph_host.as_deref(), DEFAULT_GRAPH_HOST)?,
        credentials,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        tls,
        retry: RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        },
        update_strategy: profile.update_strategy.unwrap_or(defaults.update_strategy),
    })
}

/// Build a `GraphConfig` from a profile, without CLI flag overrides.
pub fn profile_to_graph_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GraphConfig, ConfigError> {
    let secret = resolve_client_secret(profile, profile_name)?;
    build_graph_config(profile, defaults, secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn profile() -> Profile {
        Profile {
            tenant_id: "tenant-1".into(),
            client_id: "client-1".into(),
            client_secret: Some("plain".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn build_uses_public_cloud_defaults() {
        let cfg = build_graph_config(
            &profile(),
            &Defaults::default(),
            SecretString::from("s".to_owned()),
        )
        .unwrap();

        assert_eq!(cfg.auth_host.as_str(), "https://login.microsoftonline.com/");
        assert_eq!(cfg.graph_host.as_str(), "https://graph.microsoft.com/");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.update_strategy, UpdateStrategy::SingleReplace);
        assert_eq!(cfg.credentials.grant_type, "client_credentials");
        assert!(matches!(cfg.tls, TlsMode::System));
    }

    #[test]
    fn profile_overrides_defaults() {
        let mut p = profile();
        p.timeout = Some(5);
        p.max_attempts = Some(2);
        p.update_strategy = Some(UpdateStrategy::TwoPhase);
        p.graph_host = Some("https://graph.microsoft.us".into());
        p.scope = Some("https://graph.microsoft.us/.default".into());

        let cfg = build_graph_config(&p, &Defaults::default(), SecretString::from("s".to_owned()))
            .unwrap();

        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.retry.max_attempts, 2);
        assert_eq!(cfg.update_strategy, UpdateStrategy::TwoPhase);
        assert_eq!(cfg.graph_host.host_str(), Some("graph.microsoft.us"));
        assert_eq!(cfg.credentials.scope(), "https://graph.microsoft.us/.default");
    }

    #[test]
    fn build_rejects_bad_input() {
        let mut p = profile();
        p.tenant_id = String::new();
        let err = build_graph_config(&p, &Defaults::default(), SecretString::from("s".to_owned()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "tenant_id"));

        let mut p = profile();
        p.auth_host = Some("not a url".into());
        let err = build_graph_config(&p, &Defaults::default(), SecretString::from("s".to_owned()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "auth_host"));

        let mut p = profile();
        p.max_attempts = Some(0);
        assert!(
            build_graph_config(&p, &Defaults::default(), SecretString::from("s".to_owned()))
                .is_err()
        );
    }

    #[test]
    fn plaintext_secret_is_last_resort() {
        let mut p = profile();
        p.client_secret_env = Some("REDIRECTCTL_TEST_UNSET_SECRET_VAR".into());
        let secret = resolve_client_secret(&p, "redirectctl-test-no-such-profile").unwrap();
        assert_eq!(secret.expose_secret(), "plain");
    }

    #[test]
    fn missing_secret_is_no_credentials() {
        let mut p = profile();
        p.client_secret = None;
        let err = resolve_client_secret(&p, "redirectctl-test-no-such-profile").unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "redirectctl-test-no-such-profile"));
    }

    #[test]
    fn config_selects_default_profile() {
        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), profile());
        assert_eq!(cfg.profile(None).map(|(n, _)| n), Some("default"));
        assert!(cfg.profile(Some("prod")).is_none());
    }
}
