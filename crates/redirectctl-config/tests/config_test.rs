#![allow(clippy::unwrap_used)]
// Round-trips config files through an explicit path in a temp directory.

use redirectctl_config::{
    Config, Profile, load_config_from, profile_to_graph_config, save_config_to,
};
use redirectctl_core::UpdateStrategy;

const SAMPLE: &str = r#"
default_profile = "prod"

[defaults]
output = "json"
timeout = 10
update_strategy = "two-phase"

[profiles.prod]
tenant_id = "tenant-1"
client_id = "client-1"
client_secret = "plain-secret"
graph_host = "https://graph.microsoft.us"
max_attempts = 3
"#;

#[test]
fn loads_profiles_and_defaults_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let cfg = load_config_from(&path).unwrap();

    assert_eq!(cfg.default_profile.as_deref(), Some("prod"));
    assert_eq!(cfg.defaults.output, "json");
    assert_eq!(cfg.defaults.color, "auto");
    assert_eq!(cfg.defaults.update_strategy, UpdateStrategy::TwoPhase);

    let (name, profile) = cfg.profile(None).unwrap();
    assert_eq!(name, "prod");
    assert_eq!(profile.max_attempts, Some(3));

    let graph = profile_to_graph_config(profile, name, &cfg.defaults).unwrap();
    assert_eq!(graph.timeout.as_secs(), 10);
    assert_eq!(graph.retry.max_attempts, 3);
    assert_eq!(graph.update_strategy, UpdateStrategy::TwoPhase);
    assert_eq!(graph.graph_host.host_str(), Some("graph.microsoft.us"));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    assert_eq!(cfg.defaults.timeout, 30);
    assert_eq!(cfg.defaults.max_attempts, 5);
    assert!(cfg.profiles.is_empty());
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.profiles.insert(
        "default".into(),
        Profile {
            tenant_id: "tenant-1".into(),
            client_id: "client-1".into(),
            client_secret_env: Some("MY_SECRET".into()),
            update_strategy: Some(UpdateStrategy::SingleReplace),
            ..Profile::default()
        },
    );
    save_config_to(&cfg, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("client_secret_env = \"MY_SECRET\""));
    assert!(!written.contains("client_secret ="));

    let loaded = load_config_from(&path).unwrap();
    let profile = &loaded.profiles["default"];
    assert_eq!(profile.tenant_id, "tenant-1");
    assert_eq!(profile.update_strategy, Some(UpdateStrategy::SingleReplace));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[profiles.prod]\ntenant_id = 42\n").unwrap();

    assert!(load_config_from(&path).is_err());
}
