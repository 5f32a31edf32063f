// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use redeploy::config::{load_settings, SettingsOverrides};
use redeploy::errors::RedeployError;
use redeploy::types::StuckPolicy;
use tempfile::NamedTempFile;

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_apply_without_a_file() {
    let s = load_settings(None, SettingsOverrides::default()).unwrap();

    assert_eq!(s.trigger_dir, PathBuf::from("/var/run/dockerhook"));
    assert_eq!(s.update_cmd, "docker compose pull && docker compose up -d");
    assert_eq!(s.health_cmd, "docker compose ps -q");
    assert_eq!(s.poll_interval, Duration::from_secs(2));
    assert_eq!(s.health_active_interval, Duration::from_secs(300));
    assert_eq!(s.health_inactive_interval, Duration::from_secs(60));
    assert_eq!(s.stuck_policy, StuckPolicy::Requeue);
}

#[test]
fn file_values_are_overridden_by_flags() {
    let file = toml_file(
        r#"
trigger_dir = "/tmp/hooks"
update_cmd = "make deploy"
compose_path = "/srv/app/docker-compose.yml"
stuck_policy = "report"
update_timeout_secs = 60
"#,
    );
    let overrides = SettingsOverrides {
        update_cmd: Some("./deploy.sh".to_string()),
        ..SettingsOverrides::default()
    };

    let s = load_settings(Some(file.path()), overrides).unwrap();

    assert_eq!(s.trigger_dir, PathBuf::from("/tmp/hooks"));
    assert_eq!(s.update_cmd, "./deploy.sh");
    assert_eq!(s.workdir, PathBuf::from("/srv/app"));
    assert_eq!(s.stuck_policy, StuckPolicy::Report);
    assert_eq!(s.update_timeout, Duration::from_secs(60));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = toml_file("trigger_dir = \"/q\"\nretries = 3\n");

    match load_settings(Some(file.path()), SettingsOverrides::default()) {
        Err(RedeployError::TomlError(_)) => {}
        other => panic!("expected TomlError, got {other:?}"),
    }
}

#[test]
fn zero_poll_interval_is_a_config_error() {
    let file = toml_file("poll_interval_ms = 0\n");

    match load_settings(Some(file.path()), SettingsOverrides::default()) {
        Err(RedeployError::ConfigError(msg)) => assert!(msg.contains("poll_interval_ms")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let result = load_settings(
        Some(std::path::Path::new("/no/such/redeploy.toml")),
        SettingsOverrides::default(),
    );
    assert!(matches!(result, Err(RedeployError::IoError(_))));
}
