// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{
    RawSettings, Settings, DEFAULT_COMPOSE_PATH, DEFAULT_HEALTH_ACTIVE_INTERVAL_SECS,
    DEFAULT_HEALTH_CMD, DEFAULT_HEALTH_INACTIVE_INTERVAL_SECS, DEFAULT_MAX_OUTPUT_BYTES,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TRIGGER_DIR, DEFAULT_UPDATE_CMD,
    DEFAULT_UPDATE_TIMEOUT_SECS,
};
use crate::errors::{RedeployError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = RedeployError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        let update_cmd = non_empty_command("update_cmd", raw.update_cmd, DEFAULT_UPDATE_CMD)?;
        let health_cmd = non_empty_command("health_cmd", raw.health_cmd, DEFAULT_HEALTH_CMD)?;

        let poll_interval_ms = positive(
            "poll_interval_ms",
            raw.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        )?;
        let active_secs = positive(
            "health_active_interval_secs",
            raw.health_active_interval_secs
                .unwrap_or(DEFAULT_HEALTH_ACTIVE_INTERVAL_SECS),
        )?;
        let inactive_secs = positive(
            "health_inactive_interval_secs",
            raw.health_inactive_interval_secs
                .unwrap_or(DEFAULT_HEALTH_INACTIVE_INTERVAL_SECS),
        )?;
        let timeout_secs = positive(
            "update_timeout_secs",
            raw.update_timeout_secs.unwrap_or(DEFAULT_UPDATE_TIMEOUT_SECS),
        )?;

        let max_output_bytes = raw.max_output_bytes.unwrap_or(DEFAULT_MAX_OUTPUT_BYTES);
        if max_output_bytes == 0 {
            return Err(RedeployError::ConfigError(
                "max_output_bytes must be >= 1 (got 0)".to_string(),
            ));
        }

        let trigger_dir = raw
            .trigger_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRIGGER_DIR));
        if trigger_dir.as_os_str().is_empty() {
            return Err(RedeployError::ConfigError(
                "trigger_dir must not be empty".to_string(),
            ));
        }

        let compose_path = raw
            .compose_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPOSE_PATH));
        let workdir = Settings::resolve_workdir(raw.compose_dir.as_deref(), &compose_path);

        Ok(Settings {
            trigger_dir,
            update_cmd,
            compose_path,
            workdir,
            health_cmd,
            poll_interval: Duration::from_millis(poll_interval_ms),
            health_active_interval: Duration::from_secs(active_secs),
            health_inactive_interval: Duration::from_secs(inactive_secs),
            update_timeout: Duration::from_secs(timeout_secs),
            max_output_bytes,
            stuck_policy: raw.stuck_policy.unwrap_or_default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

fn non_empty_command(key: &str, value: Option<String>, default: &str) -> Result<String> {
    let cmd = value.unwrap_or_else(|| default.to_string());
    if cmd.trim().is_empty() {
        return Err(RedeployError::ConfigError(format!(
            "{key} must not be empty"
        )));
    }
    Ok(cmd)
}

fn positive(key: &str, value: u64) -> Result<u64> {
    if value == 0 {
        return Err(RedeployError::ConfigError(format!(
            "{key} must be >= 1 (got 0)"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsOverrides;

    #[test]
    fn defaults_follow_the_compose_file_location() {
        let settings = Settings::try_from(RawSettings::default()).unwrap();
        assert_eq!(settings.workdir, PathBuf::from("/root"));
        assert_eq!(settings.update_cmd, DEFAULT_UPDATE_CMD);
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
        assert_eq!(settings.health_active_interval, Duration::from_secs(300));
        assert_eq!(settings.health_inactive_interval, Duration::from_secs(60));
    }

    #[test]
    fn compose_dir_wins_over_compose_path() {
        let raw = RawSettings::default().apply(SettingsOverrides {
            compose_dir: Some(PathBuf::from("/srv/stack")),
            compose_path: Some(PathBuf::from("/elsewhere/compose.yml")),
            ..Default::default()
        });
        let settings = Settings::try_from(raw).unwrap();
        assert_eq!(settings.workdir, PathBuf::from("/srv/stack"));
    }

    #[test]
    fn bare_compose_filename_falls_back_to_root() {
        let workdir = Settings::resolve_workdir(None, std::path::Path::new("compose.yml"));
        assert_eq!(workdir, PathBuf::from("/"));
    }

    #[test]
    fn blank_update_command_is_rejected() {
        let raw = RawSettings {
            update_cmd: Some("   ".to_string()),
            ..Default::default()
        };
        match Settings::try_from(raw) {
            Err(RedeployError::ConfigError(msg)) => assert!(msg.contains("update_cmd")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let raw = RawSettings {
            update_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            Settings::try_from(raw),
            Err(RedeployError::ConfigError(_))
        ));
    }
}
