use std::path::Path;

use redeploy::config::{RawSettings, Settings, SettingsOverrides};
use redeploy::types::StuckPolicy;

/// Builder for `Settings`, going through the same validation as the binary.
///
/// Defaults are test friendly: the queue lives at the given root, the update
/// command is `true`, and the workdir is the queue root.
pub struct SettingsBuilder {
    overrides: SettingsOverrides,
}

impl SettingsBuilder {
    pub fn new(trigger_dir: impl AsRef<Path>) -> Self {
        let root = trigger_dir.as_ref().to_path_buf();
        Self {
            overrides: SettingsOverrides {
                trigger_dir: Some(root.clone()),
                update_cmd: Some("true".to_string()),
                compose_dir: Some(root),
                ..SettingsOverrides::default()
            },
        }
    }

    pub fn update_cmd(mut self, cmd: &str) -> Self {
        self.overrides.update_cmd = Some(cmd.to_string());
        self
    }

    pub fn health_cmd(mut self, cmd: &str) -> Self {
        self.overrides.health_cmd = Some(cmd.to_string());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.overrides.poll_interval_ms = Some(ms);
        self
    }

    pub fn health_intervals_secs(mut self, active: u64, inactive: u64) -> Self {
        self.overrides.health_active_interval_secs = Some(active);
        self.overrides.health_inactive_interval_secs = Some(inactive);
        self
    }

    pub fn update_timeout_secs(mut self, secs: u64) -> Self {
        self.overrides.update_timeout_secs = Some(secs);
        self
    }

    pub fn max_output_bytes(mut self, bytes: usize) -> Self {
        self.overrides.max_output_bytes = Some(bytes);
        self
    }

    pub fn stuck_policy(mut self, policy: StuckPolicy) -> Self {
        self.overrides.stuck_policy = Some(policy);
        self
    }

    pub fn build(self) -> Settings {
        Settings::try_from(RawSettings::default().apply(self.overrides))
            .expect("test settings should validate")
    }
}
