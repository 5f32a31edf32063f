// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::StuckPolicy;

pub const DEFAULT_TRIGGER_DIR: &str = "/var/run/dockerhook";
pub const DEFAULT_UPDATE_CMD: &str = "docker compose pull && docker compose up -d";
pub const DEFAULT_COMPOSE_PATH: &str = "/root/docker_compose.yml";
pub const DEFAULT_HEALTH_CMD: &str = "docker compose ps -q";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_HEALTH_ACTIVE_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_HEALTH_INACTIVE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_UPDATE_TIMEOUT_SECS: u64 = 15 * 60;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Settings as read from a TOML file, before validation.
///
/// Every key is optional:
///
/// ```toml
/// trigger_dir = "/var/run/dockerhook"
/// update_cmd = "docker compose pull && docker compose up -d"
/// compose_path = "/srv/app/docker-compose.yml"
/// update_timeout_secs = 600
/// stuck_policy = "report"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub trigger_dir: Option<PathBuf>,
    #[serde(default)]
    pub update_cmd: Option<String>,
    #[serde(default)]
    pub compose_dir: Option<PathBuf>,
    #[serde(default)]
    pub compose_path: Option<PathBuf>,
    #[serde(default)]
    pub health_cmd: Option<String>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub health_active_interval_secs: Option<u64>,
    #[serde(default)]
    pub health_inactive_interval_secs: Option<u64>,
    #[serde(default)]
    pub update_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_output_bytes: Option<usize>,
    #[serde(default)]
    pub stuck_policy: Option<StuckPolicy>,
}

/// Values coming from CLI flags or environment variables.
///
/// Any `Some` here wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub trigger_dir: Option<PathBuf>,
    pub update_cmd: Option<String>,
    pub compose_dir: Option<PathBuf>,
    pub compose_path: Option<PathBuf>,
    pub health_cmd: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub health_active_interval_secs: Option<u64>,
    pub health_inactive_interval_secs: Option<u64>,
    pub update_timeout_secs: Option<u64>,
    pub max_output_bytes: Option<usize>,
    pub stuck_policy: Option<StuckPolicy>,
}

impl RawSettings {
    /// Layer overrides on top of file values.
    pub fn apply(mut self, o: SettingsOverrides) -> Self {
        fn pick<T>(over: Option<T>, base: Option<T>) -> Option<T> {
            over.or(base)
        }

        self.trigger_dir = pick(o.trigger_dir, self.trigger_dir);
        self.update_cmd = pick(o.update_cmd, self.update_cmd);
        self.compose_dir = pick(o.compose_dir, self.compose_dir);
        self.compose_path = pick(o.compose_path, self.compose_path);
        self.health_cmd = pick(o.health_cmd, self.health_cmd);
        self.poll_interval_ms = pick(o.poll_interval_ms, self.poll_interval_ms);
        self.health_active_interval_secs =
            pick(o.health_active_interval_secs, self.health_active_interval_secs);
        self.health_inactive_interval_secs =
            pick(o.health_inactive_interval_secs, self.health_inactive_interval_secs);
        self.update_timeout_secs = pick(o.update_timeout_secs, self.update_timeout_secs);
        self.max_output_bytes = pick(o.max_output_bytes, self.max_output_bytes);
        self.stuck_policy = pick(o.stuck_policy, self.stuck_policy);
        self
    }
}

/// Validated settings, constructed once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of the trigger queue (`processing/`, `processed/`, `failed/` live below it).
    pub trigger_dir: PathBuf,
    /// Exact shell line run for every trigger.
    pub update_cmd: String,
    /// Compose file the stack is defined in.
    pub compose_path: PathBuf,
    /// Working directory of the update and health commands.
    pub workdir: PathBuf,
    pub health_cmd: String,
    pub poll_interval: Duration,
    pub health_active_interval: Duration,
    pub health_inactive_interval: Duration,
    pub update_timeout: Duration,
    pub max_output_bytes: usize,
    pub stuck_policy: StuckPolicy,
    /// Software version written into every status record.
    pub version: String,
}

impl Settings {
    /// Resolve the working directory: explicit compose dir, else the compose
    /// file's parent, else `/`.
    pub fn resolve_workdir(compose_dir: Option<&Path>, compose_path: &Path) -> PathBuf {
        if let Some(dir) = compose_dir {
            return dir.to_path_buf();
        }
        match compose_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("/"),
        }
    }
}
