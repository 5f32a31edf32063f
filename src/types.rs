use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment state shown on the dashboard.
///
/// `Updating`/`Failed` are only ever written by the job processor; the health
/// poller reconciles between `Active` and `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeployState {
    #[default]
    Inactive,
    Updating,
    Active,
    Failed,
}

impl DeployState {
    pub fn as_str(self) -> &'static str {
        match self {
            DeployState::Inactive => "inactive",
            DeployState::Updating => "updating",
            DeployState::Active => "active",
            DeployState::Failed => "failed",
        }
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Startup handling of triggers found in `processing/`.
///
/// - `Requeue`: move them back into the watch root so they run again. The
///   update command is a pull + restart, so running it twice is harmless.
/// - `Report`: leave them where they are and surface them in the logs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StuckPolicy {
    #[default]
    Requeue,
    Report,
}

/// ISO-8601 UTC timestamp with millisecond precision (`2024-05-01T12:00:00.000Z`),
/// the format used in trigger bodies, the status record and the activity log.
pub fn iso_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
