// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Job-level failures (`MalformedTrigger`, `ShellExecutionFailure`, ...) are
//! never propagated out of the scheduler loops; they are recorded in the
//! status/activity files and reported as a [`crate::engine::JobOutcome`].

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::queue::TriggerState;

#[derive(Error, Debug)]
pub enum RedeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("malformed trigger {trigger}: {reason}")]
    MalformedTrigger { trigger: String, reason: String },

    #[error("trigger {0} was claimed by another runner")]
    ClaimLost(String),

    #[error("update command exited with code {code}: {stderr}")]
    ShellExecutionFailure { code: i32, stderr: String },

    #[error("command timed out after {}s", .after.as_secs())]
    ExecutionTimeout { after: Duration },

    #[error("filesystem error during {op} on {path:?}: {source}")]
    FilesystemError {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("health poll failed: {0}")]
    HealthPollError(String),

    #[error("invalid trigger transition {from:?} -> {to:?}")]
    InvalidTransition { from: TriggerState, to: TriggerState },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RedeployError {
    /// Wrap a filesystem failure with the operation and path it concerned.
    pub fn fs(op: &'static str, path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        RedeployError::FilesystemError {
            op,
            path: path.into(),
            source,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RedeployError>;
