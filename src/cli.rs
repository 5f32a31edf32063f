// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every setting can also come from the environment (the `env = ...`
//! attributes) so the daemon can be configured the same way as the webhook
//! receiver that shares its trigger directory.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::SettingsOverrides;
use crate::types::StuckPolicy;

/// Command-line arguments for `redeploy`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "redeploy",
    version,
    about = "Re-deploy a compose stack whenever a webhook drops a trigger file.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional TOML config file. Flags and environment variables win over it.
    #[arg(long, value_name = "PATH", env = "REDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the webhook receiver drops trigger files into.
    #[arg(long, value_name = "DIR", env = "TRIGGER_DIR")]
    pub trigger_dir: Option<PathBuf>,

    /// Shell line executed for every trigger.
    #[arg(long, value_name = "CMD", env = "UPDATE_CMD")]
    pub update_cmd: Option<String>,

    /// Working directory for the update and health commands.
    #[arg(long, value_name = "DIR", env = "COMPOSE_DIR")]
    pub compose_dir: Option<PathBuf>,

    /// Compose file; its parent directory is used when `--compose-dir` is unset.
    #[arg(long, value_name = "PATH", env = "COMPOSE_PATH")]
    pub compose_path: Option<PathBuf>,

    /// Command whose non-empty output means "stack is running".
    #[arg(long, value_name = "CMD", env = "HEALTH_CMD")]
    pub health_cmd: Option<String>,

    /// How often the trigger directory is scanned, in milliseconds.
    #[arg(long, value_name = "MS", env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Health re-poll delay after observing a running stack, in seconds.
    #[arg(long, value_name = "SECS", env = "HEALTH_ACTIVE_INTERVAL_SECS")]
    pub health_active_interval_secs: Option<u64>,

    /// Health re-poll delay after observing a stopped stack or an error.
    #[arg(long, value_name = "SECS", env = "HEALTH_INACTIVE_INTERVAL_SECS")]
    pub health_inactive_interval_secs: Option<u64>,

    /// Deadline for a single update command, in seconds.
    #[arg(long, value_name = "SECS", env = "UPDATE_TIMEOUT_SECS")]
    pub update_timeout_secs: Option<u64>,

    /// Cap on captured bytes per output stream of a command.
    #[arg(long, value_name = "BYTES", env = "MAX_OUTPUT_BYTES")]
    pub max_output_bytes: Option<usize>,

    /// What to do at startup with triggers left in `processing/`.
    #[arg(long, value_enum, value_name = "POLICY", env = "STUCK_POLICY")]
    pub stuck_policy: Option<StuckPolicy>,

    /// Reclaim stuck triggers, drain the queue once, then exit.
    #[arg(long)]
    pub once: bool,

    /// Print the resolved settings and exit without touching anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the current status record and the activity log tail, then exit.
    #[arg(long)]
    pub status: bool,

    /// Write a trigger for the given repository (e.g. `acme/app`) and exit.
    #[arg(long, value_name = "REPO")]
    pub enqueue: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REDEPLOY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// The subset of flags that override file/default settings.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            trigger_dir: self.trigger_dir.clone(),
            update_cmd: self.update_cmd.clone(),
            compose_dir: self.compose_dir.clone(),
            compose_path: self.compose_path.clone(),
            health_cmd: self.health_cmd.clone(),
            poll_interval_ms: self.poll_interval_ms,
            health_active_interval_secs: self.health_active_interval_secs,
            health_inactive_interval_secs: self.health_inactive_interval_secs,
            update_timeout_secs: self.update_timeout_secs,
            max_output_bytes: self.max_output_bytes,
            stuck_policy: self.stuck_policy,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
