// src/engine/mod.rs

//! Orchestration engine for redeploy.
//!
//! This module ties together:
//! - the job processor, which drives one trigger through its lifecycle
//!   ([`processor`])
//! - the trigger queue that feeds it in arrival order ([`queue`])
//! - the health poller with its adaptive re-arm schedule ([`health`],
//!   [`schedule`])
//! - the runtime running the drain loop and the health loop side by side
//!   ([`runtime`])

/// Result of handing one trigger to the job processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Update command exited 0; trigger is in `processed/`.
    Deployed,
    /// Update command exited non-zero; trigger is in `failed/`.
    UpdateFailed { exit_code: i32 },
    /// Update command hit its deadline and was killed; trigger is in `failed/`.
    TimedOut,
    /// Some other error while running the job; trigger is in `failed/`.
    Errored,
    /// Body was not JSON; trigger is in `failed/` with a `.bad` suffix.
    Corrupt,
    /// Moving the trigger to its terminal directory failed; it is still in
    /// `processing/`.
    Stuck,
    /// Another runner claimed the trigger first.
    ClaimLost,
    /// The claim rename failed for another reason; trigger is still pending.
    Deferred,
}

impl JobOutcome {
    /// Whether an update command was started for this job.
    pub fn ran_update(self) -> bool {
        matches!(
            self,
            JobOutcome::Deployed
                | JobOutcome::UpdateFailed { .. }
                | JobOutcome::TimedOut
        )
    }
}

pub mod health;
pub mod processor;
pub mod queue;
pub mod runtime;
pub mod schedule;

pub use health::{ComposeProbe, HealthPoller, PollOutcome, StackProbe};
pub use processor::JobProcessor;
pub use queue::{DrainReport, TriggerQueue};
pub use runtime::Runtime;
pub use schedule::{AdaptiveSchedule, Tick, Timer, TokioTimer};
