// src/engine/health.rs

//! Reconciles the observed container-runtime state into `status.json`.
//!
//! The poller only ever changes `state`, and only when the observation
//! differs from the previous one; `lastRepo`/`lastAt` belong to the job
//! processor.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::schedule::{AdaptiveSchedule, Tick, Timer};
use crate::errors::{RedeployError, Result};
use crate::exec::CommandRunner;
use crate::store::{ActivityLog, StatusStore};
use crate::types::DeployState;

/// Answers "is the stack running right now?".
pub trait StackProbe: Send + Sync {
    fn is_running(&self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>>;
}

/// Asks compose for the container ids of the project; any id means running.
pub struct ComposeProbe {
    runner: Arc<dyn CommandRunner>,
    command: String,
    workdir: PathBuf,
}

impl ComposeProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, command: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            command: command.into(),
            workdir: workdir.into(),
        }
    }
}

impl StackProbe for ComposeProbe {
    fn is_running(&self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(async move {
            let output = self
                .runner
                .run(&self.command, &self.workdir)
                .await
                .map_err(|e| RedeployError::HealthPollError(e.to_string()))?;

            if !output.success() {
                return Err(RedeployError::HealthPollError(format!(
                    "`{}` exited with code {}: {}",
                    self.command,
                    output.exit_code,
                    output.stderr.trim()
                )));
            }
            Ok(!output.stdout.trim().is_empty())
        })
    }
}

/// Result of one health poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// `None` when the probe failed (state unknown).
    pub observed: Option<DeployState>,
    /// True when the status record was rewritten.
    pub changed: bool,
}

pub struct HealthPoller {
    probe: Arc<dyn StackProbe>,
    status: Arc<StatusStore>,
    activity: Arc<ActivityLog>,
    last_observed: Option<DeployState>,
}

impl HealthPoller {
    /// The last observation is seeded from the stored record when it holds
    /// `active`/`inactive`, so a restart does not rewrite an unchanged state.
    pub fn new(probe: Arc<dyn StackProbe>, status: Arc<StatusStore>, activity: Arc<ActivityLog>) -> Self {
        let last_observed = match status.read().state {
            s @ (DeployState::Active | DeployState::Inactive) => Some(s),
            _ => None,
        };
        Self {
            probe,
            status,
            activity,
            last_observed,
        }
    }

    pub fn last_observed(&self) -> Option<DeployState> {
        self.last_observed
    }

    pub async fn poll_once(&mut self) -> PollOutcome {
        let running = match self.probe.is_running().await {
            Ok(running) => running,
            Err(err) => {
                warn!(error = %err, "compose poll failed");
                self.note(&format!("compose poll error: {err}"));
                return PollOutcome {
                    observed: None,
                    changed: false,
                };
            }
        };

        let state = if running {
            DeployState::Active
        } else {
            DeployState::Inactive
        };

        if self.last_observed == Some(state) {
            debug!(%state, "compose state unchanged");
            return PollOutcome {
                observed: Some(state),
                changed: false,
            };
        }

        match self.status.set_state(state) {
            Ok(_) => {
                info!(%state, previous = ?self.last_observed, "compose state changed");
                self.last_observed = Some(state);
                self.note(&format!("compose poll: state={state}"));
                PollOutcome {
                    observed: Some(state),
                    changed: true,
                }
            }
            Err(err) => {
                // Keep the old observation so the next poll retries the write.
                warn!(error = %err, %state, "failed to write polled state");
                PollOutcome {
                    observed: Some(state),
                    changed: false,
                }
            }
        }
    }

    fn note(&self, message: &str) {
        if let Err(e) = self.activity.append(message) {
            warn!(error = %e, "failed to append activity log");
        }
    }
}

/// Poll, re-arm with the adaptive delay, repeat until the timer reports
/// shutdown. Returns the number of polls performed.
pub async fn run_health_loop<T: Timer>(
    mut poller: HealthPoller,
    schedule: AdaptiveSchedule,
    mut timer: T,
) -> usize {
    info!("health poller started");
    let mut polls = 0;
    loop {
        let outcome = poller.poll_once().await;
        polls += 1;

        let delay = schedule.next_delay(outcome.observed);
        debug!(observed = ?outcome.observed, delay_secs = delay.as_secs(), "health poll re-armed");

        if timer.sleep(delay).await == Tick::Shutdown {
            break;
        }
    }
    info!(polls, "health poller stopped");
    polls
}
