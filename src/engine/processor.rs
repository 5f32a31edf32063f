// src/engine/processor.rs

//! Drives one trigger file from pending to a terminal directory.
//!
//! ```text
//! pending --claim--> processing --exit 0----> processed
//!                         |------exit != 0--> failed
//!                         |------error------> failed      (best effort)
//!                         `------not JSON---> failed/*.bad
//! ```
//!
//! Nothing is retried. A trigger whose final move fails stays in
//! `processing/` and is handled by the startup reclaim sweep.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::engine::JobOutcome;
use crate::errors::{RedeployError, Result};
use crate::exec::CommandRunner;
use crate::fs::FileSystem;
use crate::queue::{Trigger, TriggerDocument, TriggerLifecycle, TriggerState};
use crate::store::{ActivityLog, StatusStore, StatusUpdate};
use crate::types::{iso_timestamp, DeployState};

pub struct JobProcessor {
    fs: Arc<dyn FileSystem>,
    lifecycle: TriggerLifecycle,
    status: Arc<StatusStore>,
    activity: Arc<ActivityLog>,
    runner: Arc<dyn CommandRunner>,
    update_cmd: String,
    workdir: PathBuf,
    version: String,
    /// Held for the whole update phase: at most one update command runs at a
    /// time, however many drains share this processor.
    deploy_lock: Mutex<()>,
}

impl std::fmt::Debug for JobProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobProcessor")
            .field("update_cmd", &self.update_cmd)
            .field("workdir", &self.workdir)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl JobProcessor {
    pub fn new(
        settings: &Settings,
        fs: Arc<dyn FileSystem>,
        lifecycle: TriggerLifecycle,
        status: Arc<StatusStore>,
        activity: Arc<ActivityLog>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            fs,
            lifecycle,
            status,
            activity,
            runner,
            update_cmd: settings.update_cmd.clone(),
            workdir: settings.workdir.clone(),
            version: settings.version.clone(),
            deploy_lock: Mutex::new(()),
        }
    }

    pub fn lifecycle(&self) -> &TriggerLifecycle {
        &self.lifecycle
    }

    /// Claim and run one pending trigger.
    pub async fn process(&self, trigger: &Trigger) -> JobOutcome {
        let processing = match self.lifecycle.claim(trigger) {
            Ok(path) => path,
            Err(RedeployError::ClaimLost(_)) => {
                debug!(trigger = %trigger.name(), "trigger already claimed elsewhere; skipping");
                return JobOutcome::ClaimLost;
            }
            Err(err) => {
                warn!(trigger = %trigger.name(), error = %err, "failed to claim trigger; leaving it pending");
                return JobOutcome::Deferred;
            }
        };

        let raw = match self.fs.read(&processing) {
            Ok(raw) => raw,
            Err(e) => {
                let err = RedeployError::fs("read", &processing, e);
                return self.abandon(trigger, err, false);
            }
        };

        let doc = match TriggerDocument::parse(&raw) {
            Ok(doc) => doc,
            Err(e) => return self.reject_corrupt(trigger, e),
        };

        match self.deploy(trigger, &doc).await {
            Ok(outcome) => outcome,
            Err(err) => self.abandon(trigger, err, true),
        }
    }

    async fn deploy(&self, trigger: &Trigger, doc: &TriggerDocument) -> Result<JobOutcome> {
        let _deploying = self.deploy_lock.lock().await;

        let name = trigger.name();
        let repo = doc.repository().map(str::to_string);
        let at = iso_timestamp(Utc::now());
        let received_at = doc.received_at.as_deref().unwrap_or("unknown");

        info!(trigger = %name, %received_at, repo = ?repo, "processing trigger");
        self.note(&format!("processing trigger {name} receivedAt={received_at}"));
        self.record_status(DeployState::Updating, &repo, &at);

        info!(trigger = %name, workdir = ?self.workdir, cmd = %self.update_cmd, "running update command");
        let output = self.runner.run(&self.update_cmd, &self.workdir).await?;

        if output.success() {
            self.lifecycle
                .move_to(trigger, TriggerState::Processing, TriggerState::Processed)?;
            self.note(&format!("update succeeded for {name}"));
            self.record_status(DeployState::Active, &repo, &at);
            info!(trigger = %name, "update succeeded");
            return Ok(JobOutcome::Deployed);
        }

        let failure = RedeployError::ShellExecutionFailure {
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        };
        self.lifecycle
            .move_to(trigger, TriggerState::Processing, TriggerState::Failed)?;
        self.note(&format!(
            "update failed for {name} code={} err={}",
            output.exit_code,
            output.stderr.trim()
        ));
        self.record_status(DeployState::Failed, &repo, &at);
        error!(trigger = %name, error = %failure, "update failed");

        Ok(JobOutcome::UpdateFailed {
            exit_code: output.exit_code,
        })
    }

    fn reject_corrupt(&self, trigger: &Trigger, err: serde_json::Error) -> JobOutcome {
        let malformed = RedeployError::MalformedTrigger {
            trigger: trigger.name().to_string(),
            reason: err.to_string(),
        };
        warn!(error = %malformed, "rejecting trigger");
        self.note(&format!("invalid trigger file {}: {err}", trigger.name()));

        match self
            .lifecycle
            .move_to(trigger, TriggerState::Processing, TriggerState::Corrupt)
        {
            Ok(_) => JobOutcome::Corrupt,
            Err(move_err) => self.stuck(trigger, &move_err),
        }
    }

    /// Best-effort cleanup after an unexpected error.
    ///
    /// `status_written` is true once the job has published `updating`; the
    /// record is then flipped to `failed` so the dashboard does not show an
    /// update in progress forever.
    fn abandon(&self, trigger: &Trigger, err: RedeployError, status_written: bool) -> JobOutcome {
        error!(trigger = %trigger.name(), error = %err, "error running update");
        self.note(&format!("error running update for {} {err}", trigger.name()));

        if status_written {
            if let Err(e) = self.status.set_state(DeployState::Failed) {
                warn!(error = %e, "failed to write status");
            }
        }

        match self
            .lifecycle
            .move_to(trigger, TriggerState::Processing, TriggerState::Failed)
        {
            Ok(_) if matches!(err, RedeployError::ExecutionTimeout { .. }) => JobOutcome::TimedOut,
            Ok(_) => JobOutcome::Errored,
            Err(move_err) => self.stuck(trigger, &move_err),
        }
    }

    fn stuck(&self, trigger: &Trigger, err: &RedeployError) -> JobOutcome {
        error!(
            trigger = %trigger.name(),
            error = %err,
            "failed to move trigger out of processing; it is stuck"
        );
        self.note(&format!(
            "failed to move {} out of processing: {err}",
            trigger.name()
        ));
        JobOutcome::Stuck
    }

    fn record_status(&self, state: DeployState, repo: &Option<String>, at: &str) {
        let update = StatusUpdate {
            state: Some(state),
            version: Some(self.version.clone()),
            last_repo: repo.clone(),
            last_at: Some(at.to_string()),
        };
        if let Err(e) = self.status.write(update) {
            warn!(error = %e, %state, "failed to write status");
        }
    }

    fn note(&self, message: &str) {
        if let Err(e) = self.activity.append(message) {
            warn!(error = %e, "failed to append activity log");
        }
    }
}
