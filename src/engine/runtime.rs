// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::Settings;
use crate::engine::health::{run_health_loop, ComposeProbe, HealthPoller, StackProbe};
use crate::engine::processor::JobProcessor;
use crate::engine::queue::{DrainReport, TriggerQueue};
use crate::engine::schedule::{AdaptiveSchedule, TokioTimer};
use crate::errors::Result;
use crate::exec::{CommandRunner, ShellExecutor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::queue::{reclaim_stuck, QueueLayout, ReclaimReport, TriggerLifecycle};
use crate::store::{ActivityLog, StatusStore};
use crate::watch::spawn_wakeup_watcher;

/// Upper bound for a single health command.
pub const HEALTH_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns every component and runs the two periodic activities:
///
/// - the drain loop: every `poll_interval` (or sooner, on a filesystem
///   wake-up) process all pending triggers. Passes run inside this one task
///   and missed ticks are skipped, so passes never overlap.
/// - the health loop: a separate task re-armed by [`AdaptiveSchedule`].
///
/// The loops are independent; the stores they share serialise their own
/// writes.
pub struct Runtime {
    settings: Settings,
    fs: Arc<dyn FileSystem>,
    layout: QueueLayout,
    status: Arc<StatusStore>,
    activity: Arc<ActivityLog>,
    queue: TriggerQueue,
    processor: Arc<JobProcessor>,
    probe: Arc<dyn StackProbe>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("layout", &self.layout)
            .field("processor", &self.processor)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        update_runner: Arc<dyn CommandRunner>,
        probe: Arc<dyn StackProbe>,
    ) -> Self {
        let layout = QueueLayout::new(&settings.trigger_dir);
        let status = Arc::new(StatusStore::new(
            fs.clone(),
            layout.status_file(),
            settings.version.clone(),
        ));
        let activity = Arc::new(ActivityLog::new(fs.clone(), layout.log_file()));
        let lifecycle = TriggerLifecycle::new(fs.clone(), layout.clone());
        let processor = Arc::new(JobProcessor::new(
            &settings,
            fs.clone(),
            lifecycle,
            status.clone(),
            activity.clone(),
            update_runner,
        ));
        let queue = TriggerQueue::new(fs.clone(), layout.clone());

        Self {
            settings,
            fs,
            layout,
            status,
            activity,
            queue,
            processor,
            probe,
        }
    }

    /// Production wiring: real filesystem, `sh -c` runners, compose probe.
    pub fn from_settings(settings: Settings) -> Self {
        let update_runner = Arc::new(ShellExecutor::new(
            settings.update_timeout,
            settings.max_output_bytes,
        ));
        let probe_runner = Arc::new(ShellExecutor::new(
            HEALTH_CMD_TIMEOUT.min(settings.update_timeout),
            settings.max_output_bytes,
        ));
        let probe = Arc::new(ComposeProbe::new(
            probe_runner,
            settings.health_cmd.clone(),
            settings.workdir.clone(),
        ));
        Self::new(settings, Arc::new(RealFileSystem), update_runner, probe)
    }

    pub fn layout(&self) -> &QueueLayout {
        &self.layout
    }

    pub fn status(&self) -> &Arc<StatusStore> {
        &self.status
    }

    pub fn activity(&self) -> &Arc<ActivityLog> {
        &self.activity
    }

    pub fn processor(&self) -> &Arc<JobProcessor> {
        &self.processor
    }

    pub fn queue(&self) -> &TriggerQueue {
        &self.queue
    }

    /// Create the directory layout and the status file, then apply the
    /// stuck-trigger policy to whatever a previous run left in `processing/`.
    pub fn startup(&self) -> Result<ReclaimReport> {
        self.layout.ensure(self.fs.as_ref())?;
        if self.status.ensure_exists()? {
            info!(path = ?self.layout.status_file(), "created initial status record");
        }

        let report = reclaim_stuck(
            self.fs.as_ref(),
            self.processor.lifecycle(),
            &self.activity,
            self.settings.stuck_policy,
        );
        if !report.requeued.is_empty() || !report.stuck.is_empty() {
            info!(
                requeued = report.requeued.len(),
                stuck = report.stuck.len(),
                policy = ?self.settings.stuck_policy,
                "reclaimed triggers left in processing"
            );
        }
        Ok(report)
    }

    /// One drain pass over the pending triggers.
    pub async fn drain_once(&self) -> DrainReport {
        self.queue.drain(&self.processor).await
    }

    pub fn health_poller(&self) -> HealthPoller {
        HealthPoller::new(self.probe.clone(), self.status.clone(), self.activity.clone())
    }

    /// Run both loops until `shutdown` flips to true (or its sender drops).
    ///
    /// An update that is running when shutdown arrives is finished first.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.startup()?;

        info!(
            trigger_dir = ?self.layout.root(),
            workdir = ?self.settings.workdir,
            "redeploy runtime started"
        );

        let health = tokio::spawn(run_health_loop(
            self.health_poller(),
            AdaptiveSchedule::from_settings(&self.settings),
            TokioTimer::new(shutdown.clone()),
        ));

        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
        let _watcher = match spawn_wakeup_watcher(self.layout.root(), wake_tx) {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(error = %err, "trigger dir watcher unavailable; relying on polling");
                None
            }
        };

        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {}
                Some(()) = wake_rx.recv() => {}
                _ = shutdown.changed() => break,
            }
            self.queue.drain(&self.processor).await;
        }

        info!("drain loop stopped; waiting for health poller");
        if let Err(err) = health.await {
            warn!(error = %err, "health poller task ended abnormally");
        }

        info!("runtime exiting");
        Ok(())
    }
}
