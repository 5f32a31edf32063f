// src/engine/queue.rs

use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::{JobOutcome, JobProcessor};
use crate::fs::FileSystem;
use crate::queue::{list_pending, QueueLayout, Trigger};

/// Outcomes of one pass over the pending triggers, in processing order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub jobs: Vec<(Trigger, JobOutcome)>,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn count(&self, outcome: JobOutcome) -> usize {
        self.jobs.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Scans the watch root and feeds pending triggers to the processor, oldest
/// first, one at a time.
#[derive(Debug, Clone)]
pub struct TriggerQueue {
    fs: Arc<dyn FileSystem>,
    layout: QueueLayout,
}

impl TriggerQueue {
    pub fn new(fs: Arc<dyn FileSystem>, layout: QueueLayout) -> Self {
        Self { fs, layout }
    }

    /// Pending triggers in arrival order. Pure read.
    pub fn pending(&self) -> Vec<Trigger> {
        list_pending(self.fs.as_ref(), &self.layout)
    }

    /// Process everything pending right now.
    ///
    /// Triggers are handled sequentially; an empty root touches nothing.
    pub async fn drain(&self, processor: &JobProcessor) -> DrainReport {
        let pending = self.pending();
        if pending.is_empty() {
            return DrainReport::default();
        }

        debug!(count = pending.len(), "draining pending triggers");
        let mut report = DrainReport::default();
        for trigger in pending {
            let outcome = processor.process(&trigger).await;
            debug!(trigger = %trigger.name(), ?outcome, "job finished");
            report.jobs.push((trigger, outcome));
        }

        info!(
            jobs = report.jobs.len(),
            deployed = report.count(JobOutcome::Deployed),
            "drain pass complete"
        );
        report
    }
}
