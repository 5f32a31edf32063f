// src/queue/reclaim.rs

use tracing::{info, warn};

use crate::fs::FileSystem;
use crate::queue::scan::list_in;
use crate::queue::state::{TriggerLifecycle, TriggerState};
use crate::queue::trigger::Trigger;
use crate::store::ActivityLog;
use crate::types::StuckPolicy;

/// What the startup sweep of `processing/` did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Moved back to pending; they will run again.
    pub requeued: Vec<Trigger>,
    /// Left in `processing/` and reported.
    pub stuck: Vec<Trigger>,
}

/// Handle triggers a previous process left in `processing/`.
///
/// Must run before the drain loop starts: afterwards a file in
/// `processing/` may belong to a live job.
pub fn reclaim_stuck(
    fs: &dyn FileSystem,
    lifecycle: &TriggerLifecycle,
    activity: &ActivityLog,
    policy: StuckPolicy,
) -> ReclaimReport {
    let mut report = ReclaimReport::default();

    for trigger in list_in(fs, &lifecycle.layout().processing_dir()) {
        let pending_path = lifecycle.path_of(&trigger, TriggerState::Pending);
        let requeue = policy == StuckPolicy::Requeue && !fs.exists(&pending_path);

        if requeue {
            match lifecycle.move_to(&trigger, TriggerState::Processing, TriggerState::Pending) {
                Ok(_) => {
                    info!(trigger = %trigger.name(), "requeued trigger left in processing");
                    note(activity, &format!("requeued stuck trigger {}", trigger.name()));
                    report.requeued.push(trigger);
                    continue;
                }
                Err(err) => {
                    warn!(trigger = %trigger.name(), error = %err, "failed to requeue stuck trigger");
                }
            }
        }

        warn!(trigger = %trigger.name(), "trigger stuck in processing; needs operator attention");
        note(activity, &format!("stuck trigger {} left in processing", trigger.name()));
        report.stuck.push(trigger);
    }

    report
}

fn note(activity: &ActivityLog, message: &str) {
    if let Err(err) = activity.append(message) {
        warn!(error = %err, "failed to append activity log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::queue::QueueLayout;
    use std::path::Path;
    use std::sync::Arc;

    fn setup() -> (MockFileSystem, TriggerLifecycle, ActivityLog) {
        let fs = MockFileSystem::new();
        let layout = QueueLayout::new("/q");
        layout.ensure(&fs).unwrap();
        let lc = TriggerLifecycle::new(Arc::new(fs.clone()), layout.clone());
        let log = ActivityLog::new(Arc::new(fs.clone()), layout.log_file());
        (fs, lc, log)
    }

    #[test]
    fn requeue_moves_stuck_triggers_back_to_pending() {
        let (fs, lc, log) = setup();
        fs.add_file("/q/processing/trigger_10.json", "{}");

        let report = reclaim_stuck(&fs, &lc, &log, StuckPolicy::Requeue);

        assert_eq!(report.requeued, vec![Trigger::from_id(10)]);
        assert!(report.stuck.is_empty());
        assert!(fs.exists(Path::new("/q/trigger_10.json")));
        assert!(!fs.exists(Path::new("/q/processing/trigger_10.json")));
        assert!(log.read_tail(5)[0].contains("requeued stuck trigger trigger_10.json"));
    }

    #[test]
    fn report_leaves_files_in_place() {
        let (fs, lc, log) = setup();
        fs.add_file("/q/processing/trigger_11.json", "{}");

        let report = reclaim_stuck(&fs, &lc, &log, StuckPolicy::Report);

        assert_eq!(report.stuck, vec![Trigger::from_id(11)]);
        assert!(fs.exists(Path::new("/q/processing/trigger_11.json")));
        assert!(log.read_tail(5)[0].contains("stuck trigger trigger_11.json"));
    }

    #[test]
    fn requeue_never_overwrites_a_pending_duplicate() {
        let (fs, lc, log) = setup();
        fs.add_file("/q/processing/trigger_12.json", "old");
        fs.add_file("/q/trigger_12.json", "new");

        let report = reclaim_stuck(&fs, &lc, &log, StuckPolicy::Requeue);

        assert_eq!(report.stuck, vec![Trigger::from_id(12)]);
        assert_eq!(fs.read_to_string(Path::new("/q/trigger_12.json")).unwrap(), "new");
    }
}
