// tests/job_processing.rs

mod common;

use std::time::Duration;

use common::Harness;
use redeploy::engine::JobOutcome;
use redeploy::errors::RedeployError;
use redeploy::types::DeployState;
use redeploy_test_utils::builders::SettingsBuilder;
use redeploy_test_utils::fake_executor::FakeExecutor;
use redeploy_test_utils::init_tracing;

#[tokio::test]
async fn successful_update_moves_trigger_to_processed_and_marks_active() {
    init_tracing();
    let h = Harness::new();
    h.runtime.startup().unwrap();
    h.add_trigger(1000, "acme/app");

    let report = h.runtime.drain_once().await;

    assert_eq!(report.count(JobOutcome::Deployed), 1);
    assert!(h.exists("processed/trigger_1000.json"));
    assert!(!h.exists("trigger_1000.json"));
    assert!(!h.exists("processing/trigger_1000.json"));

    let status = h.runtime.status().read();
    assert_eq!(status.state, DeployState::Active);
    assert_eq!(status.last_repo.as_deref(), Some("acme/app"));
    assert!(status.last_at.is_some());
    assert_eq!(status.version, env!("CARGO_PKG_VERSION"));

    assert!(h.log_contains("processing trigger trigger_1000.json receivedAt=2024-01-01T00:00:00.000Z"));
    assert!(h.log_contains("update succeeded for trigger_1000.json"));
    assert_eq!(h.exec.commands(), vec!["true".to_string()]);
    assert_eq!(h.exec.workdirs(), vec![std::path::PathBuf::from(common::ROOT)]);
}

#[tokio::test]
async fn failed_update_moves_trigger_to_failed_with_stderr_in_log() {
    init_tracing();
    let h = Harness::new();
    h.runtime.startup().unwrap();
    h.exec.push_output(1, "", "pull failed\n");
    h.add_trigger(2000, "acme/app");

    let report = h.runtime.drain_once().await;

    assert_eq!(report.count(JobOutcome::UpdateFailed { exit_code: 1 }), 1);
    assert!(h.exists("failed/trigger_2000.json"));
    assert_eq!(h.runtime.status().read().state, DeployState::Failed);
    assert_eq!(
        h.runtime.status().read().last_repo.as_deref(),
        Some("acme/app")
    );
    assert!(h.log_contains("update failed for trigger_2000.json code=1 err=pull failed"));
}

#[tokio::test]
async fn corrupt_trigger_is_quarantined_without_running_or_touching_status() {
    init_tracing();
    let h = Harness::new();
    h.runtime.startup().unwrap();
    let before = h.runtime.status().read();
    h.add_raw(3000, "{not json");

    let report = h.runtime.drain_once().await;

    assert_eq!(report.count(JobOutcome::Corrupt), 1);
    assert!(h.exists("failed/trigger_3000.json.bad"));
    assert!(!h.exists("failed/trigger_3000.json"));
    assert_eq!(h.exec.call_count(), 0);
    assert_eq!(h.runtime.status().read(), before);
    assert!(h.log_contains("invalid trigger file trigger_3000.json"));
}

#[tokio::test]
async fn non_utf8_trigger_is_quarantined_as_corrupt() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    let before = h.runtime.status().read();
    h.add_bytes(3100, &[0xff, 0xfe, b'{']);

    let report = h.runtime.drain_once().await;

    assert_eq!(report.count(JobOutcome::Corrupt), 1);
    assert!(h.exists("failed/trigger_3100.json.bad"));
    assert!(!h.exists("failed/trigger_3100.json"));
    assert_eq!(h.exec.call_count(), 0);
    assert_eq!(h.runtime.status().read(), before);
}

#[tokio::test]
async fn payload_without_repository_still_deploys() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    h.add_raw(3500, r#"{"payload":{"zen":"hi"}}"#);

    let report = h.runtime.drain_once().await;

    assert_eq!(report.count(JobOutcome::Deployed), 1);
    let status = h.runtime.status().read();
    assert_eq!(status.state, DeployState::Active);
    assert_eq!(status.last_repo, None);
    assert!(h.log_contains("receivedAt=unknown"));
}

#[tokio::test]
async fn triggers_run_oldest_first_one_at_a_time() {
    let exec = FakeExecutor::new().with_delay(Duration::from_millis(5));
    let h = Harness::with(SettingsBuilder::new(common::ROOT).build(), exec);
    h.runtime.startup().unwrap();
    h.add_trigger(30, "acme/c");
    h.add_trigger(4, "acme/a");
    h.add_trigger(200, "acme/b");
    let pending: Vec<u64> = h.runtime.queue().pending().iter().map(|t| t.id()).collect();
    assert_eq!(pending, vec![4, 30, 200]);

    let report = h.runtime.drain_once().await;

    let order: Vec<u64> = report.jobs.iter().map(|(t, _)| t.id()).collect();
    assert_eq!(order, vec![4, 30, 200]);
    assert_eq!(h.exec.max_concurrent(), 1);
    assert_eq!(
        h.runtime.status().read().last_repo.as_deref(),
        Some("acme/b")
    );
}

#[tokio::test]
async fn every_trigger_ends_in_exactly_one_place() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    h.exec.push_output(0, "", "");
    h.exec.push_output(2, "", "boom");
    h.add_trigger(1, "acme/a");
    h.add_trigger(2, "acme/b");
    h.add_raw(3, "[");

    h.runtime.drain_once().await;

    assert!(h.triggers_in("").is_empty());
    assert!(h.triggers_in("processing").is_empty());
    assert_eq!(h.triggers_in("processed"), vec!["trigger_1.json"]);
    assert_eq!(
        h.triggers_in("failed"),
        vec!["trigger_2.json", "trigger_3.json.bad"]
    );
}

#[tokio::test]
async fn empty_drain_writes_nothing() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    let status_writes = h.fs.write_count("/q/status.json");
    let log_writes = h.fs.write_count("/q/update.log");

    for _ in 0..3 {
        assert!(h.runtime.drain_once().await.is_empty());
    }

    assert_eq!(h.fs.write_count("/q/status.json"), status_writes);
    assert_eq!(h.fs.write_count("/q/update.log"), log_writes);
    assert_eq!(h.exec.call_count(), 0);
}

#[tokio::test]
async fn timeout_marks_failed_and_records_the_error() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    h.exec.push_error(RedeployError::ExecutionTimeout {
        after: Duration::from_secs(900),
    });
    h.add_trigger(4000, "acme/app");

    let report = h.runtime.drain_once().await;

    assert_eq!(report.count(JobOutcome::TimedOut), 1);
    assert!(h.exists("failed/trigger_4000.json"));
    assert_eq!(h.runtime.status().read().state, DeployState::Failed);
    assert!(h.log_contains("error running update for trigger_4000.json"));
}

#[tokio::test]
async fn unmovable_trigger_is_reported_stuck_and_stays_in_processing() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    h.fs.break_renames_into("/q/processed");
    h.fs.break_renames_into("/q/failed");
    h.add_trigger(5000, "acme/app");

    let report = h.runtime.drain_once().await;

    assert_eq!(report.count(JobOutcome::Stuck), 1);
    assert!(h.exists("processing/trigger_5000.json"));
    assert!(h.log_contains("failed to move trigger_5000.json out of processing"));

    // The next pass must not pick it up again.
    assert!(h.runtime.drain_once().await.is_empty());
    assert_eq!(h.exec.call_count(), 1);
}

#[tokio::test]
async fn activity_log_stays_bounded_across_many_jobs() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    for id in 1..=25 {
        h.add_trigger(id, "acme/app");
    }

    h.runtime.drain_once().await;

    let lines = h.log_lines();
    assert_eq!(lines.len(), redeploy::store::MAX_LOG_LINES);
    assert!(lines.last().unwrap().contains("update succeeded for trigger_25.json"));
}
