// tests/health_poller.rs

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Harness;
use redeploy::engine::health::run_health_loop;
use redeploy::engine::{AdaptiveSchedule, ComposeProbe, HealthPoller, StackProbe};
use redeploy::errors::RedeployError;
use redeploy::exec::CommandRunner;
use redeploy::store::StatusUpdate;
use redeploy::types::DeployState;
use redeploy_test_utils::fake_executor::{FakeExecutor, FakeProbe, FakeTimer};
use redeploy_test_utils::init_tracing;

fn poller(h: &Harness, probe: FakeProbe) -> HealthPoller {
    HealthPoller::new(
        Arc::new(probe),
        h.runtime.status().clone(),
        h.runtime.activity().clone(),
    )
}

#[tokio::test]
async fn writes_status_only_when_observed_state_changes() {
    init_tracing();
    let h = Harness::new();
    h.runtime.startup().unwrap();
    let writes_after_startup = h.fs.write_count("/q/status.json");

    let mut p = poller(&h, FakeProbe::new(vec![Ok(false), Ok(true), Ok(true)]));

    let first = p.poll_once().await;
    assert_eq!(first.observed, Some(DeployState::Inactive));
    assert!(!first.changed, "stored state is already inactive");

    let second = p.poll_once().await;
    assert!(second.changed);
    let third = p.poll_once().await;
    assert!(!third.changed);
    assert_eq!(p.last_observed(), Some(DeployState::Active));

    assert_eq!(h.fs.write_count("/q/status.json"), writes_after_startup + 1);
    assert_eq!(h.runtime.status().read().state, DeployState::Active);
    let changes: Vec<_> = h
        .log_lines()
        .into_iter()
        .filter(|l| l.contains("compose poll: state="))
        .collect();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].ends_with("compose poll: state=active"));
}

#[tokio::test]
async fn state_change_keeps_last_deployment_fields() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    h.runtime
        .status()
        .write(StatusUpdate {
            state: Some(DeployState::Active),
            version: None,
            last_repo: Some("acme/app".to_string()),
            last_at: Some("2024-01-01T00:00:00.000Z".to_string()),
        })
        .unwrap();

    let mut p = poller(&h, FakeProbe::new(vec![Ok(false)]));
    assert!(p.poll_once().await.changed);

    let status = h.runtime.status().read();
    assert_eq!(status.state, DeployState::Inactive);
    assert_eq!(status.last_repo.as_deref(), Some("acme/app"));
    assert_eq!(status.last_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
}

#[tokio::test]
async fn probe_error_is_logged_and_leaves_status_alone() {
    let h = Harness::new();
    h.runtime.startup().unwrap();
    let before = h.fs.write_count("/q/status.json");

    let mut p = poller(&h, FakeProbe::new(vec![Err("daemon down".to_string())]));
    let outcome = p.poll_once().await;

    assert_eq!(outcome.observed, None);
    assert!(!outcome.changed);
    assert_eq!(h.fs.write_count("/q/status.json"), before);
    assert!(h.log_contains("compose poll error:"));
    assert!(h.log_contains("daemon down"));
}

#[tokio::test]
async fn loop_rearms_with_adaptive_delays() {
    let h = Harness::new();
    h.runtime.startup().unwrap();

    let probe = FakeProbe::new(vec![
        Ok(true),
        Ok(true),
        Ok(false),
        Err("timeout".to_string()),
        Ok(true),
    ]);
    let schedule = AdaptiveSchedule::new(Duration::from_secs(300), Duration::from_secs(60));
    let timer = FakeTimer::new(5);

    let polls = run_health_loop(poller(&h, probe.clone()), schedule, timer.clone()).await;

    assert_eq!(polls, 5);
    assert_eq!(probe.polls(), 5);
    let secs: Vec<u64> = timer.delays().iter().map(Duration::as_secs).collect();
    assert_eq!(secs, vec![300, 300, 60, 60, 300]);
}

#[tokio::test]
async fn compose_probe_maps_command_results() {
    let exec = FakeExecutor::new();
    exec.push_output(0, "abc123\ndef456\n", "");
    exec.push_output(0, "\n", "");
    exec.push_output(1, "", "no such project");
    exec.push_error(RedeployError::ExecutionTimeout {
        after: Duration::from_secs(30),
    });

    let runner: Arc<dyn CommandRunner> = Arc::new(exec.clone());
    let probe = ComposeProbe::new(runner, "docker compose ps -q", "/srv/app");

    assert!(probe.is_running().await.unwrap());
    assert!(!probe.is_running().await.unwrap());
    assert!(matches!(
        probe.is_running().await,
        Err(RedeployError::HealthPollError(msg)) if msg.contains("no such project")
    ));
    assert!(matches!(
        probe.is_running().await,
        Err(RedeployError::HealthPollError(_))
    ));

    assert_eq!(exec.commands()[0], "docker compose ps -q");
    assert_eq!(exec.workdirs()[0], std::path::PathBuf::from("/srv/app"));
}
