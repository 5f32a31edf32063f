// tests/cli_modes.rs

#![cfg(unix)]

use clap::Parser;
use redeploy::cli::CliArgs;
use redeploy_test_utils::with_timeout;

fn args(dir: &std::path::Path, extra: &[&str]) -> CliArgs {
    let dir = dir.to_str().unwrap();
    let mut argv = vec![
        "redeploy",
        "--trigger-dir",
        dir,
        "--compose-dir",
        dir,
        "--update-cmd",
        "true",
    ];
    argv.extend_from_slice(extra);
    CliArgs::parse_from(argv)
}

#[tokio::test]
async fn enqueue_then_once_deploys_the_queued_trigger() {
    let dir = tempfile::tempdir().unwrap();

    with_timeout(redeploy::run(args(dir.path(), &["--enqueue", "acme/app"])))
        .await
        .unwrap();
    let queued: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("trigger_") && n.ends_with(".json"))
        .collect();
    assert_eq!(queued.len(), 1);

    with_timeout(redeploy::run(args(dir.path(), &["--once"])))
        .await
        .unwrap();

    assert!(dir.path().join("processed").join(&queued[0]).exists());
    let status: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("status.json")).unwrap())
            .unwrap();
    assert_eq!(status["state"], "active");
    assert_eq!(status["lastRepo"], "acme/app");
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();

    redeploy::run(args(dir.path(), &["--dry-run"])).await.unwrap();

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
