// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod queue;
pub mod store;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tokio::sync::watch as shutdown;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::{load_settings, Settings};
use crate::engine::{JobOutcome, Runtime};
use crate::fs::{FileSystem, RealFileSystem};
use crate::queue::{enqueue_trigger, QueueLayout};
use crate::store::{ActivityLog, StatusStore, MAX_LOG_LINES};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings (file + env + flags)
/// - the one-shot modes (`--dry-run`, `--status`, `--enqueue`, `--once`)
/// - the long-running runtime (drain loop + health loop)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(args.config.as_deref(), args.overrides())?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(());
    }

    if args.status {
        print_status(&settings);
        return Ok(());
    }

    if let Some(repo) = args.enqueue.as_deref() {
        let layout = QueueLayout::new(&settings.trigger_dir);
        let payload = json!({ "repository": { "full_name": repo } });
        let path = enqueue_trigger(&RealFileSystem, &layout, payload, Utc::now())?;
        println!("{}", path.display());
        return Ok(());
    }

    let runtime = Runtime::from_settings(settings);

    if args.once {
        runtime.startup()?;
        let report = runtime.drain_once().await;
        info!(
            jobs = report.jobs.len(),
            updates = report.jobs.iter().filter(|(_, o)| o.ran_update()).count(),
            deployed = report.count(JobOutcome::Deployed),
            "single drain finished"
        );
        return Ok(());
    }

    // Ctrl-C → graceful shutdown.
    let (shutdown_tx, shutdown_rx) = shutdown::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    runtime.run(shutdown_rx).await?;
    Ok(())
}

/// Simple dry-run output: print the resolved settings.
fn print_dry_run(settings: &Settings) {
    println!("redeploy dry-run");
    println!("  trigger_dir = {}", settings.trigger_dir.display());
    println!("  update_cmd = {}", settings.update_cmd);
    println!("  compose_path = {}", settings.compose_path.display());
    println!("  workdir = {}", settings.workdir.display());
    println!("  health_cmd = {}", settings.health_cmd);
    println!("  poll_interval = {:?}", settings.poll_interval);
    println!(
        "  health intervals = {:?} (active) / {:?} (inactive)",
        settings.health_active_interval, settings.health_inactive_interval
    );
    println!("  update_timeout = {:?}", settings.update_timeout);
    println!("  max_output_bytes = {}", settings.max_output_bytes);
    println!("  stuck_policy = {:?}", settings.stuck_policy);

    debug!("dry-run complete (no execution)");
}

/// What the dashboard API would serve: the status record and the log tail.
fn print_status(settings: &Settings) {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let layout = QueueLayout::new(&settings.trigger_dir);
    let status = StatusStore::new(fs.clone(), layout.status_file(), settings.version.clone());
    let activity = ActivityLog::new(fs, layout.log_file());

    match serde_json::to_string_pretty(&status.read()) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to render status: {e}"),
    }
    for line in activity.read_tail(MAX_LOG_LINES) {
        println!("{line}");
    }
}
