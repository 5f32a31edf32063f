#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use redeploy::config::Settings;
use redeploy::engine::Runtime;
use redeploy::fs::{FileSystem, MockFileSystem};
use redeploy::queue::Trigger;
use redeploy_test_utils::builders::SettingsBuilder;
use redeploy_test_utils::fake_executor::{FakeExecutor, FakeProbe};

pub const ROOT: &str = "/q";

/// A runtime over an in-memory queue at `/q`.
pub struct Harness {
    pub fs: MockFileSystem,
    pub exec: FakeExecutor,
    pub probe: FakeProbe,
    pub runtime: Runtime,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(SettingsBuilder::new(ROOT).build(), FakeExecutor::new())
    }

    pub fn with(settings: Settings, exec: FakeExecutor) -> Self {
        let fs = MockFileSystem::new();
        let probe = FakeProbe::new(vec![Ok(true)]);
        let runtime = Runtime::new(
            settings,
            Arc::new(fs.clone()),
            Arc::new(exec.clone()),
            Arc::new(probe.clone()),
        );
        Self {
            fs,
            exec,
            probe,
            runtime,
        }
    }

    /// Drop a trigger for `repo` straight into the watch root.
    pub fn add_trigger(&self, id: u64, repo: &str) -> Trigger {
        let body = format!(
            r#"{{"receivedAt":"2024-01-01T00:00:00.000Z","payload":{{"repository":{{"full_name":"{repo}"}}}}}}"#
        );
        self.add_raw(id, &body)
    }

    pub fn add_raw(&self, id: u64, body: &str) -> Trigger {
        self.add_bytes(id, body.as_bytes())
    }

    pub fn add_bytes(&self, id: u64, body: &[u8]) -> Trigger {
        let trigger = Trigger::from_id(id);
        self.fs
            .add_file(Path::new(ROOT).join(trigger.name()), body.to_vec());
        trigger
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.fs.exists(&Path::new(ROOT).join(rel))
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.runtime.activity().read_tail(100)
    }

    pub fn log_contains(&self, needle: &str) -> bool {
        self.log_lines().iter().any(|l| l.contains(needle))
    }

    /// Names of trigger files in one directory relative to the root.
    pub fn triggers_in(&self, rel: &str) -> Vec<String> {
        let dir = if rel.is_empty() {
            Path::new(ROOT).to_path_buf()
        } else {
            Path::new(ROOT).join(rel)
        };
        let mut names: Vec<String> = self
            .fs
            .read_dir(&dir)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|n| n.starts_with("trigger_"))
            .collect();
        names.sort();
        names
    }
}
