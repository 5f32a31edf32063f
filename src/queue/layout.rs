// src/queue/layout.rs

use std::path::{Path, PathBuf};

use crate::errors::{RedeployError, Result};
use crate::fs::FileSystem;

pub const PROCESSING_DIR: &str = "processing";
pub const PROCESSED_DIR: &str = "processed";
pub const FAILED_DIR: &str = "failed";
pub const STATUS_FILE: &str = "status.json";
pub const LOG_FILE: &str = "update.log";
pub const AUDIT_FILE: &str = "transitions.jsonl";

/// Paths of everything living under the trigger directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLayout {
    root: PathBuf,
}

impl QueueLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pending triggers live directly in the root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn processing_dir(&self) -> PathBuf {
        self.root.join(PROCESSING_DIR)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR)
    }

    pub fn failed_dir(&self) -> PathBuf {
        self.root.join(FAILED_DIR)
    }

    pub fn status_file(&self) -> PathBuf {
        self.root.join(STATUS_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn audit_file(&self) -> PathBuf {
        self.root.join(AUDIT_FILE)
    }

    /// Create the root and the three state directories if missing.
    pub fn ensure(&self, fs: &dyn FileSystem) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.processing_dir(),
            self.processed_dir(),
            self.failed_dir(),
        ] {
            fs.create_dir_all(&dir)
                .map_err(|e| RedeployError::fs("create_dir", &dir, e))?;
        }
        Ok(())
    }
}
