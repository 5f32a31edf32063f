// src/store/activity.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use crate::errors::{RedeployError, Result};
use crate::fs::FileSystem;
use crate::types::iso_timestamp;

/// Number of non-empty lines kept in `update.log`.
pub const MAX_LOG_LINES: usize = 40;

/// Bounded activity log: `[<ISO timestamp>] <message>` per line, FIFO
/// eviction past [`MAX_LOG_LINES`].
#[derive(Debug)]
pub struct ActivityLog {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    max_lines: usize,
    lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            max_lines: MAX_LOG_LINES,
            lock: Mutex::new(()),
        }
    }

    /// Append one timestamped line, then trim to the newest `max_lines`.
    ///
    /// Line breaks inside `message` are flattened so each append stays one
    /// record.
    pub fn append(&self, message: &str) -> Result<()> {
        let flat: String = message
            .trim_end()
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let line = format!("[{}] {}\n", iso_timestamp(Utc::now()), flat);

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.fs
            .append(&self.path, line.as_bytes())
            .map_err(|e| RedeployError::fs("append", &self.path, e))?;
        self.trim()
    }

    fn trim(&self) -> Result<()> {
        let lines = self.lines();
        if lines.len() <= self.max_lines {
            return Ok(());
        }
        let mut tail = lines[lines.len() - self.max_lines..].join("\n");
        tail.push('\n');
        self.fs
            .write_atomic(&self.path, tail.as_bytes())
            .map_err(|e| RedeployError::fs("write", &self.path, e))
    }

    fn lines(&self) -> Vec<String> {
        match self.fs.read_to_string(&self.path) {
            Ok(raw) => raw
                .lines()
                .map(|l| l.trim_end_matches('\r'))
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Up to `n` most recent lines, oldest first. Missing file → empty.
    pub fn read_tail(&self, n: usize) -> Vec<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let lines = self.lines();
        let start = lines.len().saturating_sub(n);
        lines[start..].to_vec()
    }
}
