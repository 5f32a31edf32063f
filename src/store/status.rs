// src/store/status.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{RedeployError, Result};
use crate::fs::FileSystem;
use crate::types::DeployState;

/// The singleton `status.json` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub state: DeployState,
    pub version: String,
    pub last_repo: Option<String>,
    pub last_at: Option<String>,
}

/// A partial record. Missing fields fall back to the baseline, not to the
/// previously stored value.
///
/// Also used to read the file, so a hand-written `{"state":"inactive"}` is
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusUpdate {
    pub state: Option<DeployState>,
    pub version: Option<String>,
    pub last_repo: Option<String>,
    pub last_at: Option<String>,
}

#[derive(Debug)]
pub struct StatusStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    version: String,
    lock: Mutex<()>,
}

impl StatusStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            fs,
            path: path.into(),
            version: version.into(),
            lock: Mutex::new(()),
        }
    }

    /// `inactive`, current version, no last update.
    pub fn baseline(&self) -> StatusRecord {
        StatusRecord {
            state: DeployState::Inactive,
            version: self.version.clone(),
            last_repo: None,
            last_at: None,
        }
    }

    fn merged(&self, update: StatusUpdate) -> StatusRecord {
        let base = self.baseline();
        StatusRecord {
            state: update.state.unwrap_or(base.state),
            version: update.version.unwrap_or(base.version),
            last_repo: update.last_repo,
            last_at: update.last_at,
        }
    }

    /// Current record; the baseline when the file is missing or unparsable.
    pub fn read(&self) -> StatusRecord {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_unlocked()
    }

    fn read_unlocked(&self) -> StatusRecord {
        let raw = match self.fs.read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return self.baseline(),
        };
        match serde_json::from_str::<StatusUpdate>(&raw) {
            Ok(stored) => self.merged(stored),
            Err(err) => {
                debug!(path = ?self.path, error = %err, "status file unparsable; using defaults");
                self.baseline()
            }
        }
    }

    /// Merge `update` onto the baseline and replace the stored record.
    pub fn write(&self, update: StatusUpdate) -> Result<StatusRecord> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let record = self.merged(update);
        self.persist(&record)?;
        Ok(record)
    }

    /// Change only `state`, keeping `lastRepo`/`lastAt`/`version` as stored.
    pub fn set_state(&self, state: DeployState) -> Result<StatusRecord> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = self.read_unlocked();
        record.state = state;
        self.persist(&record)?;
        Ok(record)
    }

    /// Write the baseline if no status file exists yet. Returns true if written.
    pub fn ensure_exists(&self) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.fs.exists(&self.path) {
            return Ok(false);
        }
        self.persist(&self.baseline())?;
        Ok(true)
    }

    fn persist(&self, record: &StatusRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)?;
        self.fs
            .write_atomic(&self.path, &json)
            .map_err(|e| RedeployError::fs("write", &self.path, e))
    }
}
