// src/queue/state.rs

//! Typed trigger lifecycle.
//!
//! Directory membership is only the persistence of [`TriggerState`]; every
//! move goes through [`TriggerState::transition`] first and is recorded in
//! the JSON-lines audit file afterwards.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{RedeployError, Result};
use crate::fs::FileSystem;
use crate::queue::layout::QueueLayout;
use crate::queue::trigger::Trigger;
use crate::types::iso_timestamp;

/// Where a trigger is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerState {
    Pending,
    Processing,
    Processed,
    Failed,
    /// Failed because the body was not JSON; stored with a `.bad` suffix.
    Corrupt,
}

impl TriggerState {
    /// Validate a move from `self` to `to`.
    ///
    /// Legal moves:
    /// - `Pending -> Processing` (claim)
    /// - `Processing -> Processed | Failed | Corrupt` (outcome)
    /// - `Processing -> Pending` (startup requeue of a stuck trigger)
    pub fn transition(self, to: TriggerState) -> Result<TriggerState> {
        use TriggerState::*;

        match (self, to) {
            (Pending, Processing)
            | (Processing, Processed)
            | (Processing, Failed)
            | (Processing, Corrupt)
            | (Processing, Pending) => Ok(to),
            _ => Err(RedeployError::InvalidTransition { from: self, to }),
        }
    }
}

/// One line of `transitions.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub trigger: String,
    pub from: TriggerState,
    pub to: TriggerState,
    pub at: String,
}

/// Performs validated, audited moves of trigger files between state
/// directories.
#[derive(Debug, Clone)]
pub struct TriggerLifecycle {
    fs: Arc<dyn FileSystem>,
    layout: QueueLayout,
}

impl TriggerLifecycle {
    pub fn new(fs: Arc<dyn FileSystem>, layout: QueueLayout) -> Self {
        Self { fs, layout }
    }

    pub fn layout(&self) -> &QueueLayout {
        &self.layout
    }

    /// File location backing `trigger` in `state`.
    pub fn path_of(&self, trigger: &Trigger, state: TriggerState) -> PathBuf {
        match state {
            TriggerState::Pending => self.layout.root().join(trigger.name()),
            TriggerState::Processing => self.layout.processing_dir().join(trigger.name()),
            TriggerState::Processed => self.layout.processed_dir().join(trigger.name()),
            TriggerState::Failed => self.layout.failed_dir().join(trigger.name()),
            TriggerState::Corrupt => self
                .layout
                .failed_dir()
                .join(format!("{}.bad", trigger.name())),
        }
    }

    /// Claim a pending trigger for this runner.
    ///
    /// The rename is the only mutual exclusion between runners: when the
    /// source is gone, somebody else won and this returns `ClaimLost`.
    pub fn claim(&self, trigger: &Trigger) -> Result<PathBuf> {
        match self.move_to(trigger, TriggerState::Pending, TriggerState::Processing) {
            Err(RedeployError::FilesystemError { .. })
                if !self.fs.exists(&self.path_of(trigger, TriggerState::Pending)) =>
            {
                Err(RedeployError::ClaimLost(trigger.name().to_string()))
            }
            other => other,
        }
    }

    /// Move `trigger` from `from` to `to`, returning its new path.
    pub fn move_to(
        &self,
        trigger: &Trigger,
        from: TriggerState,
        to: TriggerState,
    ) -> Result<PathBuf> {
        from.transition(to)?;

        let src = self.path_of(trigger, from);
        let dst = self.path_of(trigger, to);
        self.fs
            .rename(&src, &dst)
            .map_err(|e| RedeployError::fs("rename", &src, e))?;

        debug!(trigger = %trigger.name(), ?from, ?to, "trigger moved");
        self.record(trigger, from, to);
        Ok(dst)
    }

    fn record(&self, trigger: &Trigger, from: TriggerState, to: TriggerState) {
        let record = TransitionRecord {
            trigger: trigger.name().to_string(),
            from,
            to,
            at: iso_timestamp(Utc::now()),
        };
        let line = match serde_json::to_string(&record) {
            Ok(json) => json + "\n",
            Err(e) => {
                warn!(error = %e, "failed to serialise transition record");
                return;
            }
        };
        let audit = self.layout.audit_file();
        if let Err(e) = self.fs.append(&audit, line.as_bytes()) {
            warn!(error = %e, path = ?audit, "failed to append transition record");
        }
    }

    /// Read back the audit trail (oldest first). Unparsable lines are skipped.
    pub fn history(&self) -> Vec<TransitionRecord> {
        let Ok(raw) = self.fs.read_to_string(&self.layout.audit_file()) else {
            return Vec::new();
        };
        raw.lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }
}
