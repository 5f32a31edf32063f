// src/queue/enqueue.rs

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::errors::{RedeployError, Result};
use crate::fs::FileSystem;
use crate::queue::layout::QueueLayout;
use crate::queue::trigger::Trigger;
use crate::types::iso_timestamp;

/// Write a trigger the way webhook receivers must: full body to a temporary
/// name in the root, then rename into place, so a scan never sees a partial
/// file.
///
/// The id is `received_at` in epoch millis, bumped past any trigger already
/// pending with the same id.
pub fn enqueue_trigger(
    fs: &dyn FileSystem,
    layout: &QueueLayout,
    payload: Value,
    received_at: DateTime<Utc>,
) -> Result<PathBuf> {
    fs.create_dir_all(layout.root())
        .map_err(|e| RedeployError::fs("create_dir", layout.root(), e))?;

    let mut id = u64::try_from(received_at.timestamp_millis()).unwrap_or_default();
    let mut trigger = Trigger::from_id(id);
    while fs.exists(&layout.root().join(trigger.name())) {
        id += 1;
        trigger = Trigger::from_id(id);
    }

    let body = json!({
        "receivedAt": iso_timestamp(received_at),
        "payload": payload,
    });
    let content = serde_json::to_vec_pretty(&body)?;

    let final_path = layout.root().join(trigger.name());
    let tmp_path = layout.root().join(format!("{}.tmp", trigger.name()));
    fs.write_atomic(&tmp_path, &content)
        .map_err(|e| RedeployError::fs("write", &tmp_path, e))?;
    fs.rename(&tmp_path, &final_path)
        .map_err(|e| RedeployError::fs("rename", &tmp_path, e))?;

    Ok(final_path)
}
