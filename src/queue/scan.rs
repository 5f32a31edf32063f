// src/queue/scan.rs

use std::path::Path;

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::queue::layout::QueueLayout;
use crate::queue::trigger::Trigger;

/// Pending triggers in the watch root, oldest first.
///
/// A missing or unreadable root yields an empty list: the receiver may not
/// have created it yet, or an operator may be moving it.
pub fn list_pending(fs: &dyn FileSystem, layout: &QueueLayout) -> Vec<Trigger> {
    list_in(fs, layout.root())
}

/// Trigger files directly inside `dir`, oldest first.
pub fn list_in(fs: &dyn FileSystem, dir: &Path) -> Vec<Trigger> {
    let entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(?dir, error = %err, "trigger dir not readable; treating as empty");
            return Vec::new();
        }
    };

    let mut triggers = Vec::new();
    for name in entries.iter().filter_map(|path| path.file_name()?.to_str()) {
        match Trigger::from_file_name(name) {
            Some(trigger) => triggers.push(trigger),
            None if Trigger::has_trigger_shape(name) => {
                warn!(?dir, file = %name, "trigger id out of range; file will never be processed");
            }
            None => {}
        }
    }
    triggers.sort();
    triggers
}
