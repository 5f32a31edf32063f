// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Result;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Whether an event can mean "a new trigger appeared".
///
/// Receivers write a temp file and rename it into place, so renames matter
/// as much as creations.
pub fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

/// Watch `root` (non-recursively) and send a wake-up on `wake_tx` whenever
/// something may have arrived.
///
/// `wake_tx` should have capacity 1: a full channel already holds a pending
/// wake-up, so extra events are dropped.
pub fn spawn_wakeup_watcher(
    root: impl Into<PathBuf>,
    wake_tx: mpsc::Sender<()>,
) -> Result<WatcherHandle> {
    let root = root.into();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) if is_arrival(&event.kind) => {
                let _ = wake_tx.try_send(());
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "trigger dir watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::NonRecursive)?;

    info!("trigger dir watcher started on {:?}", root);

    Ok(WatcherHandle { _inner: watcher })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, RenameMode};

    #[test]
    fn creations_and_renames_are_arrivals() {
        assert!(is_arrival(&EventKind::Create(CreateKind::File)));
        assert!(is_arrival(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(!is_arrival(&EventKind::Access(AccessKind::Any)));
        assert!(!is_arrival(&EventKind::Modify(ModifyKind::Any)));
    }
}
