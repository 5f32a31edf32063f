// src/watch/mod.rs

//! Filesystem notifications for the trigger directory.
//!
//! Polling stays the source of truth; notifications only shorten the delay
//! between a trigger landing and the next drain pass.

pub mod watcher;

pub use watcher::{spawn_wakeup_watcher, WatcherHandle};
