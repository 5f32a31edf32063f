// src/queue/mod.rs

//! Durable, directory-backed trigger queue.
//!
//! A trigger's lifecycle state is persisted as the directory it sits in:
//!
//! ```text
//! <root>/trigger_<ms>.json              pending
//! <root>/processing/trigger_<ms>.json   processing
//! <root>/processed/trigger_<ms>.json    processed
//! <root>/failed/trigger_<ms>.json       failed
//! <root>/failed/trigger_<ms>.json.bad   failed (corrupt payload)
//! ```
//!
//! - [`layout`] knows where everything lives.
//! - [`trigger`] parses names and bodies.
//! - [`state`] holds the typed state machine and performs audited moves.
//! - [`scan`] lists pending triggers in arrival order.
//! - [`enqueue`] is the write-side contract for webhook receivers.
//! - [`reclaim`] handles triggers left in `processing/` by a previous run.

pub mod enqueue;
pub mod layout;
pub mod reclaim;
pub mod scan;
pub mod state;
pub mod trigger;

pub use enqueue::enqueue_trigger;
pub use layout::QueueLayout;
pub use reclaim::{reclaim_stuck, ReclaimReport};
pub use scan::{list_in, list_pending};
pub use state::{TransitionRecord, TriggerLifecycle, TriggerState};
pub use trigger::{Trigger, TriggerDocument};
