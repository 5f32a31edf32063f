// src/store/mod.rs

//! The two files the dashboard reads.
//!
//! Both stores are shared (`Arc`) between the queue drain and the health
//! poller. Each one serialises its own read-modify-write cycle behind a
//! mutex, so the two loops can never interleave partial updates.

pub mod activity;
pub mod status;

pub use activity::{ActivityLog, MAX_LOG_LINES};
pub use status::{StatusRecord, StatusStore, StatusUpdate};
