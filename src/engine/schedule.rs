// src/engine/schedule.rs

//! "Run now, then re-arm with a computed interval."
//!
//! The interval choice ([`AdaptiveSchedule`]) is pure, and the waiting is
//! behind the [`Timer`] trait, so the health loop can be driven in tests
//! without wall-clock sleeps.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::Settings;
use crate::types::DeployState;

/// Re-poll delays: long while the stack is up, short otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveSchedule {
    pub active: Duration,
    pub inactive: Duration,
}

impl AdaptiveSchedule {
    pub fn new(active: Duration, inactive: Duration) -> Self {
        Self { active, inactive }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.health_active_interval,
            settings.health_inactive_interval,
        )
    }

    /// Delay before the next poll given the last observation. `None` means
    /// the poll failed; that re-arms at the short interval.
    pub fn next_delay(&self, observed: Option<DeployState>) -> Duration {
        match observed {
            Some(DeployState::Active) => self.active,
            _ => self.inactive,
        }
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Elapsed,
    Shutdown,
}

/// Something that can wait for a delay or be interrupted by shutdown.
pub trait Timer: Send {
    fn sleep(&mut self, delay: Duration) -> Pin<Box<dyn Future<Output = Tick> + Send + '_>>;
}

/// Real timer: `tokio::time::sleep`, cut short by the shutdown signal.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    shutdown: watch::Receiver<bool>,
}

impl TokioTimer {
    pub fn new(shutdown: watch::Receiver<bool>) -> Self {
        Self { shutdown }
    }
}

impl Timer for TokioTimer {
    fn sleep(&mut self, delay: Duration) -> Pin<Box<dyn Future<Output = Tick> + Send + '_>> {
        Box::pin(async move {
            if *self.shutdown.borrow() {
                return Tick::Shutdown;
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => Tick::Elapsed,
                // A dropped sender also means shutdown.
                _ = self.shutdown.changed() => Tick::Shutdown,
            }
        })
    }
}
