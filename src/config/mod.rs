// src/config/mod.rs

//! Configuration for the redeploy daemon.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated `Settings` (`model.rs`).
//! - Load an optional config file and layer CLI/env overrides (`loader.rs`).
//! - Validate basic invariants like non-empty commands (`validate.rs`).
//!
//! `Settings` is built once at startup and handed to every component
//! constructor; nothing reads configuration from globals.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, load_settings};
pub use model::{RawSettings, Settings, SettingsOverrides};
