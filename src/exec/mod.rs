// src/exec/mod.rs

//! Process execution layer.
//!
//! Commands are run through `sh -c` with `tokio::process::Command`, so shell
//! operators in configured commands work as written.
//!
//! - [`backend`] provides the `CommandRunner` trait the engine talks to,
//!   which tests replace with a scripted fake.
//! - [`shell`] is the production runner: bounded output capture and an
//!   execution deadline.

pub mod backend;
pub mod shell;

pub use backend::{CommandOutput, CommandRunner};
pub use shell::ShellExecutor;
