// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The job processor and the health probe talk to a `CommandRunner` instead
//! of spawning processes themselves. Production code uses
//! [`super::ShellExecutor`]; tests provide an implementation that records
//! the commands and returns scripted results.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::errors::Result;

/// Captured result of one finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Process exit code; `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait abstracting how shell commands are executed.
///
/// A non-zero exit is *not* an error here: it is returned as a
/// `CommandOutput` for the caller to interpret. Errors are reserved for
/// "could not run / did not finish" (spawn failures, `ExecutionTimeout`).
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        command: &'a str,
        workdir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;
}
