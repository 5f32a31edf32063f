//! Scripted stand-ins for the process-spawning seams.

use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use redeploy::engine::{StackProbe, Tick, Timer};
use redeploy::errors::{RedeployError, Result};
use redeploy::exec::{CommandOutput, CommandRunner};

/// A fake command runner that:
/// - records every `(command, workdir)` it was asked to run
/// - answers with scripted results, in order (success once the script runs out)
/// - optionally sleeps before answering, to widen race windows
/// - tracks the highest number of concurrent runs it has seen
#[derive(Clone, Default)]
pub struct FakeExecutor {
    script: Arc<Mutex<VecDeque<Result<CommandOutput>>>>,
    calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
    delay: Option<Duration>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a finished command with the given exit code and output.
    pub fn push_output(&self, exit_code: i32, stdout: &str, stderr: &str) -> &Self {
        self.push(Ok(CommandOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }))
    }

    pub fn push_error(&self, err: RedeployError) -> &Self {
        self.push(Err(err))
    }

    fn push(&self, result: Result<CommandOutput>) -> &Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    /// Commands run so far, oldest first.
    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn workdirs(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().iter().map(|(_, w)| w.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

impl CommandRunner for FakeExecutor {
    fn run<'a>(
        &'a self,
        command: &'a str,
        workdir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((command.to_string(), workdir.to_path_buf()));

            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let next = self.script.lock().unwrap().pop_front();
            self.running.fetch_sub(1, Ordering::SeqCst);

            next.unwrap_or_else(|| Ok(CommandOutput::default()))
        })
    }
}

/// A fake stack probe answering from a script; once the script is exhausted
/// the last answer repeats.
#[derive(Clone)]
pub struct FakeProbe {
    script: Arc<Mutex<VecDeque<std::result::Result<bool, String>>>>,
    last: Arc<Mutex<std::result::Result<bool, String>>>,
    polls: Arc<AtomicUsize>,
}

impl FakeProbe {
    /// `Ok(true)` = running, `Ok(false)` = down, `Err(msg)` = probe failure.
    pub fn new(answers: Vec<std::result::Result<bool, String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(answers.into())),
            last: Arc::new(Mutex::new(Ok(false))),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl StackProbe for FakeProbe {
    fn is_running(&self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(async move {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let answer = match self.script.lock().unwrap().pop_front() {
                Some(answer) => {
                    *self.last.lock().unwrap() = answer.clone();
                    answer
                }
                None => self.last.lock().unwrap().clone(),
            };
            answer.map_err(RedeployError::HealthPollError)
        })
    }
}

/// A timer that never waits: it records each requested delay and reports
/// shutdown on the `stop_after`-th sleep.
#[derive(Clone)]
pub struct FakeTimer {
    delays: Arc<Mutex<Vec<Duration>>>,
    stop_after: usize,
}

impl FakeTimer {
    pub fn new(stop_after: usize) -> Self {
        Self {
            delays: Arc::new(Mutex::new(Vec::new())),
            stop_after,
        }
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Timer for FakeTimer {
    fn sleep(&mut self, delay: Duration) -> Pin<Box<dyn Future<Output = Tick> + Send + '_>> {
        Box::pin(async move {
            let mut delays = self.delays.lock().unwrap();
            delays.push(delay);
            if delays.len() >= self.stop_after {
                Tick::Shutdown
            } else {
                Tick::Elapsed
            }
        })
    }
}
