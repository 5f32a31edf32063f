// src/exec/shell.rs

//! Production command runner.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{RedeployError, Result};
use crate::exec::backend::{CommandOutput, CommandRunner};

/// Runs commands via `sh -c` with a deadline and bounded output capture.
///
/// - Each of stdout/stderr keeps at most `max_output_bytes`; the rest is
///   read and discarded (the child must never block on a full pipe) and a
///   `[... N bytes truncated]` marker is appended.
/// - `timeout` bounds the whole run, output included. When it elapses the
///   command's process group is killed and the call fails with
///   `ExecutionTimeout`.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    timeout: Duration,
    max_output_bytes: usize,
}

impl ShellExecutor {
    pub fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            max_output_bytes,
        }
    }

    async fn run_inner(&self, command: &str, workdir: &Path) -> Result<CommandOutput> {
        debug!(cmd = %command, ?workdir, "starting command");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        };

        cmd.current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a deadline kill reaches everything `sh` started.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning `{command}` in {workdir:?}"))?;
        let pid = child.id();

        let limit = self.max_output_bytes;
        let mut stdout_task = tokio::spawn(capture_bounded(child.stdout.take(), limit));
        let mut stderr_task = tokio::spawn(capture_bounded(child.stderr.take(), limit));

        // The deadline covers the readers too: a background process holding
        // the pipes open keeps them from reaching EOF after `sh` exits.
        let finished = tokio::time::timeout(self.timeout, async {
            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for `{command}`"))?;
            let stdout = (&mut stdout_task)
                .await
                .context("joining stdout reader")?
                .context("reading stdout")?;
            let stderr = (&mut stderr_task)
                .await
                .context("joining stderr reader")?
                .context("reading stderr")?;
            Ok::<_, RedeployError>((status, stdout, stderr))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    cmd = %command,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "command exceeded its deadline; killing process group"
                );
                #[cfg(unix)]
                if let Some(pgid) = pid {
                    if let Err(e) = kill_process_group(pgid).await {
                        warn!(cmd = %command, pgid, error = %e, "failed to kill process group");
                    }
                }
                #[cfg(not(unix))]
                let _ = pid;
                if let Err(e) = child.kill().await {
                    debug!(cmd = %command, error = %e, "child already gone after group kill");
                }
                stdout_task.abort();
                stderr_task.abort();
                return Err(RedeployError::ExecutionTimeout {
                    after: self.timeout,
                });
            }
        };

        let exit_code = status.code().unwrap_or(-1);
        info!(cmd = %command, exit_code, success = status.success(), "command exited");

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

/// SIGKILL every process in group `pgid` via `kill -KILL -- -<pgid>`.
#[cfg(unix)]
async fn kill_process_group(pgid: u32) -> std::io::Result<()> {
    let status = Command::new("kill")
        .arg("-KILL")
        .arg("--")
        .arg(format!("-{pgid}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("kill exited with {status}")))
    }
}

impl CommandRunner for ShellExecutor {
    fn run<'a>(
        &'a self,
        command: &'a str,
        workdir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(self.run_inner(command, workdir))
    }
}

/// Read `reader` to EOF, keeping only the first `limit` bytes.
pub async fn capture_bounded<R>(reader: Option<R>, limit: usize) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };

    let mut kept = Vec::new();
    let mut dropped: u64 = 0;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let take = limit.saturating_sub(kept.len()).min(n);
        kept.extend_from_slice(&buf[..take]);
        dropped += (n - take) as u64;
    }

    let mut text = String::from_utf8_lossy(&kept).into_owned();
    if dropped > 0 {
        text.push_str(&format!("\n[... {dropped} bytes truncated]"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn short_output_is_kept_verbatim() {
        let out = capture_bounded(Some(&b"hello\n"[..]), 64).await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn long_output_is_cut_with_a_marker() {
        let data = vec![b'x'; 20_000];
        let out = capture_bounded(Some(&data[..]), 100).await.unwrap();
        assert!(out.starts_with(&"x".repeat(100)));
        assert!(out.ends_with("[... 19900 bytes truncated]"));
    }

    #[tokio::test]
    async fn absent_stream_is_empty() {
        let out = capture_bounded::<&[u8]>(None, 10).await.unwrap();
        assert!(out.is_empty());
    }
}
