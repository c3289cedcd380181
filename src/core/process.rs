//! Process execution utilities with timeout support
//!
//! Provides helpers for running the external media tool either to completion
//! (probes) or in the background while its pipes are drained (transfers),
//! with timeouts so a hung process never blocks a job forever.

use std::fmt;
use std::io;
use std::process::Output;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

/// How a supervised child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessExit {
    /// Exited on its own with this status code
    Exited(i32),
    /// Killed by a signal (no exit code available)
    Terminated,
    /// Outlived its deadline and was killed
    TimedOut(Duration),
    /// Waiting on the child failed
    WaitFailed(String),
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        matches!(self, ProcessExit::Exited(0))
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessExit::Exited(code) => write!(f, "exit code {}", code),
            ProcessExit::Terminated => write!(f, "terminated by signal"),
            ProcessExit::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            ProcessExit::WaitFailed(reason) => write!(f, "wait failed: {}", reason),
        }
    }
}

/// Run an async Command with a timeout.
///
/// Returns the process Output on success, or an `io::ErrorKind::TimedOut`
/// error when the deadline passes. Callers should set `kill_on_drop(true)`
/// so the abandoned child is reaped.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> io::Result<Output> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("Process timed out after {}s", timeout.as_secs()),
        )),
    }
}

/// Spawn a task that waits for a process to exit and sends the result
/// through a oneshot channel.
///
/// If the process is still running when `timeout` elapses it is killed and
/// `ProcessExit::TimedOut` is sent.
pub fn spawn_process_waiter(mut child: Child, timeout: Duration) -> oneshot::Receiver<ProcessExit> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let exit = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => match status.code() {
                    Some(code) => {
                        if code != 0 {
                            log::warn!("Process exited with code: {}", code);
                        }
                        ProcessExit::Exited(code)
                    }
                    None => ProcessExit::Terminated,
                },
                Err(e) => {
                    log::error!("Error waiting for process: {}", e);
                    ProcessExit::WaitFailed(e.to_string())
                }
            },
            _ = tokio::time::sleep(timeout) => {
                log::error!("Process timed out after {}s, killing", timeout.as_secs());
                let _ = child.kill().await;
                ProcessExit::TimedOut(timeout)
            }
        };
        let _ = tx.send(exit);
    });

    rx
}
