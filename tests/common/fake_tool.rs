//! Scripted in-memory `MediaTool`
//!
//! Probes succeed only for the strategy names listed in `succeeding`.
//! Transfers follow the configured `FakeTransfer` behavior and record
//! every call for later verification.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Cursor;
use tokio::sync::oneshot;

use tubeloader::core::process::ProcessExit;
use tubeloader::download::{DownloadError, MediaTool, ProbeResult, RunningTransfer, Strategy, TransferPlan};

/// How the fake transfer behaves.
#[derive(Debug, Clone)]
pub enum FakeTransfer {
    /// Writes `bytes` bytes to the output path, prints the given output, exits 0
    Succeed {
        stdout: String,
        stderr: String,
        bytes: usize,
    },
    /// Exits 0 without creating the output file
    NoOutput,
    /// Exits with this code
    Fail(i32),
    /// Never starts
    SpawnError,
}

/// A recorded transfer call.
#[derive(Debug, Clone)]
pub struct TransferCall {
    pub strategy: String,
    pub url: String,
    pub plan: TransferPlan,
}

pub struct FakeTool {
    pub succeeding: Vec<String>,
    pub probe_result: ProbeResult,
    pub transfer: FakeTransfer,
    /// Every probe fails as if the executable were missing
    pub unavailable: bool,
    pub probe_calls: Mutex<Vec<String>>,
    pub transfer_calls: Mutex<Vec<TransferCall>>,
}

impl FakeTool {
    pub fn new(succeeding: &[&str], title: &str, transfer: FakeTransfer) -> Self {
        Self {
            succeeding: succeeding.iter().map(|s| s.to_string()).collect(),
            probe_result: ProbeResult {
                title: title.to_string(),
                duration: "3:45".to_string(),
                filename: format!("{} [abc].mp4", title),
            },
            transfer,
            unavailable: false,
            probe_calls: Mutex::new(Vec::new()),
            transfer_calls: Mutex::new(Vec::new()),
        }
    }

    /// Fake whose transfer writes `bytes` bytes and prints typical progress.
    pub fn succeeding_with(succeeding: &[&str], title: &str, bytes: usize) -> Self {
        Self::new(
            succeeding,
            title,
            FakeTransfer::Succeed {
                stdout: "[youtube] abc: Downloading webpage\n[download]  50.0% of 1.00MiB\r[download] 100.0% of 1.00MiB\n"
                    .to_string(),
                stderr: String::new(),
                bytes,
            },
        )
    }

    /// Fake whose executable cannot be started.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(&[], "Title", FakeTransfer::SpawnError)
        }
    }

    pub fn probe_calls(&self) -> Vec<String> {
        self.probe_calls.lock().clone()
    }

    pub fn transfer_calls(&self) -> Vec<TransferCall> {
        self.transfer_calls.lock().clone()
    }
}

fn finished(stdout: String, stderr: String, exit: ProcessExit) -> RunningTransfer {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(exit);
    RunningTransfer {
        stdout: Box::pin(Cursor::new(stdout.into_bytes())),
        stderr: Box::pin(Cursor::new(stderr.into_bytes())),
        exit: rx,
    }
}

#[async_trait]
impl MediaTool for FakeTool {
    async fn probe(&self, strategy: &Strategy, _url: &str) -> Result<ProbeResult, DownloadError> {
        self.probe_calls.lock().push(strategy.name.clone());
        if self.unavailable {
            return Err(DownloadError::ToolUnavailable(
                "yt-dlp: No such file or directory (os error 2)".to_string(),
            ));
        }
        if self.succeeding.contains(&strategy.name) {
            Ok(self.probe_result.clone())
        } else {
            Err(DownloadError::probe_failed(&strategy.name, "ERROR: Sign in to confirm you're not a bot"))
        }
    }

    async fn start_transfer(
        &self,
        strategy: &Strategy,
        url: &str,
        plan: &TransferPlan,
    ) -> Result<RunningTransfer, DownloadError> {
        self.transfer_calls.lock().push(TransferCall {
            strategy: strategy.name.clone(),
            url: strategy.target_url(url),
            plan: plan.clone(),
        });

        match &self.transfer {
            FakeTransfer::Succeed { stdout, stderr, bytes } => {
                std::fs::write(&plan.output, vec![0u8; *bytes])
                    .map_err(|e| DownloadError::TransferFailed(e.to_string()))?;
                Ok(finished(stdout.clone(), stderr.clone(), ProcessExit::Exited(0)))
            }
            FakeTransfer::NoOutput => Ok(finished(String::new(), String::new(), ProcessExit::Exited(0))),
            FakeTransfer::Fail(code) => Ok(finished(
                String::new(),
                "ERROR: unable to download video data: HTTP Error 403: Forbidden\n".to_string(),
                ProcessExit::Exited(*code),
            )),
            FakeTransfer::SpawnError => Err(DownloadError::TransferFailed("failed to spawn yt-dlp".to_string())),
        }
    }
}
