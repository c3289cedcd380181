//! Process invoker: runs the media tool in probe or transfer mode.
//!
//! `MediaTool` is the seam the prober and orchestrator depend on; `YtDlp`
//! is the production implementation that spawns the external executable.

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::core::config;
use crate::core::process::{run_with_timeout, spawn_process_waiter, ProcessExit};
use crate::download::error::DownloadError;
use crate::download::strategy::Strategy;

/// Number of structured lines a probe must print.
pub const PROBE_FIELDS: usize = 3;

const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const BROWSER_HEADERS: &[&str] = &[
    "Accept:text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    "Accept-Language:en-US,en;q=0.5",
    "Accept-Encoding:gzip, deflate, br",
    "DNT:1",
    "Connection:keep-alive",
    "Upgrade-Insecure-Requests:1",
];

/// Metadata returned by a successful probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub title: String,
    pub duration: String,
    pub filename: String,
}

/// What a transfer should fetch and where it should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Format selector passed to `-f`
    pub format: String,
    /// Exact output path passed to `-o`
    pub output: PathBuf,
}

pub type OutputStream = Pin<Box<dyn AsyncRead + Send>>;

/// A started transfer: two live output pipes and its completion handle.
pub struct RunningTransfer {
    pub stdout: OutputStream,
    pub stderr: OutputStream,
    pub exit: oneshot::Receiver<ProcessExit>,
}

impl std::fmt::Debug for RunningTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningTransfer").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Fetch metadata without downloading media.
    async fn probe(&self, strategy: &Strategy, url: &str) -> Result<ProbeResult, DownloadError>;

    /// Start the streaming download. Errors here mean the process never ran.
    async fn start_transfer(
        &self,
        strategy: &Strategy,
        url: &str,
        plan: &TransferPlan,
    ) -> Result<RunningTransfer, DownloadError>;
}

/// Parses probe stdout: the first three non-empty lines are title,
/// duration and filename hint.
pub fn parse_probe_output(stdout: &str) -> Option<ProbeResult> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let title = lines.next()?;
    let duration = lines.next()?;
    let filename = lines.next()?;
    Some(ProbeResult {
        title: title.to_string(),
        duration: duration.to_string(),
        filename: filename.to_string(),
    })
}

/// The yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: String,
    probe_timeout: Duration,
    transfer_timeout: Duration,
}

impl YtDlp {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            probe_timeout: config::download::probe_timeout(),
            transfer_timeout: config::download::transfer_timeout(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(config::YTDL_BIN.as_str())
    }

    pub fn with_timeouts(mut self, probe: Duration, transfer: Duration) -> Self {
        self.probe_timeout = probe;
        self.transfer_timeout = transfer;
        self
    }

    /// Full probe argv (without the executable).
    pub fn probe_args(strategy: &Strategy, url: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "--get-title",
            "--get-duration",
            "--get-filename",
            "--no-playlist",
            "--no-check-certificates",
            "--prefer-free-formats",
            "--no-warnings",
            "--ignore-errors",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend(strategy.args.iter().cloned());
        args.push(strategy.target_url(url));
        args
    }

    /// Full transfer argv (without the executable).
    pub fn transfer_args(strategy: &Strategy, url: &str, plan: &TransferPlan) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-f".into(),
            plan.format.clone(),
            "--newline".into(),
            "--progress".into(),
            "--no-playlist".into(),
            "-o".into(),
            plan.output.to_string_lossy().into_owned(),
            "--user-agent".into(),
            BROWSER_UA.into(),
            "--referer".into(),
            "https://www.youtube.com/".into(),
        ];
        for header in BROWSER_HEADERS {
            args.push("--add-header".into());
            args.push((*header).into());
        }
        args.extend(
            [
                "--no-check-certificates",
                "--prefer-free-formats",
                "--no-warnings",
                "--sleep-interval",
                "1",
                "--max-sleep-interval",
                "3",
                "--retries",
                "3",
                "--fragment-retries",
                "3",
                "--skip-unavailable-fragments",
                "--limit-rate",
                "10M",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        // Strategy flags come last so they override the baseline (yt-dlp keeps the last value).
        args.extend(strategy.args.iter().cloned());
        args.push(strategy.target_url(url));
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl MediaTool for YtDlp {
    async fn probe(&self, strategy: &Strategy, url: &str) -> Result<ProbeResult, DownloadError> {
        let args = Self::probe_args(strategy, url);
        log::debug!("yt-dlp probe command [{}]: {} {}", strategy.name, self.bin, args.join(" "));

        let output = run_with_timeout(&mut self.command(&args), self.probe_timeout)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    DownloadError::ToolUnavailable(format!("{}: {}", self.bin, e))
                }
                _ => DownloadError::probe_failed(&strategy.name, e.to_string()),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = match output.status.code() {
                Some(code) => ProcessExit::Exited(code),
                None => ProcessExit::Terminated,
            };
            let reason = match last_line(&stderr) {
                Some(line) => format!("{}: {}", status, line),
                None => status.to_string(),
            };
            return Err(DownloadError::probe_failed(&strategy.name, reason));
        }

        parse_probe_output(&stdout).ok_or_else(|| {
            DownloadError::probe_failed(
                &strategy.name,
                format!(
                    "expected {} output lines, got {}",
                    PROBE_FIELDS,
                    stdout.lines().filter(|l| !l.trim().is_empty()).count()
                ),
            )
        })
    }

    async fn start_transfer(
        &self,
        strategy: &Strategy,
        url: &str,
        plan: &TransferPlan,
    ) -> Result<RunningTransfer, DownloadError> {
        let args = Self::transfer_args(strategy, url, plan);
        log::debug!("yt-dlp transfer command [{}]: {} {}", strategy.name, self.bin, args.join(" "));

        let mut child = self.command(&args).spawn().map_err(|e| {
            log::error!("Failed to spawn yt-dlp: {}", e);
            DownloadError::TransferFailed(format!("failed to spawn {}: {}", self.bin, e))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::TransferFailed("stdout pipe unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::TransferFailed("stderr pipe unavailable".to_string()))?;

        Ok(RunningTransfer {
            stdout: Box::pin(stdout),
            stderr: Box::pin(stderr),
            exit: spawn_process_waiter(child, self.transfer_timeout),
        })
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}
