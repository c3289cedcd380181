//! Download orchestrator: probe, prepare, transfer, finalize.
//!
//! One `execute` call is one job. Probing may walk several strategies; the
//! transfer runs once with the strategy that probed successfully and is
//! never retried. Every job publishes exactly one terminal event.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::config;
use crate::core::utils::{format_bytes, normalize_filename};
use crate::download::broadcaster::Broadcaster;
use crate::download::error::DownloadError;
use crate::download::events::ProgressEvent;
use crate::download::invoker::{MediaTool, RunningTransfer, TransferPlan};
use crate::download::prober;
use crate::download::pump::pump;
use crate::download::quality::Quality;
use crate::download::strategy::StrategyCatalog;

pub const SUCCESS_MESSAGE: &str = "download completed successfully";

/// Result of a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
    pub strategy: String,
}

/// Runs download jobs against one media tool, catalog and broadcaster.
pub struct Downloader {
    tool: Arc<dyn MediaTool>,
    catalog: StrategyCatalog,
    broadcaster: Arc<Broadcaster>,
    download_dir: PathBuf,
    backoff_step: Duration,
    drain_grace: Duration,
}

impl Downloader {
    pub fn new(
        tool: Arc<dyn MediaTool>,
        catalog: StrategyCatalog,
        broadcaster: Arc<Broadcaster>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tool,
            catalog,
            broadcaster,
            download_dir: download_dir.into(),
            backoff_step: config::download::strategy_backoff_step(),
            drain_grace: config::download::pipe_drain_grace(),
        }
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    /// How long pipes may keep draining once the transfer process has ended.
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Runs the job in a background task. Dropping the handle detaches it.
    pub fn spawn(self: &Arc<Self>, url: String, quality: Quality) -> JoinHandle<Result<DownloadOutcome, DownloadError>> {
        let downloader = Arc::clone(self);
        tokio::spawn(async move { downloader.execute(&url, quality).await })
    }

    /// Runs one job to completion and publishes its terminal event.
    pub async fn execute(&self, url: &str, quality: Quality) -> Result<DownloadOutcome, DownloadError> {
        log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        log::info!("📥 New download job: {} (quality: {})", url, quality.as_str());

        match self.run(url, quality).await {
            Ok(outcome) => {
                log::info!(
                    "✅ Download finished: {} ({}) via '{}'",
                    outcome.filename,
                    format_bytes(outcome.size),
                    outcome.strategy
                );
                self.broadcaster.publish(&ProgressEvent::Success {
                    filename: outcome.filename.clone(),
                    size: format_bytes(outcome.size),
                    message: SUCCESS_MESSAGE.to_string(),
                });
                Ok(outcome)
            }
            Err(e) => {
                log::error!("❌ Download failed [{}]: {}", e.subcategory(), e);
                self.broadcaster.publish(&ProgressEvent::error(e.user_message()));
                Err(e)
            }
        }
    }

    async fn run(&self, url: &str, quality: Quality) -> Result<DownloadOutcome, DownloadError> {
        let broadcaster = self.broadcaster.as_ref();

        // Probing
        broadcaster.publish(&ProgressEvent::progress(5, "checking video…"));
        let (info, strategy) =
            prober::probe(self.tool.as_ref(), &self.catalog, url, broadcaster, self.backoff_step).await?;

        // Preparing
        broadcaster.publish(&ProgressEvent::Info {
            title: info.title.clone(),
            duration: Some(info.duration.clone()).filter(|d| !d.is_empty()),
        });
        broadcaster.publish(&ProgressEvent::progress(
            10,
            format!("preparing download (strategy: {})…", strategy.name),
        ));

        let filename = normalize_filename(&info.title);
        let output = self.download_dir.join(&filename);
        tokio::fs::create_dir_all(&self.download_dir).await.map_err(|e| {
            DownloadError::TransferFailed(format!(
                "cannot create download directory {}: {}",
                self.download_dir.display(),
                e
            ))
        })?;
        let plan = TransferPlan {
            format: quality.format_selector(),
            output: output.clone(),
        };
        log::info!(
            "Transfer plan: format={}, output={}, strategy={}",
            plan.format,
            output.display(),
            strategy.name
        );

        // Transferring
        let RunningTransfer { stdout, stderr, mut exit } = self.tool.start_transfer(strategy, url, &plan).await?;
        let pumps = async {
            tokio::join!(
                pump(stdout, "stdout", broadcaster),
                pump(stderr, "stderr", broadcaster)
            )
        };
        tokio::pin!(pumps);

        let exit = tokio::select! {
            _ = &mut pumps => exit.await,
            exit = &mut exit => {
                // The process is gone but a descendant may still hold the pipes.
                if tokio::time::timeout(self.drain_grace, &mut pumps).await.is_err() {
                    log::warn!(
                        "Output pipes still open {}s after the transfer ended, abandoning them",
                        self.drain_grace.as_secs()
                    );
                }
                exit
            }
        };

        // Finalizing
        let exit = exit.map_err(|_| DownloadError::TransferFailed("process supervisor vanished".to_string()))?;
        if !exit.success() {
            return Err(DownloadError::TransferFailed(exit.to_string()));
        }

        let size = match tokio::fs::metadata(&output).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(DownloadError::OutputMissing(output)),
        };

        Ok(DownloadOutcome {
            filename,
            path: output,
            size,
            strategy: strategy.name.clone(),
        })
    }
}
