use std::path::PathBuf;
use thiserror::Error;

/// Structured error type for download jobs.
///
/// Probe failures are recoverable (the prober moves on to the next
/// strategy); every other variant ends the job with a terminal `error` event.
/// A tool that cannot be started at all fails the same way under every
/// strategy, so it ends the job immediately.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// One strategy's metadata probe failed
    #[error("strategy {strategy} failed: {reason}")]
    ProbeFailed { strategy: String, reason: String },

    /// Every strategy in the catalog failed to probe
    #[error("all {attempts} strategies failed, last error: {last}")]
    AllStrategiesExhausted { attempts: usize, last: Box<DownloadError> },

    /// The media tool executable could not be started
    #[error("media tool unavailable: {0}")]
    ToolUnavailable(String),

    /// The transfer process could not start or exited unsuccessfully
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// The transfer reported success but left no file behind
    #[error("output file was not created: {}", .0.display())]
    OutputMissing(PathBuf),
}

impl DownloadError {
    pub fn probe_failed(strategy: &str, reason: impl Into<String>) -> Self {
        DownloadError::ProbeFailed {
            strategy: strategy.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::ProbeFailed { .. } => "probe_failed",
            DownloadError::AllStrategiesExhausted { .. } => "strategies_exhausted",
            DownloadError::ToolUnavailable(_) => "tool_unavailable",
            DownloadError::TransferFailed(_) => "transfer_failed",
            DownloadError::OutputMissing(_) => "output_missing",
        }
    }

    /// Message carried by the terminal `error` event.
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::OutputMissing(_) => "output file was not created".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether another strategy may still succeed after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DownloadError::ProbeFailed { .. })
    }
}
