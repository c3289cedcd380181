//! Progress events streamed to subscribers.
//!
//! Serialized as JSON objects tagged by `type`:
//! `progress`, `strategy`, `info`, `success`, `error`.

use serde::{Deserialize, Serialize};

/// One state change of a running job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Progress in the 0-100 display band with a human status line
    Progress { percent: u8, status: String },
    /// The prober moved on to another strategy (1-based attempt)
    Strategy { strategy: String, attempt: usize },
    /// Metadata of the video being fetched
    Info {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<String>,
    },
    /// Terminal: the file is in the download directory
    Success {
        filename: String,
        size: String,
        message: String,
    },
    /// Terminal: the job failed
    Error { message: String },
}

impl ProgressEvent {
    pub fn progress(percent: u8, status: impl Into<String>) -> Self {
        ProgressEvent::Progress {
            percent: percent.min(100),
            status: status.into(),
        }
    }

    pub fn strategy(name: impl Into<String>, attempt: usize) -> Self {
        ProgressEvent::Strategy {
            strategy: name.into(),
            attempt,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }

    /// `success` and `error` end a job's event sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Success { .. } | ProgressEvent::Error { .. })
    }

    /// Wire tag, as found in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Progress { .. } => "progress",
            ProgressEvent::Strategy { .. } => "strategy",
            ProgressEvent::Info { .. } => "info",
            ProgressEvent::Success { .. } => "success",
            ProgressEvent::Error { .. } => "error",
        }
    }
}
