//! Download pipeline: strategies, probing, transfer and progress fan-out

pub mod broadcaster;
pub mod error;
pub mod events;
pub mod invoker;
pub mod orchestrator;
pub mod prober;
pub mod progress;
pub mod pump;
pub mod quality;
pub mod strategy;

// Re-exports for convenience
pub use broadcaster::{Broadcaster, Subscription};
pub use error::DownloadError;
pub use events::ProgressEvent;
pub use invoker::{MediaTool, ProbeResult, RunningTransfer, TransferPlan, YtDlp};
pub use orchestrator::{DownloadOutcome, Downloader};
pub use quality::Quality;
pub use strategy::{Strategy, StrategyCatalog};
