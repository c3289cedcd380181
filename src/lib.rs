//! Tubeloader - YouTube download service built around yt-dlp
//!
//! Accepts download requests over HTTP, probes the video through an ordered
//! chain of fallback strategies, runs the transfer and streams live progress
//! to every WebSocket subscriber.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, process helpers and the web server
//! - `download`: Strategy catalog, prober, progress parsing, broadcaster and orchestrator
//! - `cli`: Command-line interface

pub mod cli;
pub mod core;
pub mod download;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use crate::download::{Broadcaster, DownloadError, Downloader, ProgressEvent, Quality, StrategyCatalog};
