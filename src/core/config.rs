use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

/// Reads an environment variable, treating blank values as unset.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| non_empty_var("YTDL_BIN").unwrap_or_else(|| "yt-dlp".to_string()));

/// Download directory for completed transfers
/// Read from DOWNLOAD_PATH environment variable
/// Default: /downloads
/// Supports tilde (~) expansion for home directory
pub static DOWNLOAD_PATH: Lazy<PathBuf> = Lazy::new(|| {
    let raw = non_empty_var("DOWNLOAD_PATH").unwrap_or_else(|| "/downloads".to_string());
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
});

/// Optional outbound proxy URL
/// Read from PROXY_URL environment variable
/// When set, the `proxy` strategy is added to the catalog
/// Example: http://proxy.example.com:8001 or socks5://127.0.0.1:1080
pub static PROXY_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("PROXY_URL"));

/// Path to cookies file for YouTube authentication
/// Read from YTDL_COOKIES_FILE environment variable
/// If set, this takes priority over YTDL_COOKIES_BROWSER
pub static YTDL_COOKIES_FILE: Lazy<Option<String>> =
    Lazy::new(|| non_empty_var("YTDL_COOKIES_FILE").map(|path| shellexpand::tilde(&path).into_owned()));

/// Browser to extract cookies from for YouTube authentication
/// Read from YTDL_COOKIES_BROWSER environment variable
/// Supported: chrome, firefox, safari, brave, chromium, edge, opera, vivaldi
pub static YTDL_COOKIES_BROWSER: Lazy<Option<String>> = Lazy::new(|| non_empty_var("YTDL_COOKIES_BROWSER"));

/// HTTP listen port
/// Read from PORT environment variable
/// Default: 8080
pub static PORT: Lazy<u16> = Lazy::new(|| non_empty_var("PORT").and_then(|v| v.parse().ok()).unwrap_or(8080));

/// Directory with the front-end assets
/// Read from STATIC_DIR environment variable
/// Default: ./static
pub static STATIC_DIR: Lazy<PathBuf> =
    Lazy::new(|| PathBuf::from(non_empty_var("STATIC_DIR").unwrap_or_else(|| "./static".to_string())));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| non_empty_var("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()));

/// Download configuration
pub mod download {
    use std::time::Duration;

    /// Timeout for yt-dlp metadata probes (in seconds)
    pub const PROBE_TIMEOUT_SECS: u64 = 240; // 4 minutes, slow strategies sleep between requests

    /// Timeout for a whole transfer (in seconds)
    pub const TRANSFER_TIMEOUT_SECS: u64 = 3600;

    /// Backoff step between strategy attempts (in seconds)
    /// Attempt `i` (0-based) waits `i * STRATEGY_BACKOFF_STEP_SECS` before probing
    pub const STRATEGY_BACKOFF_STEP_SECS: u64 = 2;

    /// Delay before deleting a file that was served to a client (in seconds)
    pub const FILE_CLEANUP_DELAY_SECS: u64 = 600; // 10 minutes

    /// How long output pipes may keep draining after the transfer process ended (in seconds).
    /// Descendants that inherited the pipes (ffmpeg) can hold them open past the exit.
    pub const PIPE_DRAIN_GRACE_SECS: u64 = 5;

    pub fn probe_timeout() -> Duration {
        Duration::from_secs(PROBE_TIMEOUT_SECS)
    }

    pub fn transfer_timeout() -> Duration {
        Duration::from_secs(TRANSFER_TIMEOUT_SECS)
    }

    pub fn strategy_backoff_step() -> Duration {
        Duration::from_secs(STRATEGY_BACKOFF_STEP_SECS)
    }

    /// File cleanup delay duration
    pub fn cleanup_delay() -> Duration {
        Duration::from_secs(FILE_CLEANUP_DELAY_SECS)
    }

    pub fn pipe_drain_grace() -> Duration {
        Duration::from_secs(PIPE_DRAIN_GRACE_SECS)
    }
}

/// Event broadcasting configuration
pub mod broadcast {
    /// Number of serialized events queued per subscriber before it is dropped as dead
    pub const SUBSCRIBER_BUFFER: usize = 256;

    /// WebSocket ping interval (in seconds)
    pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;
}

/// Validation configuration
pub mod validation {
    /// Maximum URL length (RFC 7230 recommends 8000, but we use 2048 for safety)
    pub const MAX_URL_LENGTH: usize = 2048;
}
