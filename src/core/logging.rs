//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup diagnostics for the effective configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;
use crate::download::strategy::StrategyCatalog;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Initialize a stderr-only logger for foreground commands
///
/// Keeps stdout free for machine-readable output (one JSON event per line).
pub fn init_stderr_logger(level: LevelFilter) -> Result<()> {
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;
    Ok(())
}

/// Logs the effective configuration at application startup
///
/// Reports the tool binary, download directory, proxy and cookies setup,
/// and the strategy order that probes will walk through.
pub fn log_startup_configuration(catalog: &StrategyCatalog) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("YTDL_BIN: {}", *config::YTDL_BIN);
    log::info!("DOWNLOAD_PATH: {}", config::DOWNLOAD_PATH.display());
    log::info!("STATIC_DIR: {}", config::STATIC_DIR.display());

    match config::PROXY_URL.as_deref() {
        Some(_) => log::info!("PROXY_URL: set (proxy strategy enabled)"),
        None => log::info!("PROXY_URL: not set (proxy strategy disabled)"),
    }

    if let Some(ref cookies_file) = *config::YTDL_COOKIES_FILE {
        if std::path::Path::new(cookies_file).exists() {
            log::info!("YTDL_COOKIES_FILE: {}", cookies_file);
        } else {
            log::error!("YTDL_COOKIES_FILE: {} (FILE NOT FOUND!)", cookies_file);
            log::error!("   The cookies strategy will fail until the file exists");
        }
    } else if let Some(ref browser) = *config::YTDL_COOKIES_BROWSER {
        log::info!("YTDL_COOKIES_BROWSER: {}", browser);
    } else {
        log::warn!("No cookies configured, cookies strategy disabled");
    }

    log::info!("Strategies ({}): {}", catalog.len(), catalog.names().join(" → "));
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
