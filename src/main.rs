use anyhow::Result;
use dotenvy::dotenv;
use simplelog::LevelFilter;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tubeloader::cli::{Cli, Commands};
use tubeloader::core::validation::validate_youtube_url;
use tubeloader::core::{
    config, init_logger, init_stderr_logger, log_startup_configuration, web_server, AppResult,
};
use tubeloader::download::{Broadcaster, Downloader, ProgressEvent, Quality, StrategyCatalog, YtDlp};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the selected subcommand.
///
/// # Errors
/// Returns an error if initialization fails or a foreground download ends in error.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env before any config static is read
    let _ = dotenv();

    match cli.command {
        Some(Commands::Serve { port }) => run_server(port).await,
        Some(Commands::Download { url, quality, output }) => Ok(run_cli_download(url, quality, output).await?),
        Some(Commands::Strategies) => run_list_strategies(),
        None => {
            // No command specified - default to serving
            run_server(None).await
        }
    }
}

/// Run the HTTP + WebSocket server
async fn run_server(port: Option<u16>) -> Result<()> {
    init_logger(&config::LOG_FILE_PATH)?;

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    let catalog = StrategyCatalog::from_config();
    log_startup_configuration(&catalog);

    let download_dir = config::DOWNLOAD_PATH.clone();
    std::fs::create_dir_all(&download_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create download directory {}: {}", download_dir.display(), e))?;

    let downloader = Arc::new(Downloader::new(
        Arc::new(YtDlp::from_config()),
        catalog,
        Arc::new(Broadcaster::new()),
        download_dir,
    ));

    let port = port.unwrap_or(*config::PORT);
    web_server::start_web_server(port, downloader).await
}

/// Run one download in the foreground, printing every event as a JSON line
async fn run_cli_download(url: String, quality: String, output: Option<String>) -> AppResult<()> {
    init_stderr_logger(LevelFilter::Warn)?;
    validate_youtube_url(&url)?;

    let download_dir = output
        .map(|dir| PathBuf::from(shellexpand::tilde(&dir).into_owned()))
        .unwrap_or_else(|| config::DOWNLOAD_PATH.clone());

    let broadcaster = Arc::new(Broadcaster::new());
    let downloader = Arc::new(Downloader::new(
        Arc::new(YtDlp::from_config()),
        StrategyCatalog::from_config(),
        Arc::clone(&broadcaster),
        download_dir,
    ));

    let mut subscription = broadcaster.subscribe();
    let job = downloader.spawn(url.trim().to_string(), Quality::parse(&quality));

    let mut stdout = std::io::stdout();
    while let Some(payload) = subscription.receiver.recv().await {
        writeln!(stdout, "{}", payload)?;
        let event: ProgressEvent = serde_json::from_str(&payload)?;
        if event.is_terminal() {
            break;
        }
    }
    broadcaster.unsubscribe(subscription.id);

    let outcome = job.await.map_err(anyhow::Error::from)??;
    eprintln!("Saved to {}", outcome.path.display());
    Ok(())
}

/// Print the effective strategy catalog
fn run_list_strategies() -> Result<()> {
    let catalog = StrategyCatalog::from_config();
    for (index, strategy) in catalog.iter().enumerate() {
        let rewrite = if strategy.rewrite.is_some() { " (embed URL)" } else { "" };
        println!("{:>2}. {}{}", index + 1, strategy.name, rewrite);
        if !strategy.args.is_empty() {
            println!("    {}", strategy.args.join(" "));
        }
    }
    Ok(())
}
