use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tubeloader")]
#[command(author, version, about = "YouTube download service with live progress over WebSocket", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP + WebSocket server (default)
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Download one video in the foreground, printing events as JSON lines
    Download {
        /// YouTube URL
        url: String,

        /// Quality: 1080p, 720p, 480p, 360p (anything else means best)
        #[arg(short, long, default_value = "")]
        quality: String,

        /// Output directory (overrides DOWNLOAD_PATH)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List the strategy catalog in fallback order
    Strategies,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["tubeloader"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_serve_with_port() {
        let cli = Cli::try_parse_from(["tubeloader", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Serve { port: Some(9000) }));
    }

    #[test]
    fn test_download_args() {
        let cli = Cli::try_parse_from([
            "tubeloader",
            "download",
            "https://youtu.be/abc",
            "--quality",
            "720p",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Download {
                url: "https://youtu.be/abc".to_string(),
                quality: "720p".to_string(),
                output: None,
            })
        );
    }

    #[test]
    fn test_download_requires_url() {
        assert!(Cli::try_parse_from(["tubeloader", "download"]).is_err());
    }

    #[test]
    fn test_command_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
