use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "transcript-cache",
    version,
    about = "Caching transcript proxy for YouTube captions"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API (default if no subcommand)
    Serve,

    /// Fetch one transcript through the cache and print it as JSON
    Fetch {
        /// YouTube video id
        video_id: String,
    },

    /// Print the stored record for a video without counting a fetch
    Show {
        /// YouTube video id
        video_id: String,
    },

    /// Show cache location and size
    Status,

    /// Write a commented default config file
    InitConfig {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["transcript-cache"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_fetch_with_global_config() {
        let cli =
            Cli::try_parse_from(["transcript-cache", "fetch", "dQw4w9WgXcQ", "-c", "x.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Some(Commands::Fetch { video_id }) => assert_eq!(video_id, "dQw4w9WgXcQ"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_config_force_flag() {
        let cli = Cli::try_parse_from(["transcript-cache", "init-config", "--force"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::InitConfig { force: true })));
    }

    #[test]
    fn test_fetch_requires_video_id() {
        assert!(Cli::try_parse_from(["transcript-cache", "fetch"]).is_err());
    }
}
