mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use transcript_cache::config::Config;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("transcript_cache=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Some(Commands::InitConfig { force }) = cli.command {
        return crate::commands::init_config(cli.config.as_deref(), force);
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Starting transcript-cache server");
            crate::commands::run_serve(&config)
        }
        Commands::Fetch { video_id } => crate::commands::run_fetch(&config, &video_id),
        Commands::Show { video_id } => crate::commands::show_record(&config, &video_id),
        Commands::Status => crate::commands::show_status(&config),
        Commands::InitConfig { force } => {
            crate::commands::init_config(cli.config.as_deref(), force)
        }
    }
}
