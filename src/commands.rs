use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use transcript_cache::config::Config;
use transcript_cache::fetch::Orchestrator;
use transcript_cache::providers::youtube_captions::YouTubeCaptions;
use transcript_cache::providers::youtube_data::YouTubeDataApi;
use transcript_cache::storage::{SqliteStore, TranscriptStore};

/// Wire the YouTube providers and the SQLite store into an orchestrator.
fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let store = SqliteStore::open(&config.store.database).with_context(|| {
        format!(
            "Failed to open transcript store {}",
            config.store.database.display()
        )
    })?;
    let tracks = YouTubeCaptions::new(&config.captions)?;
    let metadata = YouTubeDataApi::new(&config.metadata, config.resolve_api_key()?)?;

    tracing::info!("Transcript store: {}", config.store.database.display());
    Ok(Orchestrator::new(
        Box::new(tracks),
        Box::new(metadata),
        Box::new(store),
        config.captions.preferred_language.clone(),
    ))
}

/// Run the HTTP API until Ctrl+C.
pub fn run_serve(config: &Config) -> Result<()> {
    // Blocking HTTP clients must be built before the async runtime starts.
    let orchestrator = Arc::new(build_orchestrator(config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(transcript_cache::server::serve(orchestrator, &config.server))
}

/// Fetch one transcript through the cache and print the API payload.
pub fn run_fetch(config: &Config, video_id: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let result = orchestrator.get_transcript(video_id)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Print the stored record for a video, leaving its counters untouched.
pub fn show_record(config: &Config, video_id: &str) -> Result<()> {
    let store = SqliteStore::open(&config.store.database)?;
    match store.find(video_id)? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => anyhow::bail!("No cached transcript for {}", video_id),
    }
    Ok(())
}

/// Show cache location and size.
pub fn show_status(config: &Config) -> Result<()> {
    let database = &config.store.database;
    println!("transcript-cache status:");
    println!("  Database:       {}", database.display());

    if !database.exists() {
        println!("  Cached videos:  0 (database not created yet)");
        return Ok(());
    }

    let stats = SqliteStore::open(database)?.stats()?;
    let size_kb = std::fs::metadata(database)?.len() as f64 / 1024.0;
    println!("  Cached videos:  {}", stats.records);
    println!("  Total fetches:  {}", stats.total_fetches);
    println!("  Size:           {:.1} KB", size_kb);
    Ok(())
}

/// Write the commented default config to `path` or the platform config path.
pub fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let target = match path {
        Some(p) => p.to_path_buf(),
        None => Config::platform_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine platform config directory"))?,
    };

    if target.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            target.display()
        );
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, Config::generate_default_commented())?;
    println!("Wrote config: {}", target.display());
    Ok(())
}
