use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "transcript-cache.toml";
pub const API_KEY_ENV: &str = "TRANSCRIPT_CACHE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub captions: CaptionsConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionsConfig {
    pub watch_url: String,
    pub player_url: String,
    /// Language tried first when choosing a caption track.
    pub preferred_language: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub api_base: String,
    /// YouTube Data API key (or set TRANSCRIPT_CACHE_API_KEY).
    pub api_key: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for MetadataConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            captions: CaptionsConfig::default(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
        }
    }
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            watch_url: "https://www.youtube.com/watch".to_string(),
            player_url: "https://www.youtube.com/youtubei/v1/player".to_string(),
            preferred_language: "en".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("transcript-cache")
        .join("transcripts.db")
}

// --- Config loading ---

impl Config {
    /// Load config and return the resolved file path (if any).
    ///
    /// Lookup order: explicit path, `transcript-cache.toml` beside the
    /// executable, the platform config path. Defaults when none exists.
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let found = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::candidate_paths().into_iter().find(|p| p.exists()),
        };

        match found {
            Some(p) => {
                let config = Self::read_file(&p)?;
                tracing::debug!("Loaded config from {}", p.display());
                Ok((config, Some(p)))
            }
            None => {
                tracing::info!("No config file found, using defaults");
                Ok((Config::default(), None))
            }
        }
    }

    /// Implicit config locations, most specific first.
    fn candidate_paths() -> Vec<PathBuf> {
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));
        beside_exe
            .into_iter()
            .chain(Self::platform_config_path())
            .collect()
    }

    fn read_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// `<config dir>/transcript-cache/config.toml`, if the platform has one.
    pub fn platform_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("transcript-cache").join("config.toml"))
    }

    /// Metadata API key from config, falling back to the environment.
    pub fn resolve_api_key(&self) -> anyhow::Result<String> {
        if !self.metadata.api_key.is_empty() {
            return Ok(self.metadata.api_key.clone());
        }
        std::env::var(API_KEY_ENV).map_err(|_| {
            anyhow::anyhow!(
                "YouTube Data API key not configured. Set [metadata] api_key or {}",
                API_KEY_ENV
            )
        })
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        let database = default_database_path();
        let database_str = database.to_string_lossy().replace('\\', "\\\\");

        format!(
r#"# transcript-cache configuration
# Restart the server after saving changes for them to take effect.

[server]
# Address the HTTP API listens on.
host = "127.0.0.1"
port = 8000
# Origins allowed to call the API from a browser (CORS).
allowed_origins = ["http://localhost:3000"]

[store]
# SQLite database holding cached transcripts. Created on first start.
database = "{database}"

[captions]
# YouTube watch page, used to discover the innertube API key.
watch_url = "https://www.youtube.com/watch"
# Innertube player endpoint listing the caption tracks of a video.
player_url = "https://www.youtube.com/youtubei/v1/player"
# Caption language tried first. Falls back to any authored track, then any
# auto-generated track.
preferred_language = "en"
# HTTP timeout in seconds for caption requests.
timeout_secs = 30

[metadata]
# YouTube Data API v3 base URL.
api_base = "https://www.googleapis.com/youtube/v3"
# API key (or set TRANSCRIPT_CACHE_API_KEY environment variable).
# api_key = ""
# HTTP timeout in seconds for metadata requests.
timeout_secs = 30
"#,
            database = database_str
        )
    }
}
