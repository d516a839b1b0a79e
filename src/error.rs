use thiserror::Error;

/// Failure of a single `get_transcript` call.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No transcript available for video {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl FetchError {
    /// True for failures that should reach the caller as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TranscriptUnavailable { .. } | Self::VideoNotFound(_)
        )
    }
}

/// Errors raised by the upstream provider adapters.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Captions disabled, video missing or not playable.
    #[error("{0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid stored value: {0}")]
    Corrupt(String),

    #[error("No stored record for video {0}")]
    Missing(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
