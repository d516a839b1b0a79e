use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value of `processing_status` for every persisted record.
pub const STATUS_COMPLETED: &str = "completed";

/// One caption entry, in playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub video_id: String,
    pub transcript: Vec<TranscriptLine>,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub language: String,
    pub is_generated: bool,
    /// Whole seconds, truncated from the ISO-8601 duration.
    pub duration: i64,
    pub fetch_count: i64,
    pub last_fetched: DateTime<Utc>,
    pub processing_status: String,
}

/// A caption stream offered by the track provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub video_id: String,
    pub language_code: String,
    pub language: String,
    pub is_generated: bool,
    /// Provider-specific location of the track content.
    pub base_url: String,
}

/// Raw entry returned by the track provider for a track.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionEntry {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl From<CaptionEntry> for TranscriptLine {
    fn from(entry: CaptionEntry) -> Self {
        Self {
            text: entry.text,
            start: entry.start,
            duration: entry.duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub duration_iso8601: String,
}

/// Whether the transcript came from the store or was fetched upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Existing,
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub transcript: Vec<TranscriptLine>,
    pub status: FetchStatus,
}
