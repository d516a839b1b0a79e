use chrono::Utc;

use crate::error::{FetchError, ProviderError};
use crate::fetch::duration::parse_iso8601_seconds;
use crate::fetch::selection::select_track;
use crate::model::{
    FetchStatus, TranscriptLine, TranscriptRecord, TranscriptResult, STATUS_COMPLETED,
};
use crate::providers::{MetadataProvider, TrackProvider};
use crate::storage::TranscriptStore;

/// Serves transcripts from the store, fetching and caching them on a miss.
///
/// Holds no state of its own between calls; everything durable lives in the
/// store. Concurrent misses for the same id may both go upstream.
pub struct Orchestrator {
    tracks: Box<dyn TrackProvider>,
    metadata: Box<dyn MetadataProvider>,
    store: Box<dyn TranscriptStore>,
    preferred_language: String,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("tracks", &self.tracks.name())
            .field("metadata", &self.metadata.name())
            .field("preferred_language", &self.preferred_language)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        tracks: Box<dyn TrackProvider>,
        metadata: Box<dyn MetadataProvider>,
        store: Box<dyn TranscriptStore>,
        preferred_language: impl Into<String>,
    ) -> Self {
        Self {
            tracks,
            metadata,
            store,
            preferred_language: preferred_language.into(),
        }
    }

    pub fn store(&self) -> &dyn TranscriptStore {
        self.store.as_ref()
    }

    pub fn get_transcript(&self, video_id: &str) -> Result<TranscriptResult, FetchError> {
        if let Some(record) = self.store.find(video_id)? {
            let fetch_count = self.store.record_hit(video_id, Utc::now())?;
            tracing::info!("Cache hit for {} (fetch #{})", video_id, fetch_count);
            return Ok(TranscriptResult {
                transcript: record.transcript,
                status: FetchStatus::Existing,
            });
        }

        tracing::info!("Cache miss for {}, fetching from upstream", video_id);

        let tracks = self
            .tracks
            .list_tracks(video_id)
            .map_err(|e| match e {
                ProviderError::Unavailable(reason) => FetchError::TranscriptUnavailable {
                    video_id: video_id.to_string(),
                    reason,
                },
                other => FetchError::Upstream(format!(
                    "{} track listing failed: {}",
                    self.tracks.name(),
                    other
                )),
            })?;

        let track = select_track(&tracks, &self.preferred_language).ok_or_else(|| {
            FetchError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                reason: "no caption tracks".to_string(),
            }
        })?;
        tracing::info!(
            "Selected {} track '{}' for {} ({} offered)",
            if track.is_generated { "generated" } else { "authored" },
            track.language_code,
            video_id,
            tracks.len()
        );

        let transcript: Vec<TranscriptLine> = self
            .tracks
            .fetch(track)
            .map_err(|e| {
                FetchError::Upstream(format!("{} fetch failed: {}", self.tracks.name(), e))
            })?
            .into_iter()
            .map(TranscriptLine::from)
            .collect();

        let metadata = self
            .metadata
            .get_video(video_id)
            .map_err(|e| FetchError::Metadata(format!("{}: {}", self.metadata.name(), e)))?
            .ok_or_else(|| {
                tracing::warn!(
                    "No metadata for {}, discarding {} fetched caption lines",
                    video_id,
                    transcript.len()
                );
                FetchError::VideoNotFound(video_id.to_string())
            })?;

        let duration = parse_iso8601_seconds(&metadata.duration_iso8601)
            .map_err(|e| FetchError::Metadata(e.to_string()))?;

        let record = TranscriptRecord {
            video_id: video_id.to_string(),
            transcript,
            title: metadata.title,
            channel_id: metadata.channel_id,
            channel_title: metadata.channel_title,
            published_at: metadata.published_at,
            language: track.language_code.clone(),
            is_generated: track.is_generated,
            duration,
            fetch_count: 1,
            last_fetched: Utc::now(),
            processing_status: STATUS_COMPLETED.to_string(),
        };

        if self.store.insert(&record)? {
            tracing::info!(
                "Stored {} caption lines for {}",
                record.transcript.len(),
                video_id
            );
        } else {
            tracing::warn!(
                "Transcript for {} was stored by a concurrent request, keeping existing record",
                video_id
            );
        }

        Ok(TranscriptResult {
            transcript: record.transcript,
            status: FetchStatus::New,
        })
    }
}
