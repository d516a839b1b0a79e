use crate::error::ProviderError;
use crate::model::{CaptionEntry, Track, VideoMetadata};

/// Source of caption tracks and their content.
pub trait TrackProvider: Send + Sync {
    fn name(&self) -> &str;

    /// All caption tracks offered for the video, in provider order.
    /// Fails with [`ProviderError::Unavailable`] when captions are disabled
    /// or the video does not exist.
    fn list_tracks(&self, video_id: &str) -> Result<Vec<Track>, ProviderError>;

    fn fetch(&self, track: &Track) -> Result<Vec<CaptionEntry>, ProviderError>;
}

/// Source of video metadata.
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the provider has no item for the id.
    fn get_video(&self, video_id: &str) -> Result<Option<VideoMetadata>, ProviderError>;
}
