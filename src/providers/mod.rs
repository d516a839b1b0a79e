pub mod backend;
pub mod youtube_captions;
pub mod youtube_data;

pub use backend::{MetadataProvider, TrackProvider};
