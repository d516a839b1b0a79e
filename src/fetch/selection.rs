use crate::model::Track;

/// Pick the caption track to cache, first match wins:
///
/// 1. a track in `preferred_language` (authored before generated),
/// 2. any authored track, in provider order,
/// 3. any generated track, in provider order.
pub fn select_track<'a>(tracks: &'a [Track], preferred_language: &str) -> Option<&'a Track> {
    let preferred = |t: &&Track| t.language_code == preferred_language;

    tracks
        .iter()
        .filter(preferred)
        .find(|t| !t.is_generated)
        .or_else(|| tracks.iter().find(preferred))
        .or_else(|| tracks.iter().find(|t| !t.is_generated))
        .or_else(|| tracks.iter().find(|t| t.is_generated))
}
