//! Reconcile saved track preferences with the streams actually available

use crate::models::{MediaSource, StreamType, TrackSelection, NO_TRACK};
use crate::prefs::TrackPreferenceStore;

use super::catalog::streams_of_type;

/// Track selection for `source` given what was saved under `group_key`.
///
/// Audio falls back to the first audio stream in enumeration order, so it is
/// only ever `NO_TRACK` when the source has no audio. Subtitles fall back to
/// off. A saved index is honored only if that exact stream exists.
pub fn apply_preferences(
    source: &MediaSource,
    group_key: &str,
    store: &dyn TrackPreferenceStore,
) -> TrackSelection {
    let audio_default = streams_of_type(source, StreamType::Audio)
        .next()
        .map(|s| s.index)
        .unwrap_or(NO_TRACK);

    let audio_index = store
        .track_preference(group_key, StreamType::Audio)
        .filter(|idx| source.has_stream(*idx, StreamType::Audio))
        .unwrap_or(audio_default);

    let subtitle_index = store
        .track_preference(group_key, StreamType::Subtitle)
        .filter(|idx| source.has_stream(*idx, StreamType::Subtitle))
        .unwrap_or(NO_TRACK);

    TrackSelection {
        audio_index,
        subtitle_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaStream;
    use crate::prefs::MemoryPreferenceStore;

    fn source() -> MediaSource {
        MediaSource::new(
            "src",
            vec![
                MediaStream::new(0, StreamType::Video),
                MediaStream::new(1, StreamType::Audio),
                MediaStream::new(2, StreamType::Audio),
                MediaStream::new(3, StreamType::Subtitle),
            ],
        )
    }

    #[test]
    fn test_defaults_without_saved_preference() {
        let store = MemoryPreferenceStore::new();
        let sel = apply_preferences(&source(), "season", &store);
        assert_eq!(sel.audio_index, 1);
        assert_eq!(sel.subtitle_index, NO_TRACK);
    }

    #[test]
    fn test_saved_preference_applied() {
        let store = MemoryPreferenceStore::new();
        store.set_track_preference("season", StreamType::Audio, 2);
        store.set_track_preference("season", StreamType::Subtitle, 3);
        let sel = apply_preferences(&source(), "season", &store);
        assert_eq!(sel.audio_index, 2);
        assert_eq!(sel.subtitle_index, 3);
    }

    #[test]
    fn test_stale_preference_ignored() {
        let store = MemoryPreferenceStore::new();
        // 3 exists, but it is a subtitle; 9 does not exist at all
        store.set_track_preference("season", StreamType::Audio, 3);
        store.set_track_preference("season", StreamType::Subtitle, 9);
        let sel = apply_preferences(&source(), "season", &store);
        assert_eq!(sel.audio_index, 1);
        assert_eq!(sel.subtitle_index, NO_TRACK);
    }

    #[test]
    fn test_no_audio_streams() {
        let store = MemoryPreferenceStore::new();
        let silent = MediaSource::new("silent", vec![MediaStream::new(0, StreamType::Video)]);
        let sel = apply_preferences(&silent, "season", &store);
        assert_eq!(sel.audio_index, NO_TRACK);
    }
}
