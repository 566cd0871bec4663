//! Stream catalog extraction
//!
//! Classifies the streams of a playback-info payload by type and pulls out
//! the video attributes the player needs up front.

use crate::models::{MediaSource, MediaStream, PlaybackInfo, StreamType};

/// All streams of `stream_type` in the first media source, in server order.
///
/// Missing info, an empty source list or a source without streams all yield
/// an empty list.
pub fn extract_streams(info: Option<&PlaybackInfo>, stream_type: StreamType) -> Vec<MediaStream> {
    info.and_then(PlaybackInfo::primary_source)
        .map(|source| streams_of_type(source, stream_type).cloned().collect())
        .unwrap_or_default()
}

/// Iterate the streams of one type without cloning
pub fn streams_of_type(
    source: &MediaSource,
    stream_type: StreamType,
) -> impl Iterator<Item = &MediaStream> {
    source
        .media_streams
        .iter()
        .filter(move |s| s.stream_type == stream_type)
}

/// First video stream of a source
pub fn primary_video(source: &MediaSource) -> Option<&MediaStream> {
    streams_of_type(source, StreamType::Video).next()
}

/// Frame rate of the primary video stream, 0.0 when unknown
pub fn source_framerate(source: Option<&MediaSource>) -> f64 {
    source
        .and_then(primary_video)
        .and_then(MediaStream::framerate)
        .unwrap_or(0.0)
}

/// Whether the primary video stream carries a dynamic-range tag other than SDR
pub fn is_hdr(source: Option<&MediaSource>) -> bool {
    source
        .and_then(primary_video)
        .and_then(|v| v.video_range.as_deref())
        .map(|range| {
            let range = range.trim();
            !range.is_empty() && !range.eq_ignore_ascii_case("sdr")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(index: i32, range: Option<&str>) -> MediaStream {
        let mut s = MediaStream::new(index, StreamType::Video);
        s.video_range = range.map(str::to_string);
        s.real_frame_rate = Some(23.976);
        s
    }

    #[test]
    fn test_hdr_detection() {
        let source = |range| MediaSource::new("s", vec![video(0, range)]);
        assert!(!is_hdr(Some(&source(None))));
        assert!(!is_hdr(Some(&source(Some("")))));
        assert!(!is_hdr(Some(&source(Some("SDR")))));
        assert!(!is_hdr(Some(&source(Some("sdr")))));
        assert!(is_hdr(Some(&source(Some("HDR")))));
        assert!(is_hdr(Some(&source(Some("DOVI")))));
        assert!(!is_hdr(None));
    }

    #[test]
    fn test_framerate_unknown_is_zero() {
        assert_eq!(source_framerate(None), 0.0);
        let audio_only = MediaSource::new("s", vec![MediaStream::new(0, StreamType::Audio)]);
        assert_eq!(source_framerate(Some(&audio_only)), 0.0);
        let with_video = MediaSource::new("s", vec![video(0, None)]);
        assert_eq!(source_framerate(Some(&with_video)), 23.976);
    }
}
