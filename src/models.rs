//! Data structures and types for tenfoot
//!
//! Contains the shared models used across the crate, organized by domain:
//! - **Server**: playback-info payloads as returned by a Jellyfin-style server
//! - **Selection**: the selected item and its track selection
//! - **Playback**: the playback-start event handed to the player

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side "no track" marker, used for subtitles and unresolved indices.
pub const NO_TRACK: i32 = -1;

/// Ticks per second (1 tick = 100 nanoseconds).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Convert ticks to seconds.
pub fn ticks_to_seconds(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

// =============================================================================
// Server Models (PlaybackInfo)
// =============================================================================

/// Kind of a stream inside a media source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamType {
    Video,
    Audio,
    Subtitle,
    /// Anything else the server enumerates (attachments, images, data)
    #[serde(other)]
    Other,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Video => write!(f, "Video"),
            StreamType::Audio => write!(f, "Audio"),
            StreamType::Subtitle => write!(f, "Subtitle"),
            StreamType::Other => write!(f, "Other"),
        }
    }
}

/// One demuxed stream within a media source.
///
/// `index` is the server's flat identifier: unique within the source, but
/// neither contiguous nor scoped to the stream type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaStream {
    pub index: i32,
    #[serde(rename = "Type")]
    pub stream_type: StreamType,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub real_frame_rate: Option<f64>,
    #[serde(default)]
    pub average_frame_rate: Option<f64>,
    /// Dynamic range tag, e.g. "SDR", "HDR"
    #[serde(default)]
    pub video_range: Option<String>,
}

impl MediaStream {
    /// Bare stream with only index and type set
    pub fn new(index: i32, stream_type: StreamType) -> Self {
        Self {
            index,
            stream_type,
            codec: None,
            language: None,
            display_title: None,
            is_default: false,
            real_frame_rate: None,
            average_frame_rate: None,
            video_range: None,
        }
    }

    /// Frame rate of a video stream, preferring the real rate
    pub fn framerate(&self) -> Option<f64> {
        self.real_frame_rate
            .or(self.average_frame_rate)
            .filter(|fps| *fps > 0.0)
    }
}

impl fmt::Display for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.display_title, &self.language) {
            (Some(title), _) => write!(f, "#{} {}", self.index, title),
            (None, Some(lang)) => write!(f, "#{} {} ({})", self.index, self.stream_type, lang),
            (None, None) => write!(f, "#{} {}", self.index, self.stream_type),
        }
    }
}

/// One playable rendition of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    /// Streams in server enumeration order
    #[serde(default)]
    pub media_streams: Vec<MediaStream>,
}

impl MediaSource {
    pub fn new(id: impl Into<String>, media_streams: Vec<MediaStream>) -> Self {
        Self {
            id: id.into(),
            name: None,
            container: None,
            media_streams,
        }
    }

    /// Whether a stream of `stream_type` with exactly `index` exists
    pub fn has_stream(&self, index: i32, stream_type: StreamType) -> bool {
        self.media_streams
            .iter()
            .any(|s| s.stream_type == stream_type && s.index == index)
    }
}

/// Result of a playback-info request for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaybackInfo {
    #[serde(default)]
    pub media_sources: Vec<MediaSource>,
    #[serde(default)]
    pub play_session_id: Option<String>,
}

impl PlaybackInfo {
    /// The only media source the client consumes
    pub fn primary_source(&self) -> Option<&MediaSource> {
        self.media_sources.first()
    }
}

/// Progress the server keeps per user and item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserItemData {
    #[serde(default)]
    pub playback_position_ticks: i64,
    #[serde(default)]
    pub played: bool,
}

/// Item metadata needed to select it for playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemDetail {
    pub id: String,
    pub name: String,
    #[serde(rename = "Type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub series_id: Option<String>,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub season_id: Option<String>,
    #[serde(default)]
    pub index_number: Option<i32>,
    #[serde(default)]
    pub parent_index_number: Option<i32>,
    #[serde(default)]
    pub user_data: Option<UserItemData>,
}

impl ItemDetail {
    /// Selection for this item, grouped by season when it has one
    pub fn to_selected(&self) -> SelectedItem {
        SelectedItem {
            id: self.id.clone(),
            group_key: self.season_id.clone(),
            resume_position_ticks: self
                .user_data
                .as_ref()
                .map(|d| d.playback_position_ticks)
                .unwrap_or(0),
        }
    }
}

impl fmt::Display for ItemDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.series_name, self.parent_index_number, self.index_number) {
            (Some(series), Some(season), Some(episode)) => write!(
                f,
                "{} S{:02}E{:02} - {}",
                series, season, episode, self.name
            ),
            _ => write!(f, "{}", self.name),
        }
    }
}

// =============================================================================
// Selection Models
// =============================================================================

/// The item currently highlighted in the browsing view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub id: String,
    /// Grouping scope for track preferences (usually the season id)
    pub group_key: Option<String>,
    /// Stored resume progress
    pub resume_position_ticks: i64,
}

impl SelectedItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group_key: None,
            resume_position_ticks: 0,
        }
    }

    pub fn with_group(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }

    pub fn with_resume_position(mut self, ticks: i64) -> Self {
        self.resume_position_ticks = ticks;
        self
    }

    /// Preference scope; items without a season are their own group
    pub fn group(&self) -> &str {
        self.group_key.as_deref().unwrap_or(&self.id)
    }
}

/// Chosen audio and subtitle streams, in server indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSelection {
    pub audio_index: i32,
    /// `NO_TRACK` means subtitles off
    pub subtitle_index: i32,
}

impl Default for TrackSelection {
    fn default() -> Self {
        Self {
            audio_index: NO_TRACK,
            subtitle_index: NO_TRACK,
        }
    }
}

/// Play intent captured while playback info was unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPlayback {
    pub from_beginning: bool,
}

// =============================================================================
// Playback Models
// =============================================================================

/// Fully resolved playback parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlayback {
    pub item_id: String,
    pub start_position_ticks: i64,
    pub media_source_id: String,
    pub play_session_id: Option<String>,
    pub audio_index: i32,
    pub subtitle_index: i32,
    /// 1-based engine track numbers, `NO_TRACK` when unset
    pub audio_track: i32,
    pub subtitle_track: i32,
    pub framerate: f64,
    pub is_hdr: bool,
}

/// Reduced parameters used when no playback info could be obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicPlayback {
    pub item_id: String,
    pub start_position_ticks: i64,
    pub framerate: f64,
    pub is_hdr: bool,
}

/// Playback-start event emitted by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PlaybackStart {
    Resolved(ResolvedPlayback),
    Basic(BasicPlayback),
}

impl PlaybackStart {
    pub fn item_id(&self) -> &str {
        match self {
            PlaybackStart::Resolved(p) => &p.item_id,
            PlaybackStart::Basic(p) => &p.item_id,
        }
    }

    pub fn start_position_ticks(&self) -> i64 {
        match self {
            PlaybackStart::Resolved(p) => p.start_position_ticks,
            PlaybackStart::Basic(p) => p.start_position_ticks,
        }
    }

    pub fn start_seconds(&self) -> f64 {
        ticks_to_seconds(self.start_position_ticks())
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, PlaybackStart::Resolved(_))
    }
}

impl fmt::Display for PlaybackStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStart::Resolved(p) => write!(
                f,
                "{} @ {:.0}s (source {}, audio #{} -> {}, subtitle #{} -> {})",
                p.item_id,
                ticks_to_seconds(p.start_position_ticks),
                p.media_source_id,
                p.audio_index,
                p.audio_track,
                p.subtitle_index,
                p.subtitle_track
            ),
            PlaybackStart::Basic(p) => write!(
                f,
                "{} @ {:.0}s (basic)",
                p.item_id,
                ticks_to_seconds(p.start_position_ticks)
            ),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_type_unknown_maps_to_other() {
        let stream: MediaStream =
            serde_json::from_str(r#"{"Index": 4, "Type": "EmbeddedImage"}"#).unwrap();
        assert_eq!(stream.stream_type, StreamType::Other);
        assert_eq!(stream.index, 4);
    }

    #[test]
    fn test_playback_info_parses_pascal_case() {
        let json = r#"{
            "MediaSources": [{
                "Id": "src1",
                "Container": "mkv",
                "MediaStreams": [
                    {"Index": 0, "Type": "Video", "RealFrameRate": 23.976, "VideoRange": "HDR"},
                    {"Index": 1, "Type": "Audio", "Language": "eng", "IsDefault": true}
                ]
            }],
            "PlaySessionId": "sess42"
        }"#;
        let info: PlaybackInfo = serde_json::from_str(json).unwrap();
        let source = info.primary_source().unwrap();
        assert_eq!(source.id, "src1");
        assert_eq!(source.media_streams.len(), 2);
        assert_eq!(source.media_streams[0].video_range.as_deref(), Some("HDR"));
        assert!(source.media_streams[1].is_default);
        assert_eq!(info.play_session_id.as_deref(), Some("sess42"));
    }

    #[test]
    fn test_framerate_prefers_real_rate() {
        let mut stream = MediaStream::new(0, StreamType::Video);
        assert_eq!(stream.framerate(), None);
        stream.average_frame_rate = Some(25.0);
        assert_eq!(stream.framerate(), Some(25.0));
        stream.real_frame_rate = Some(23.976);
        assert_eq!(stream.framerate(), Some(23.976));
    }

    #[test]
    fn test_selected_item_group_falls_back_to_id() {
        let item = SelectedItem::new("ep1");
        assert_eq!(item.group(), "ep1");
        let item = item.with_group("season1");
        assert_eq!(item.group(), "season1");
    }

    #[test]
    fn test_item_detail_to_selected() {
        let json = r#"{
            "Id": "ep2",
            "Name": "Pilot",
            "Type": "Episode",
            "SeriesName": "Show",
            "SeasonId": "season1",
            "IndexNumber": 2,
            "ParentIndexNumber": 1,
            "UserData": {"PlaybackPositionTicks": 600000000, "Played": false}
        }"#;
        let item: ItemDetail = serde_json::from_str(json).unwrap();
        assert_eq!(item.to_string(), "Show S01E02 - Pilot");
        let selected = item.to_selected();
        assert_eq!(selected.group(), "season1");
        assert_eq!(selected.resume_position_ticks, 600_000_000);
    }

    #[test]
    fn test_ticks_conversion() {
        assert_eq!(ticks_to_seconds(TICKS_PER_SECOND * 90), 90.0);
        assert_eq!(ticks_to_seconds(15_000_000), 1.5);
    }

    #[test]
    fn test_playback_start_serializes_with_mode_tag() {
        let start = PlaybackStart::Basic(BasicPlayback {
            item_id: "ep1".to_string(),
            start_position_ticks: 0,
            framerate: 0.0,
            is_hdr: false,
        });
        let json = serde_json::to_value(&start).unwrap();
        assert_eq!(json["mode"], "basic");
        assert_eq!(json["item_id"], "ep1");
        assert!(!start.is_resolved());
    }
}
