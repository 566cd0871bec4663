//! Server stream index <-> engine track number translation
//!
//! The server numbers every stream of a source in one flat, non-contiguous
//! index space. The local engine numbers tracks per type, starting at 1.

use crate::models::{MediaSource, StreamType, NO_TRACK};

use super::catalog::streams_of_type;

/// Engine track number (1-based within `stream_type`) for a server index.
///
/// Returns `NO_TRACK` for a negative index, a missing source, or an index
/// that does not belong to a stream of that type. First match wins.
pub fn to_engine_track_number(
    server_index: i32,
    source: Option<&MediaSource>,
    stream_type: StreamType,
) -> i32 {
    if server_index < 0 {
        return NO_TRACK;
    }
    let Some(source) = source else {
        return NO_TRACK;
    };

    streams_of_type(source, stream_type)
        .position(|s| s.index == server_index)
        .map(|pos| pos as i32 + 1)
        .unwrap_or(NO_TRACK)
}

/// Server index of the `engine_track`-th stream of `stream_type`.
///
/// Returns `NO_TRACK` when the number is out of range.
pub fn to_server_index(
    engine_track: i32,
    source: Option<&MediaSource>,
    stream_type: StreamType,
) -> i32 {
    if engine_track < 1 {
        return NO_TRACK;
    }
    source
        .and_then(|s| streams_of_type(s, stream_type).nth(engine_track as usize - 1))
        .map(|s| s.index)
        .unwrap_or(NO_TRACK)
}
