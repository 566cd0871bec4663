//! tenfoot - playback-info resolution and track selection for Jellyfin
//!
//! The core of a 10-foot media client: fetch playback info for the selected
//! item, reconcile it with the tracks remembered for its season, translate
//! server stream indices into engine track numbers, and start playback
//! exactly once even when the user pressed play before the info arrived.
//!
//! # Modules
//!
//! - `models` - Playback info, track selection and playback-start types
//! - `api` - Jellyfin client and the playback-info source seam
//! - `prefs` - Track preference stores
//! - `playback` - Catalog, index translation, loader and coordinator
//! - `player` - Local mpv/VLC launcher
//! - `cli` / `commands` - Scriptable command line

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod playback;
pub mod player;
pub mod prefs;

// Re-export commonly used types
pub use models::{
    MediaSource, MediaStream, PlaybackInfo, PlaybackStart, SelectedItem, StreamType,
    TrackSelection, NO_TRACK,
};

pub use api::{ApiError, JellyfinClient, PlaybackInfoSource};
pub use playback::{CoordinatorState, CurrentItem, ItemContext, PlaybackCoordinator};
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, TrackPreferenceStore};
