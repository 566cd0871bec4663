//! Track preference storage
//!
//! Remembers the audio/subtitle stream index chosen for a group of items
//! (usually a season) so sibling items start with the same tracks.
//! The file-backed store lives at ~/.config/tenfoot/tracks.toml

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::StreamType;

/// Shared, externally synchronized preference store (last writer wins)
pub trait TrackPreferenceStore: Send + Sync {
    /// Last saved server stream index for `group_key`
    fn track_preference(&self, group_key: &str, stream_type: StreamType) -> Option<i32>;

    /// Save a server stream index for `group_key`
    fn set_track_preference(&self, group_key: &str, stream_type: StreamType, index: i32);
}

/// Saved indices for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPreference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<i32>,
}

impl GroupPreference {
    /// Only audio and subtitle choices are remembered
    fn tracks(stream_type: StreamType) -> bool {
        matches!(stream_type, StreamType::Audio | StreamType::Subtitle)
    }

    fn get(&self, stream_type: StreamType) -> Option<i32> {
        match stream_type {
            StreamType::Audio => self.audio,
            StreamType::Subtitle => self.subtitle,
            _ => None,
        }
    }

    fn set(&mut self, stream_type: StreamType, index: i32) {
        match stream_type {
            StreamType::Audio => self.audio = Some(index),
            StreamType::Subtitle => self.subtitle = Some(index),
            _ => {}
        }
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store, used by tests and one-shot CLI runs
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    groups: Mutex<BTreeMap<String, GroupPreference>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one group's saved indices
    pub fn group(&self, group_key: &str) -> Option<GroupPreference> {
        self.groups.lock().get(group_key).copied()
    }

    /// Number of groups with saved preferences
    pub fn len(&self) -> usize {
        self.groups.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.lock().is_empty()
    }
}

impl TrackPreferenceStore for MemoryPreferenceStore {
    fn track_preference(&self, group_key: &str, stream_type: StreamType) -> Option<i32> {
        self.groups
            .lock()
            .get(group_key)
            .and_then(|g| g.get(stream_type))
    }

    fn set_track_preference(&self, group_key: &str, stream_type: StreamType, index: i32) {
        if !GroupPreference::tracks(stream_type) {
            debug!(group_key, %stream_type, "ignoring preference for untracked stream type");
            return;
        }
        self.groups
            .lock()
            .entry(group_key.to_string())
            .or_default()
            .set(stream_type, index);
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// Errors from the file-backed store
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("Failed to access preference file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid preference file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    groups: BTreeMap<String, GroupPreference>,
}

/// TOML-backed store; the whole file is rewritten on every change
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    groups: Mutex<BTreeMap<String, GroupPreference>>,
}

impl FilePreferenceStore {
    /// Default location (~/.config/tenfoot/tracks.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tenfoot").join("tracks.toml"))
    }

    /// Open a store, starting empty if the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let groups = match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str::<PreferenceFile>(&text)?.groups,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            groups: Mutex::new(groups),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of every group's saved indices
    pub fn groups(&self) -> BTreeMap<String, GroupPreference> {
        self.groups.lock().clone()
    }

    /// Forget one group; returns whether anything was removed
    pub fn clear(&self, group_key: &str) -> Result<bool, PrefsError> {
        let mut groups = self.groups.lock();
        let removed = groups.remove(group_key).is_some();
        if removed {
            Self::write(&self.path, &groups)?;
        }
        Ok(removed)
    }

    fn write(path: &Path, groups: &BTreeMap<String, GroupPreference>) -> Result<(), PrefsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = PreferenceFile {
            groups: groups.clone(),
        };
        std::fs::write(path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }
}

impl TrackPreferenceStore for FilePreferenceStore {
    fn track_preference(&self, group_key: &str, stream_type: StreamType) -> Option<i32> {
        self.groups
            .lock()
            .get(group_key)
            .and_then(|g| g.get(stream_type))
    }

    fn set_track_preference(&self, group_key: &str, stream_type: StreamType, index: i32) {
        if !GroupPreference::tracks(stream_type) {
            debug!(group_key, %stream_type, "ignoring preference for untracked stream type");
            return;
        }
        let mut groups = self.groups.lock();
        let entry = groups.entry(group_key.to_string()).or_default();
        if entry.get(stream_type) == Some(index) {
            return;
        }
        entry.set(stream_type, index);
        // The in-memory value stays authoritative even if the write fails
        match Self::write(&self.path, &groups) {
            Ok(()) => debug!(group_key, %stream_type, index, "saved track preference"),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to save track preference")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryPreferenceStore::new();
        assert!(store.is_empty());
        store.set_track_preference("s1", StreamType::Audio, 2);
        store.set_track_preference("s1", StreamType::Subtitle, -1);
        assert_eq!(store.track_preference("s1", StreamType::Audio), Some(2));
        assert_eq!(store.track_preference("s1", StreamType::Subtitle), Some(-1));
        assert_eq!(store.track_preference("s2", StreamType::Audio), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_video_preference_ignored() {
        let store = MemoryPreferenceStore::new();
        store.set_track_preference("s1", StreamType::Video, 0);
        store.set_track_preference("s1", StreamType::Other, 4);
        assert_eq!(store.track_preference("s1", StreamType::Video), None);
        assert_eq!(store.group("s1"), None);
        assert!(store.is_empty());
    }
}
