//! Track preference file tests
//!
//! Persistence of the TOML-backed store across reopen, clearing, and
//! behaviour with missing or broken files.

use tempfile::tempdir;
use tenfoot::models::StreamType;
use tenfoot::prefs::{FilePreferenceStore, GroupPreference, PrefsError, TrackPreferenceStore};

#[test]
fn test_missing_file_opens_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");

    let store = FilePreferenceStore::open(&path).unwrap();
    assert!(store.groups().is_empty());
    assert_eq!(store.track_preference("s1", StreamType::Audio), None);
    // Opening alone never creates the file
    assert!(!path.exists());
}

#[test]
fn test_preferences_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("tracks.toml");

    {
        let store = FilePreferenceStore::open(&path).unwrap();
        store.set_track_preference("season-1", StreamType::Audio, 2);
        store.set_track_preference("season-1", StreamType::Subtitle, -1);
        store.set_track_preference("season-2", StreamType::Subtitle, 5);
    }

    let store = FilePreferenceStore::open(&path).unwrap();
    assert_eq!(store.track_preference("season-1", StreamType::Audio), Some(2));
    assert_eq!(
        store.track_preference("season-1", StreamType::Subtitle),
        Some(-1)
    );
    assert_eq!(store.track_preference("season-2", StreamType::Audio), None);
    assert_eq!(
        store.groups().get("season-2"),
        Some(&GroupPreference {
            audio: None,
            subtitle: Some(5),
        })
    );
}

#[test]
fn test_file_layout_is_grouped_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");

    let store = FilePreferenceStore::open(&path).unwrap();
    store.set_track_preference("abc", StreamType::Audio, 3);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[groups.abc]"));
    assert!(text.contains("audio = 3"));
    assert!(!text.contains("subtitle"));
}

#[test]
fn test_hand_written_file_is_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");
    std::fs::write(
        &path,
        "[groups.\"season 1\"]\naudio = 4\nsubtitle = 7\n\n[groups.other]\n",
    )
    .unwrap();

    let store = FilePreferenceStore::open(&path).unwrap();
    assert_eq!(store.track_preference("season 1", StreamType::Audio), Some(4));
    assert_eq!(
        store.track_preference("season 1", StreamType::Subtitle),
        Some(7)
    );
    assert_eq!(store.groups().len(), 2);
}

#[test]
fn test_clear_removes_group() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");

    let store = FilePreferenceStore::open(&path).unwrap();
    store.set_track_preference("s1", StreamType::Audio, 1);
    store.set_track_preference("s2", StreamType::Audio, 2);

    assert!(store.clear("s1").unwrap());
    assert!(!store.clear("s1").unwrap());

    let reopened = FilePreferenceStore::open(&path).unwrap();
    assert_eq!(reopened.track_preference("s1", StreamType::Audio), None);
    assert_eq!(reopened.track_preference("s2", StreamType::Audio), Some(2));
}

#[test]
fn test_last_writer_wins() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");

    let store = FilePreferenceStore::open(&path).unwrap();
    store.set_track_preference("s1", StreamType::Subtitle, 3);
    store.set_track_preference("s1", StreamType::Subtitle, -1);

    let reopened = FilePreferenceStore::open(&path).unwrap();
    assert_eq!(
        reopened.track_preference("s1", StreamType::Subtitle),
        Some(-1)
    );
}

#[test]
fn test_invalid_file_is_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");
    std::fs::write(&path, "groups = [not toml").unwrap();

    let err = FilePreferenceStore::open(&path).unwrap_err();
    assert!(matches!(err, PrefsError::Parse(_)));
}

#[test]
fn test_unwritable_path_keeps_value_in_memory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");

    let store = FilePreferenceStore::open(&path).unwrap();
    // A directory where the file should be makes every write fail
    std::fs::create_dir(&path).unwrap();

    store.set_track_preference("s1", StreamType::Audio, 2);
    assert_eq!(store.track_preference("s1", StreamType::Audio), Some(2));
    assert!(path.is_dir());

    let err = FilePreferenceStore::open(&path).unwrap_err();
    assert!(matches!(err, PrefsError::Io(_)));
}

#[test]
fn test_untracked_stream_type_leaves_no_group() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");

    let store = FilePreferenceStore::open(&path).unwrap();
    store.set_track_preference("s1", StreamType::Video, 0);
    store.set_track_preference("s1", StreamType::Other, 4);

    assert!(store.groups().is_empty());
    assert!(!path.exists());
}
