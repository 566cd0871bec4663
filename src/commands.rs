//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the appropriate backend services.
//! Each handler takes CLI args and Output, returns ExitCode.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::api::{ApiError, JellyfinClient};
use crate::cli::{
    ExitCode, Output, PlayCmd, PlaybackArgs, PrefsAction, PrefsCmd, ResolveCmd, TracksCmd,
};
use crate::config::Config;
use crate::models::{MediaStream, PlaybackStart, SelectedItem, StreamType};
use crate::playback::{
    extract_streams, is_hdr, source_framerate, to_engine_track_number, CurrentItem,
    PlaybackCoordinator,
};
use crate::player::{LocalPlayer, PlayerType};
use crate::prefs::{FilePreferenceStore, MemoryPreferenceStore, TrackPreferenceStore};

/// Load config from `--config` or the default location, then apply env overrides
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    Ok(config.with_env())
}

fn api_exit_code(e: &ApiError) -> ExitCode {
    match e {
        ApiError::NotFound => ExitCode::NotFound,
        ApiError::Unauthorized => ExitCode::NotConfigured,
        ApiError::InvalidResponse(_) => ExitCode::Error,
        _ => ExitCode::NetworkError,
    }
}

/// Audio cannot be turned off, so a negative index is never valid
fn reject_negative_audio(audio: Option<i32>, output: &Output) -> Option<ExitCode> {
    match audio {
        Some(index) if index < 0 => Some(output.error(
            format!("Audio index must be 0 or greater, got {}", index),
            ExitCode::InvalidArgs,
        )),
        _ => None,
    }
}

fn client_from(config: &mut Config, output: &Output) -> Result<JellyfinClient, ExitCode> {
    config
        .jellyfin_client()
        .map_err(|e| output.error(e.to_string(), ExitCode::NotConfigured))
}

fn open_preferences(config: &Config) -> Arc<dyn TrackPreferenceStore> {
    let Some(path) = config.preferences_path() else {
        warn!("no preference path available, preferences will not persist");
        return Arc::new(MemoryPreferenceStore::new());
    };
    match FilePreferenceStore::open(&path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable preference file");
            Arc::new(MemoryPreferenceStore::new())
        }
    }
}

// =============================================================================
// Tracks Command
// =============================================================================

#[derive(Serialize)]
struct TrackEntry {
    index: i32,
    engine_track: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    codec: Option<String>,
    is_default: bool,
}

#[derive(Serialize)]
struct TrackListing {
    item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_source_id: Option<String>,
    framerate: f64,
    is_hdr: bool,
    audio: Vec<TrackEntry>,
    subtitles: Vec<TrackEntry>,
}

pub async fn tracks_cmd(cmd: TracksCmd, config: &mut Config, output: &Output) -> ExitCode {
    let client = match client_from(config, output) {
        Ok(client) => client,
        Err(code) => return code,
    };

    output.info(format!("Fetching playback info for: {}", cmd.item_id));

    let info = match client.playback_info(&cmd.item_id).await {
        Ok(info) => info,
        Err(e) => {
            return output.error(format!("Playback info failed: {}", e), api_exit_code(&e))
        }
    };

    let source = info.primary_source();
    let entries = |stream_type| {
        extract_streams(Some(&info), stream_type)
            .into_iter()
            .map(|s: MediaStream| TrackEntry {
                index: s.index,
                engine_track: to_engine_track_number(s.index, source, stream_type),
                title: s.display_title,
                language: s.language,
                codec: s.codec,
                is_default: s.is_default,
            })
            .collect::<Vec<_>>()
    };

    let listing = TrackListing {
        item_id: cmd.item_id,
        media_source_id: source.map(|s| s.id.clone()),
        framerate: source_framerate(source),
        is_hdr: is_hdr(source),
        audio: entries(StreamType::Audio),
        subtitles: entries(StreamType::Subtitle),
    };

    if let Err(e) = output.print(&listing) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Resolve / Play Commands
// =============================================================================

#[derive(Serialize)]
struct ResolveOutput {
    #[serde(flatten)]
    start: PlaybackStart,
    stream_url: String,
}

/// Run the coordinator for one item until it emits a playback-start event
async fn resolve_playback(
    args: &PlaybackArgs,
    config: &mut Config,
    output: &Output,
) -> Result<(PlaybackStart, Arc<JellyfinClient>), ExitCode> {
    if let Some(code) = reject_negative_audio(args.audio, output) {
        return Err(code);
    }
    let client = Arc::new(client_from(config, output)?);

    let mut selected = match client.item(&args.item_id).await {
        Ok(item) => {
            output.info(format!("Selected: {}", item));
            item.to_selected()
        }
        Err(ApiError::NotFound) => {
            return Err(output.error(
                format!("Item not found: {}", args.item_id),
                ExitCode::NotFound,
            ))
        }
        Err(e) => {
            warn!(item_id = %args.item_id, error = %e, "item lookup failed, resume position unknown");
            SelectedItem::new(args.item_id.clone())
        }
    };
    if let Some(group) = &args.group {
        selected.group_key = Some(group.clone());
    }

    let prefs = open_preferences(config);
    if let Some(audio) = args.audio {
        prefs.set_track_preference(selected.group(), StreamType::Audio, audio);
    }
    if let Some(subtitle) = args.subtitle {
        prefs.set_track_preference(selected.group(), StreamType::Subtitle, subtitle);
    }

    let items = Arc::new(CurrentItem::new());
    items.set(Some(selected));

    let mut coordinator = PlaybackCoordinator::new(client.clone(), prefs, items)
        .with_prefetch_delay(config.prefetch_delay());
    coordinator.on_selection_changed();

    if let Some(start) = coordinator.start_playback(args.from_beginning) {
        return Ok((start, client));
    }

    output.info("Waiting for playback info...");
    match tokio::time::timeout(
        Duration::from_secs(args.timeout),
        coordinator.wait_for_start(),
    )
    .await
    {
        Ok(Some(start)) => Ok((start, client)),
        Ok(None) => Err(output.error("Playback was not started", ExitCode::Error)),
        Err(_) => Err(output.error(
            "Timed out waiting for playback info",
            ExitCode::NetworkError,
        )),
    }
}

pub async fn resolve_cmd(cmd: ResolveCmd, config: &mut Config, output: &Output) -> ExitCode {
    let (start, client) = match resolve_playback(&cmd.playback, config, output).await {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };

    output.info(format!("Resolved: {}", start));
    let result = ResolveOutput {
        stream_url: client.stream_url(&start),
        start,
    };
    if let Err(e) = output.print(&result) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

#[derive(Serialize)]
struct DryRun {
    command: String,
    args: Vec<String>,
}

pub async fn play_cmd(cmd: PlayCmd, config: &mut Config, output: &Output) -> ExitCode {
    let (start, client) = match resolve_playback(&cmd.playback, config, output).await {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };

    let player_type = cmd.player.map(PlayerType::from).unwrap_or_else(|| config.player());
    let player = LocalPlayer::new(player_type);
    let url = client.stream_url(&start);

    if cmd.dry_run {
        let dry = DryRun {
            command: player_type.command().to_string(),
            args: player.args(&url, &start),
        };
        if let Err(e) = output.print(&dry) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
        return ExitCode::Success;
    }

    output.info(format!("Playing {} in {}", start, player_type));
    match player.play_and_wait(&url, &start).await {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(e.to_string(), ExitCode::PlayerFailed),
    }
}

// =============================================================================
// Prefs Command
// =============================================================================

pub fn prefs_cmd(cmd: PrefsCmd, config: &Config, output: &Output) -> ExitCode {
    let Some(path) = config.preferences_path() else {
        return output.error("Could not determine preference path", ExitCode::Error);
    };
    let store = match FilePreferenceStore::open(&path) {
        Ok(store) => store,
        Err(e) => return output.error(e.to_string(), ExitCode::Error),
    };

    let printed = match cmd.action {
        PrefsAction::List => output.print(store.groups()),
        PrefsAction::Get { group } => match store.groups().get(&group) {
            Some(pref) => output.print(pref),
            None => {
                return output.error(format!("No preferences for {}", group), ExitCode::NotFound)
            }
        },
        PrefsAction::Set {
            group,
            audio,
            subtitle,
        } => {
            if audio.is_none() && subtitle.is_none() {
                return output.error(
                    "Nothing to set (use --audio or --subtitle)",
                    ExitCode::InvalidArgs,
                );
            }
            if let Some(code) = reject_negative_audio(audio, output) {
                return code;
            }
            if let Some(audio) = audio {
                store.set_track_preference(&group, StreamType::Audio, audio);
            }
            if let Some(subtitle) = subtitle {
                store.set_track_preference(&group, StreamType::Subtitle, subtitle);
            }
            output.print(store.groups().get(&group))
        }
        PrefsAction::Clear { group } => match store.clear(&group) {
            Ok(removed) => output.print(serde_json::json!({ "group": group, "removed": removed })),
            Err(e) => return output.error(e.to_string(), ExitCode::Error),
        },
    };

    if let Err(e) = printed {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}
