//! Local Player - mpv/VLC playback support
//!
//! Launches a resolved playback-start event in a local player, passing the
//! engine track numbers and start offset on the command line.

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};

use crate::models::{PlaybackStart, NO_TRACK};

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerType {
    /// mpv media player (default)
    #[default]
    Mpv,
    /// VLC media player
    Vlc,
}

impl PlayerType {
    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle - check for it
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    /// Get a display name for this player
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Errors from local player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
}

/// Local player for streaming content
#[derive(Debug)]
pub struct LocalPlayer {
    player_type: PlayerType,
}

impl LocalPlayer {
    pub fn new(player_type: PlayerType) -> Self {
        Self { player_type }
    }

    /// Command-line arguments for playing `stream_url` as described by `start`.
    ///
    /// A basic start carries no track flags so the player picks its defaults.
    pub fn args(&self, stream_url: &str, start: &PlaybackStart) -> Vec<String> {
        let seconds = start.start_seconds();
        let mut args = vec![stream_url.to_string()];

        match self.player_type {
            PlayerType::Mpv => {
                if seconds > 0.0 {
                    args.push(format!("--start={:.3}", seconds));
                }
                if let PlaybackStart::Resolved(p) = start {
                    if p.audio_track != NO_TRACK {
                        args.push(format!("--aid={}", p.audio_track));
                    }
                    if p.subtitle_track == NO_TRACK {
                        args.push("--sid=no".to_string());
                    } else {
                        args.push(format!("--sid={}", p.subtitle_track));
                    }
                }
                args.push("--force-window=immediate".to_string());
            }
            PlayerType::Vlc => {
                if seconds > 0.0 {
                    args.push(format!("--start-time={:.3}", seconds));
                }
                // VLC counts tracks from 0
                if let PlaybackStart::Resolved(p) = start {
                    if p.audio_track != NO_TRACK {
                        args.push(format!("--audio-track={}", p.audio_track - 1));
                    }
                    if p.subtitle_track == NO_TRACK {
                        args.push("--no-sub-autodetect-file".to_string());
                        args.push("--sub-track=-1".to_string());
                    } else {
                        args.push(format!("--sub-track={}", p.subtitle_track - 1));
                    }
                }
                args.push("--no-video-title-show".to_string());
            }
        }
        args
    }

    /// Spawn the player; output is discarded
    pub fn play(&self, stream_url: &str, start: &PlaybackStart) -> Result<Child, PlayerError> {
        let mut cmd = Command::new(self.player_type.command());
        cmd.args(self.args(stream_url, start));
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlayerError::NotFound(self.player_type.command().to_string())
            } else {
                PlayerError::StartFailed(e)
            }
        })
    }

    /// Play and wait for the player to close
    pub async fn play_and_wait(
        &self,
        stream_url: &str,
        start: &PlaybackStart,
    ) -> Result<(), PlayerError> {
        let mut child = self.play(stream_url, start)?;
        wait_result(child.wait().await)
    }
}

/// Only a failed wait is an error; the player's exit status is not checked
fn wait_result(status: std::io::Result<std::process::ExitStatus>) -> Result<(), PlayerError> {
    status.map_err(PlayerError::StartFailed)?;
    Ok(())
}
