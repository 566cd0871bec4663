//! CLI - Command Line Interface for tenfoot
//!
//! Every step of the playback flow is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Inspect tracks and their engine numbers
//! tenfoot tracks 5f1c0a...
//!
//! # Resolve playback parameters, resuming where the user left off
//! tenfoot resolve 5f1c0a... --json
//!
//! # Play in mpv from the beginning with the season's saved tracks
//! tenfoot play 5f1c0a... --from-beginning
//!
//! # Manage saved track preferences
//! tenfoot prefs set <season-id> --audio 2 --subtitle -1
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::player::PlayerType;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Item not found on the server
    NotFound = 4,
    /// Server credentials missing
    NotConfigured = 5,
    /// Local player failed to start
    PlayerFailed = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// tenfoot - playback resolution for Jellyfin
#[derive(Parser, Debug)]
#[command(
    name = "tenfoot",
    version,
    about = "Resolve and start Jellyfin playback with remembered tracks",
    long_about = "Fetches playback info for an item, applies the audio and \
                  subtitle tracks remembered for its season, and hands the \
                  result to a local player.",
    after_help = "EXAMPLES:\n\
                  tenfoot tracks <item>               List audio/subtitle tracks\n\
                  tenfoot resolve <item> --json       Print resolved playback\n\
                  tenfoot play <item> -b              Play from the beginning\n\
                  tenfoot prefs list                  Show saved preferences"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List audio and subtitle tracks of an item
    #[command(visible_alias = "t")]
    Tracks(TracksCmd),

    /// Resolve playback parameters without playing
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),

    /// Resolve and play in a local player
    #[command(visible_alias = "p")]
    Play(PlayCmd),

    /// Show or edit saved track preferences
    Prefs(PrefsCmd),
}

/// List the tracks of an item with their engine numbers
#[derive(Args, Debug)]
pub struct TracksCmd {
    /// Item id
    #[arg(required = true)]
    pub item_id: String,
}

/// Options shared by `resolve` and `play`
#[derive(Args, Debug, Clone)]
pub struct PlaybackArgs {
    /// Item id
    #[arg(required = true)]
    pub item_id: String,

    /// Ignore the saved resume position
    #[arg(long, short = 'b')]
    pub from_beginning: bool,

    /// Preference group (defaults to the item's season)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Override the audio stream (server index, 0 or greater)
    #[arg(long, short = 'a', allow_negative_numbers = true)]
    pub audio: Option<i32>,

    /// Override the subtitle stream (server index, -1 for none)
    #[arg(long, short = 's', allow_negative_numbers = true)]
    pub subtitle: Option<i32>,

    /// Give up waiting for playback info after this many seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

/// Resolve playback parameters for an item
#[derive(Args, Debug)]
pub struct ResolveCmd {
    #[command(flatten)]
    pub playback: PlaybackArgs,
}

/// Resolve and play an item locally
#[derive(Args, Debug)]
pub struct PlayCmd {
    #[command(flatten)]
    pub playback: PlaybackArgs,

    /// Player to use (overrides config)
    #[arg(long, short = 'p', value_enum)]
    pub player: Option<PlayerChoice>,

    /// Print the player command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Local player selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerChoice {
    /// mpv media player
    Mpv,
    /// VLC media player
    Vlc,
}

impl From<PlayerChoice> for PlayerType {
    fn from(choice: PlayerChoice) -> Self {
        match choice {
            PlayerChoice::Mpv => PlayerType::Mpv,
            PlayerChoice::Vlc => PlayerType::Vlc,
        }
    }
}

/// Saved track preferences
#[derive(Args, Debug)]
pub struct PrefsCmd {
    #[command(subcommand)]
    pub action: PrefsAction,
}

#[derive(Subcommand, Debug)]
pub enum PrefsAction {
    /// List every group with saved tracks
    List,
    /// Show the saved tracks of one group
    Get {
        /// Group key (season id)
        group: String,
    },
    /// Save tracks for a group
    Set {
        /// Group key (season id)
        group: String,
        /// Audio stream (server index, 0 or greater)
        #[arg(long, short = 'a', allow_negative_numbers = true)]
        audio: Option<i32>,
        /// Subtitle stream (server index, -1 for none)
        #[arg(long, short = 's', allow_negative_numbers = true)]
        subtitle: Option<i32>,
    },
    /// Forget the tracks saved for a group
    Clear {
        /// Group key (season id)
        group: String,
    },
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            // For non-JSON, caller should handle formatting
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_command() {
        let cli = Cli::parse_from(["tenfoot", "resolve", "ep1", "-b", "-g", "season1"]);
        if let Command::Resolve(cmd) = cli.command {
            assert_eq!(cmd.playback.item_id, "ep1");
            assert!(cmd.playback.from_beginning);
            assert_eq!(cmd.playback.group.as_deref(), Some("season1"));
            assert_eq!(cmd.playback.timeout, 30);
        } else {
            panic!("Expected Resolve command");
        }
    }

    #[test]
    fn test_negative_subtitle_index() {
        let cli = Cli::parse_from(["tenfoot", "play", "ep1", "--subtitle", "-1", "--dry-run"]);
        if let Command::Play(cmd) = cli.command {
            assert_eq!(cmd.playback.subtitle, Some(-1));
            assert!(cmd.dry_run);
            assert!(cmd.player.is_none());
        } else {
            panic!("Expected Play command");
        }
    }

    #[test]
    fn test_prefs_set() {
        let cli = Cli::parse_from(["tenfoot", "prefs", "set", "s1", "-a", "2", "-s", "-1"]);
        match cli.command {
            Command::Prefs(PrefsCmd {
                action:
                    PrefsAction::Set {
                        group,
                        audio,
                        subtitle,
                    },
            }) => {
                assert_eq!(group, "s1");
                assert_eq!(audio, Some(2));
                assert_eq!(subtitle, Some(-1));
            }
            other => panic!("Expected prefs set, got {:?}", other),
        }
    }

    #[test]
    fn test_prefs_set_parses_negative_audio() {
        let cli = Cli::parse_from(["tenfoot", "prefs", "set", "s1", "-a", "-1"]);
        match cli.command {
            Command::Prefs(PrefsCmd {
                action: PrefsAction::Set { audio, .. },
            }) => assert_eq!(audio, Some(-1)),
            other => panic!("Expected prefs set, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["tenfoot", "--json", "--quiet", "-v", "tracks", "ep1"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(cli.verbose);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::PlayerFailed), 6);
    }
}
