//! Configuration management for tenfoot
//!
//! Handles config file loading/saving and server credentials.
//! Config is stored at ~/.config/tenfoot/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::JellyfinClient;
use crate::playback::DEFAULT_PREFETCH_DELAY;
use crate::player::PlayerType;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server base URL, e.g. http://192.168.1.10:8096
    pub server_url: Option<String>,
    /// API key or access token
    pub api_key: Option<String>,
    /// User the playback info is requested for
    pub user_id: Option<String>,
    /// Stable device id (generated on first use)
    pub device_id: Option<String>,
    /// Prefetch quiet period in milliseconds
    pub prefetch_delay_ms: Option<u64>,
    /// Local player to launch
    pub player: Option<PlayerType>,
    /// Track preference file (defaults next to this config)
    pub preferences_path: Option<PathBuf>,
    /// File this config was read from; a generated device id is saved there
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Get config file path (~/.config/tenfoot/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tenfoot").join("config.toml"))
    }

    /// Load config from the default file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        let mut config: Self = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default();
        config.source = Some(path);
        config
    }

    /// Load config from an explicit file; a missing file is an error here
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Apply environment overrides (JELLYFIN_URL, JELLYFIN_API_KEY, JELLYFIN_USER_ID)
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("JELLYFIN_URL") {
            self.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("JELLYFIN_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(user) = std::env::var("JELLYFIN_USER_ID") {
            self.user_id = Some(user);
        }
        self
    }

    pub fn prefetch_delay(&self) -> Duration {
        self.prefetch_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PREFETCH_DELAY)
    }

    pub fn player(&self) -> PlayerType {
        self.player.unwrap_or_default()
    }

    /// Track preference file location
    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences_path
            .clone()
            .or_else(crate::prefs::FilePreferenceStore::default_path)
    }

    /// Get the device id, generating and caching one on first use
    pub fn device_id(&mut self) -> String {
        if let Some(ref id) = self.device_id {
            return id.clone();
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.device_id = Some(id.clone());
        if let Some(path) = &self.source {
            match persist_device_id(path, &id) {
                Ok(()) => debug!(path = %path.display(), "saved generated device id"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to save device id"),
            }
        }
        id
    }

    /// Build a server client from the configured credentials
    pub fn jellyfin_client(&mut self) -> Result<JellyfinClient> {
        let url = self
            .server_url
            .clone()
            .context("Server URL not configured (set server_url or JELLYFIN_URL)")?;
        let key = self
            .api_key
            .clone()
            .context("API key not configured (set api_key or JELLYFIN_API_KEY)")?;
        let user = self
            .user_id
            .clone()
            .context("User id not configured (set user_id or JELLYFIN_USER_ID)")?;
        let device_id = self.device_id();
        Ok(JellyfinClient::new(url, key, user).with_device_id(device_id))
    }
}

/// Write `device_id` into the file at `path`, leaving every other key as the
/// file has it (env overrides never reach disk)
fn persist_device_id(path: &Path, device_id: &str) -> Result<()> {
    let mut table = match std::fs::read_to_string(path) {
        Ok(text) => toml::from_str::<toml::Table>(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read config {}", path.display())),
    };
    table.insert(
        "device_id".to_string(),
        toml::Value::String(device_id.to_string()),
    );

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(&table)?)?;
    Ok(())
}
