//! API clients for external services
//!
//! - Jellyfin: playback info and item progress

pub mod jellyfin;

use async_trait::async_trait;

use crate::models::PlaybackInfo;

pub use jellyfin::{ApiError, JellyfinClient};

/// Anything that can produce playback info for an item
#[async_trait]
pub trait PlaybackInfoSource: Send + Sync {
    async fn playback_info(&self, item_id: &str) -> Result<PlaybackInfo, ApiError>;
}
