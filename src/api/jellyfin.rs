//! Jellyfin API client
//!
//! Fetches playback info and item progress from a Jellyfin-style server.
//! API docs: https://api.jellyfin.org

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{ItemDetail, PlaybackInfo, PlaybackStart};

use super::PlaybackInfoSource;

/// Client name reported to the server
const CLIENT_NAME: &str = "tenfoot";

/// Jellyfin API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Not authorized (401), check the API key")]
    Unauthorized,

    #[error("Rate limited (429), retries exhausted")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Jellyfin API client
pub struct JellyfinClient {
    base_url: String,
    api_key: String,
    user_id: String,
    device_id: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl JellyfinClient {
    /// Create a client for `base_url` authenticated with `api_key`
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            user_id: user_id.into(),
            device_id: uuid::Uuid::new_v4().to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            max_retries: 3,
        }
    }

    /// Use a stable device id instead of a random one
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn authorization(&self) -> String {
        format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\", Token=\"{}\"",
            CLIENT_NAME,
            CLIENT_NAME,
            self.device_id,
            env!("CARGO_PKG_VERSION"),
            self.api_key
        )
    }

    /// Make an authenticated request with retry logic for rate limits
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut retries = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header("X-Emby-Token", &self.api_key)
                .header("Authorization", self.authorization())
                .header("Accept", "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await?;
                    return serde_json::from_str(&body).map_err(|e| {
                        ApiError::InvalidResponse(format!("JSON parse error: {}", e))
                    });
                }
                StatusCode::NOT_FOUND => return Err(ApiError::NotFound),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(ApiError::Unauthorized)
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    retries += 1;
                    if retries >= self.max_retries {
                        return Err(ApiError::RateLimited);
                    }

                    // Get Retry-After header or default to exponential backoff
                    let wait_secs = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(2u64.pow(retries));

                    debug!(endpoint, wait_secs, "rate limited, retrying");
                    tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                    continue;
                }
                status => return Err(ApiError::ServerError(status.as_u16())),
            }
        }
    }

    /// Get playback info (media sources, streams, play session) for an item
    pub async fn playback_info(&self, item_id: &str) -> Result<PlaybackInfo, ApiError> {
        let endpoint = format!(
            "/Items/{}/PlaybackInfo?UserId={}",
            urlencoding::encode(item_id),
            urlencoding::encode(&self.user_id)
        );
        let body = json!({
            "UserId": self.user_id,
            "DeviceId": self.device_id,
            "AutoOpenLiveStream": false,
            "EnableDirectPlay": true,
            "EnableDirectStream": true,
            "EnableTranscoding": true,
        });
        self.request(Method::POST, &endpoint, Some(&body)).await
    }

    /// Get item metadata including the user's resume position
    pub async fn item(&self, item_id: &str) -> Result<ItemDetail, ApiError> {
        let endpoint = format!(
            "/Users/{}/Items/{}",
            urlencoding::encode(&self.user_id),
            urlencoding::encode(item_id)
        );
        self.request(Method::GET, &endpoint, None).await
    }

    /// Direct stream URL for a playback-start event
    pub fn stream_url(&self, start: &PlaybackStart) -> String {
        let mut url = format!(
            "{}/Videos/{}/stream?static=true",
            self.base_url,
            urlencoding::encode(start.item_id())
        );
        if let PlaybackStart::Resolved(p) = start {
            url.push_str(&format!(
                "&MediaSourceId={}",
                urlencoding::encode(&p.media_source_id)
            ));
            if let Some(session) = &p.play_session_id {
                url.push_str(&format!("&PlaySessionId={}", urlencoding::encode(session)));
            }
        }
        url.push_str(&format!(
            "&DeviceId={}&api_key={}",
            urlencoding::encode(&self.device_id),
            urlencoding::encode(&self.api_key)
        ));
        url
    }
}

#[async_trait]
impl PlaybackInfoSource for JellyfinClient {
    async fn playback_info(&self, item_id: &str) -> Result<PlaybackInfo, ApiError> {
        JellyfinClient::playback_info(self, item_id).await
    }
}

impl std::fmt::Debug for JellyfinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JellyfinClient")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .finish()
    }
}
