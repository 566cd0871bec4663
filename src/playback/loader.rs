//! Playback-info cache and loader
//!
//! Owns the fetch for the selected item. Fetches run as tokio tasks and
//! report back through the owner's event queue; the owner decides whether a
//! result still matters.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::api::{ApiError, PlaybackInfoSource};
use crate::models::PlaybackInfo;

use super::PlaybackEvent;

/// What happened to a fetch result
#[derive(Debug)]
pub enum LoadOutcome {
    /// Stored as the current info
    Loaded,
    /// Belongs to an item that is no longer selected
    Stale,
    /// The fetch failed; nothing is cached
    Failed(ApiError),
}

pub struct PlaybackInfoLoader {
    source: Arc<dyn PlaybackInfoSource>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    current: Option<PlaybackInfo>,
    loaded_for: Option<String>,
    in_flight: Option<String>,
    loading: watch::Sender<bool>,
    requests_issued: usize,
}

impl PlaybackInfoLoader {
    pub fn new(
        source: Arc<dyn PlaybackInfoSource>,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            source,
            events,
            current: None,
            loaded_for: None,
            in_flight: None,
            loading,
            requests_issued: 0,
        }
    }

    /// Start fetching info for `item_id`.
    ///
    /// No-op (returns false) for an empty id or while another fetch is in flight.
    pub fn request_for(&mut self, item_id: &str) -> bool {
        if item_id.is_empty() || self.in_flight.is_some() {
            return false;
        }

        debug!(item_id, "requesting playback info");
        self.in_flight = Some(item_id.to_string());
        self.requests_issued += 1;
        self.loading.send_replace(true);

        let source = self.source.clone();
        let events = self.events.clone();
        let item_id = item_id.to_string();
        tokio::spawn(async move {
            let result = source.playback_info(&item_id).await;
            // The receiver only goes away with the coordinator itself
            let _ = events.send(PlaybackEvent::InfoLoaded { item_id, result });
        });
        true
    }

    /// Apply a finished fetch if it belongs to `selected_id`
    pub fn on_result(
        &mut self,
        item_id: &str,
        selected_id: Option<&str>,
        result: Result<PlaybackInfo, ApiError>,
    ) -> LoadOutcome {
        if selected_id != Some(item_id) {
            return LoadOutcome::Stale;
        }

        self.in_flight = None;
        self.loading.send_replace(false);

        match result {
            Ok(info) => {
                self.current = Some(info);
                self.loaded_for = Some(item_id.to_string());
                LoadOutcome::Loaded
            }
            Err(e) => {
                self.current = None;
                self.loaded_for = None;
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Forget everything about the previous selection.
    ///
    /// An abandoned fetch keeps running; its result is dropped as stale.
    pub fn invalidate(&mut self) {
        self.current = None;
        self.loaded_for = None;
        self.in_flight = None;
        self.loading.send_replace(false);
    }

    /// Cached info, only if it was fetched for `item_id`
    pub fn info_for(&self, item_id: &str) -> Option<&PlaybackInfo> {
        match &self.loaded_for {
            Some(id) if id == item_id => self.current.as_ref(),
            _ => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Observe the loading flag (e.g. for a spinner)
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Number of fetches started so far
    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }
}

impl std::fmt::Debug for PlaybackInfoLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackInfoLoader")
            .field("loaded_for", &self.loaded_for)
            .field("in_flight", &self.in_flight)
            .field("is_loading", &self.is_loading())
            .finish()
    }
}
