//! Deferred playback coordinator
//!
//! Turns "the user pressed play" into exactly one playback-start event.
//! When playback info for the selected item is not cached yet the intent is
//! parked, a fetch is issued, and the intent is replayed once the result
//! arrives. A newer intent replaces the parked one.
//!
//! All transitions happen on the caller's context: fetches and timers only
//! post [`PlaybackEvent`]s, which the host feeds back through [`handle`].
//!
//! [`handle`]: PlaybackCoordinator::handle

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::api::PlaybackInfoSource;
use crate::models::{
    BasicPlayback, PendingPlayback, PlaybackInfo, PlaybackStart, ResolvedPlayback, SelectedItem,
    StreamType, TrackSelection, NO_TRACK,
};
use crate::prefs::TrackPreferenceStore;

use super::catalog::{is_hdr, source_framerate};
use super::debounce::Debouncer;
use super::loader::{LoadOutcome, PlaybackInfoLoader};
use super::preferences::apply_preferences;
use super::tracks::to_engine_track_number;
use super::{ItemContext, PlaybackEvent};

/// Quiet period before prefetching info for a newly selected item
pub const DEFAULT_PREFETCH_DELAY: Duration = Duration::from_millis(300);

/// Coordinator state for the selected item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// Nothing requested
    #[default]
    Idle,
    /// A play intent is parked until info arrives
    AwaitingInfo { pending: PendingPlayback },
    /// Info is cached and track selection applied
    Ready,
}

pub struct PlaybackCoordinator {
    loader: PlaybackInfoLoader,
    prefs: Arc<dyn TrackPreferenceStore>,
    items: Arc<dyn ItemContext>,
    prefetch: Debouncer,
    events_tx: mpsc::UnboundedSender<PlaybackEvent>,
    events_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
    state: CoordinatorState,
    selection: Option<TrackSelection>,
    active_item: Option<String>,
}

impl PlaybackCoordinator {
    pub fn new(
        source: Arc<dyn PlaybackInfoSource>,
        prefs: Arc<dyn TrackPreferenceStore>,
        items: Arc<dyn ItemContext>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            loader: PlaybackInfoLoader::new(source, events_tx.clone()),
            prefs,
            items,
            prefetch: Debouncer::new(DEFAULT_PREFETCH_DELAY),
            events_tx,
            events_rx,
            state: CoordinatorState::Idle,
            selection: None,
            active_item: None,
        }
    }

    pub fn with_prefetch_delay(mut self, delay: Duration) -> Self {
        self.prefetch = Debouncer::new(delay);
        self
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loader.subscribe()
    }

    /// Current track selection, once info for the selected item is loaded
    pub fn track_selection(&self) -> Option<TrackSelection> {
        self.selection
    }

    /// Cached info for the selected item
    pub fn playback_info(&self) -> Option<&PlaybackInfo> {
        self.active_item
            .as_deref()
            .and_then(|id| self.loader.info_for(id))
    }

    /// Number of playback-info fetches started
    pub fn requests_issued(&self) -> usize {
        self.loader.requests_issued()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// The highlighted item changed: drop stale state and schedule a prefetch
    pub fn on_selection_changed(&mut self) {
        let Some(item) = self.sync_selection() else {
            self.prefetch.cancel();
            return;
        };
        if self.loader.info_for(&item.id).is_some() || self.loader.is_in_flight() {
            return;
        }

        let events = self.events_tx.clone();
        let item_id = item.id;
        debug!(%item_id, delay = ?self.prefetch.delay(), "scheduling prefetch");
        self.prefetch.schedule(async move {
            let _ = events.send(PlaybackEvent::PrefetchDue { item_id });
        });
    }

    /// The user asked to play the selected item.
    ///
    /// Returns the playback-start event when info is already cached; otherwise
    /// the intent is parked and the event comes out of [`handle`] later.
    ///
    /// [`handle`]: PlaybackCoordinator::handle
    pub fn start_playback(&mut self, from_beginning: bool) -> Option<PlaybackStart> {
        let Some(item) = self.sync_selection() else {
            warn!("start requested with no item selected");
            return None;
        };

        if let Some(info) = self.loader.info_for(&item.id) {
            self.prefetch.cancel();
            self.selection = info
                .primary_source()
                .map(|source| apply_preferences(source, item.group(), self.prefs.as_ref()));
            self.state = CoordinatorState::Ready;
            return Some(self.execute(&item, from_beginning));
        }

        let pending = PendingPlayback { from_beginning };
        match self.state {
            CoordinatorState::AwaitingInfo { .. } => {
                debug!(item_id = %item.id, from_beginning, "replacing pending playback");
            }
            _ => {
                debug!(item_id = %item.id, from_beginning, "deferring playback until info arrives");
            }
        }
        self.state = CoordinatorState::AwaitingInfo { pending };

        if !self.loader.is_in_flight() {
            self.prefetch.cancel();
            self.loader.request_for(&item.id);
        }
        None
    }

    /// Switch the audio track; `index` must be an audio stream of the current source
    pub fn select_audio_track(&mut self, index: i32) -> bool {
        self.select_track(StreamType::Audio, index)
    }

    /// Switch the subtitle track; `NO_TRACK` turns subtitles off
    pub fn select_subtitle_track(&mut self, index: i32) -> bool {
        self.select_track(StreamType::Subtitle, index)
    }

    fn select_track(&mut self, stream_type: StreamType, index: i32) -> bool {
        let Some(item) = self.sync_selection() else {
            return false;
        };
        let Some(source) = self
            .loader
            .info_for(&item.id)
            .and_then(PlaybackInfo::primary_source)
        else {
            return false;
        };

        let turning_off = stream_type == StreamType::Subtitle && index == NO_TRACK;
        if !turning_off && !source.has_stream(index, stream_type) {
            debug!(index, %stream_type, "ignoring unknown track");
            return false;
        }

        let mut selection = self
            .selection
            .unwrap_or_else(|| apply_preferences(source, item.group(), self.prefs.as_ref()));
        match stream_type {
            StreamType::Audio => selection.audio_index = index,
            _ => selection.subtitle_index = index,
        }
        self.selection = Some(selection);
        self.prefs
            .set_track_preference(item.group(), stream_type, index);
        true
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Wait for the next completion posted by a fetch or timer
    pub async fn next_event(&mut self) -> Option<PlaybackEvent> {
        self.events_rx.recv().await
    }

    /// Apply a completion; returns the playback-start event if it released one
    pub fn handle(&mut self, event: PlaybackEvent) -> Option<PlaybackStart> {
        match event {
            PlaybackEvent::PrefetchDue { item_id } => {
                let item = self.sync_selection()?;
                if item.id == item_id && self.loader.info_for(&item.id).is_none() {
                    self.loader.request_for(&item.id);
                }
                None
            }
            PlaybackEvent::InfoLoaded { item_id, result } => {
                let item = self.sync_selection();
                let selected_id = item.as_ref().map(|i| i.id.as_str());
                match self.loader.on_result(&item_id, selected_id, result) {
                    LoadOutcome::Stale => {
                        debug!(%item_id, "discarding playback info for abandoned item");
                        None
                    }
                    LoadOutcome::Loaded => item.and_then(|item| self.on_info_loaded(&item)),
                    LoadOutcome::Failed(e) => {
                        warn!(%item_id, error = %e, "playback info unavailable");
                        item.and_then(|item| self.on_info_failed(&item))
                    }
                }
            }
        }
    }

    /// Drive the event queue until the parked intent resolves
    pub async fn wait_for_start(&mut self) -> Option<PlaybackStart> {
        while matches!(self.state, CoordinatorState::AwaitingInfo { .. }) {
            let event = self.next_event().await?;
            if let Some(start) = self.handle(event) {
                return Some(start);
            }
        }
        None
    }

    fn on_info_loaded(&mut self, item: &SelectedItem) -> Option<PlaybackStart> {
        self.selection = self
            .loader
            .info_for(&item.id)
            .and_then(PlaybackInfo::primary_source)
            .map(|source| apply_preferences(source, item.group(), self.prefs.as_ref()));

        let previous = std::mem::replace(&mut self.state, CoordinatorState::Ready);
        match previous {
            CoordinatorState::AwaitingInfo { pending } => {
                Some(self.execute(item, pending.from_beginning))
            }
            _ => None,
        }
    }

    fn on_info_failed(&mut self, item: &SelectedItem) -> Option<PlaybackStart> {
        self.selection = None;
        let previous = std::mem::replace(&mut self.state, CoordinatorState::Idle);
        match previous {
            CoordinatorState::AwaitingInfo { pending } => {
                Some(self.execute(item, pending.from_beginning))
            }
            _ => None,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Re-read the selected item and reset everything if it changed
    fn sync_selection(&mut self) -> Option<SelectedItem> {
        let item = self.items.current_item().filter(|i| !i.id.is_empty());
        let id = item.as_ref().map(|i| i.id.clone());

        if id != self.active_item {
            debug!(from = ?self.active_item, to = ?id, "selection changed");
            self.prefetch.cancel();
            self.loader.invalidate();
            self.selection = None;
            self.state = CoordinatorState::Idle;
            self.active_item = id;
        }
        item
    }

    /// Build the playback-start event; terminal for the intent that caused it
    fn execute(&mut self, item: &SelectedItem, from_beginning: bool) -> PlaybackStart {
        let start_position_ticks = if from_beginning {
            0
        } else {
            item.resume_position_ticks
        };

        let info = self.loader.info_for(&item.id);
        let Some(source) = info.and_then(PlaybackInfo::primary_source) else {
            info!(item_id = %item.id, "starting basic playback");
            return PlaybackStart::Basic(BasicPlayback {
                item_id: item.id.clone(),
                start_position_ticks,
                framerate: source_framerate(None),
                is_hdr: is_hdr(None),
            });
        };

        let selection = self
            .selection
            .unwrap_or_else(|| apply_preferences(source, item.group(), self.prefs.as_ref()));

        let resolved = ResolvedPlayback {
            item_id: item.id.clone(),
            start_position_ticks,
            media_source_id: source.id.clone(),
            play_session_id: info.and_then(|i| i.play_session_id.clone()),
            audio_index: selection.audio_index,
            subtitle_index: selection.subtitle_index,
            audio_track: to_engine_track_number(
                selection.audio_index,
                Some(source),
                StreamType::Audio,
            ),
            subtitle_track: to_engine_track_number(
                selection.subtitle_index,
                Some(source),
                StreamType::Subtitle,
            ),
            framerate: source_framerate(Some(source)),
            is_hdr: is_hdr(Some(source)),
        };

        let group = item.group();
        if selection.audio_index >= 0 {
            self.prefs
                .set_track_preference(group, StreamType::Audio, selection.audio_index);
        }
        self.prefs
            .set_track_preference(group, StreamType::Subtitle, selection.subtitle_index);
        self.selection = Some(selection);

        info!(
            item_id = %resolved.item_id,
            audio = resolved.audio_index,
            subtitle = resolved.subtitle_index,
            "starting playback"
        );
        PlaybackStart::Resolved(resolved)
    }
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("state", &self.state)
            .field("active_item", &self.active_item)
            .field("selection", &self.selection)
            .field("loader", &self.loader)
            .finish()
    }
}
