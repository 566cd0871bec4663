//! Playback-info resolution and track selection
//!
//! - Catalog: stream classification and video attributes
//! - Tracks: server index <-> engine track number
//! - Preferences: saved track choices reconciled with available streams
//! - Loader: playback-info fetch lifecycle for the selected item
//! - Debounce: cancellable prefetch timer
//! - Coordinator: the deferred playback state machine

pub mod catalog;
pub mod coordinator;
pub mod debounce;
pub mod loader;
pub mod preferences;
pub mod tracks;

use parking_lot::RwLock;

use crate::api::ApiError;
use crate::models::{PlaybackInfo, SelectedItem};

pub use catalog::{extract_streams, is_hdr, source_framerate};
pub use coordinator::{CoordinatorState, PlaybackCoordinator, DEFAULT_PREFETCH_DELAY};
pub use debounce::Debouncer;
pub use loader::{LoadOutcome, PlaybackInfoLoader};
pub use preferences::apply_preferences;
pub use tracks::{to_engine_track_number, to_server_index};

/// Completion posted back onto the coordinator's event queue
#[derive(Debug)]
pub enum PlaybackEvent {
    /// The prefetch quiet period elapsed for this item
    PrefetchDue { item_id: String },
    /// A playback-info fetch finished
    InfoLoaded {
        item_id: String,
        result: Result<PlaybackInfo, ApiError>,
    },
}

/// Read access to the item the user currently has selected
pub trait ItemContext: Send + Sync {
    fn current_item(&self) -> Option<SelectedItem>;
}

/// Simple shared holder for the selected item
#[derive(Debug, Default)]
pub struct CurrentItem {
    item: RwLock<Option<SelectedItem>>,
}

impl CurrentItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, item: Option<SelectedItem>) {
        *self.item.write() = item;
    }
}

impl ItemContext for CurrentItem {
    fn current_item(&self) -> Option<SelectedItem> {
        self.item.read().clone()
    }
}
