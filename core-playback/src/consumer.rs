//! # Playback Consumer
//!
//! Per-widget view of the controller bound to a single track. A consumer
//! never caches playing/loading flags of its own; every query reads the
//! controller's latest snapshot and compares `track_id` against its own.

use crate::controller::PlaybackController;
use crate::state::{PlaybackPhase, PlaybackState};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// What a widget for one track should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackView {
    /// Another track (or none) is active.
    Inactive,
    Loading,
    Playing,
    Paused,
}

/// Handle for a widget that controls one track.
#[derive(Debug, Clone)]
pub struct PlaybackConsumer {
    controller: PlaybackController,
    snapshots: watch::Receiver<PlaybackState>,
    track_id: String,
    uri: String,
    title: Option<String>,
}

impl PlaybackConsumer {
    pub fn new(
        controller: PlaybackController,
        track_id: impl Into<String>,
        uri: impl Into<String>,
        title: Option<String>,
    ) -> Self {
        let snapshots = controller.subscribe();
        Self {
            controller,
            snapshots,
            track_id: track_id.into(),
            uri: uri.into(),
            title,
        }
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    /// Latest controller snapshot.
    pub fn state(&self) -> PlaybackState {
        self.snapshots.borrow().clone()
    }

    /// Returns `true` if this consumer's track is the controller's active track.
    pub fn is_active(&self) -> bool {
        self.snapshots.borrow().is_active_track(&self.track_id)
    }

    pub fn is_playing(&self) -> bool {
        let state = self.snapshots.borrow();
        state.is_active_track(&self.track_id) && state.is_playing
    }

    pub fn is_loading(&self) -> bool {
        let state = self.snapshots.borrow();
        state.is_active_track(&self.track_id) && state.is_loading
    }

    pub fn view(&self) -> TrackView {
        let state = self.snapshots.borrow();
        if !state.is_active_track(&self.track_id) {
            return TrackView::Inactive;
        }
        match state.phase() {
            PlaybackPhase::Idle => TrackView::Inactive,
            PlaybackPhase::Loading => TrackView::Loading,
            PlaybackPhase::Playing => TrackView::Playing,
            PlaybackPhase::Paused => TrackView::Paused,
        }
    }

    /// Play/pause this track, or switch to it if another one is active.
    ///
    /// Returns whether this track is playing afterwards.
    pub async fn toggle(&self) -> bool {
        self.controller
            .request(&self.track_id, &self.uri, self.title.as_deref())
            .await
    }

    /// Stop playback, but only if this consumer's track is the active one.
    pub fn stop(&self) {
        if self.is_active() {
            self.controller.stop();
        }
    }

    /// Wait until the controller publishes a snapshot this consumer has not seen.
    pub async fn changed(&mut self) {
        // The sender lives in the controller this consumer holds, so this
        // cannot fail.
        self.snapshots.changed().await.ok();
    }
}

impl PlaybackController {
    /// Consumer bound to one track of this controller.
    pub fn consumer(
        &self,
        track_id: impl Into<String>,
        uri: impl Into<String>,
        title: Option<String>,
    ) -> PlaybackConsumer {
        PlaybackConsumer::new(self.clone(), track_id, uri, title)
    }
}
