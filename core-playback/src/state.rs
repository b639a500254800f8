//! # Playback State
//!
//! The snapshot published by [`PlaybackController`](crate::PlaybackController).
//! Every subscriber sees whole values of this type; there are no partial
//! updates.

use serde::{Deserialize, Serialize};

/// Authoritative playback state.
///
/// Positions and durations are in seconds. When `track_id` is `None` the
/// controller is idle and all other fields except `error` hold their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub track_id: Option<String>,
    pub track_uri: Option<String>,
    pub track_title: Option<String>,
    pub is_playing: bool,
    pub is_loading: bool,
    /// Last fatal condition. Cleared by every new request and by `stop()`.
    pub error: Option<String>,
    pub position: f64,
    pub duration: f64,
}

/// Coarse phase derived from a [`PlaybackState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackPhase {
    Idle,
    Loading,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Idle state carrying the message of the failure that ended the last track.
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Fresh state for a track that just started loading.
    pub(crate) fn loading(track_id: &str, uri: &str, title: Option<String>) -> Self {
        Self {
            track_id: Some(track_id.to_string()),
            track_uri: Some(uri.to_string()),
            track_title: title,
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.track_id.is_none() {
            PlaybackPhase::Idle
        } else if self.is_loading {
            PlaybackPhase::Loading
        } else if self.is_playing {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Paused
        }
    }

    pub fn is_idle(&self) -> bool {
        self.track_id.is_none()
    }

    /// Returns `true` if `track_id` is the active track, whatever its phase.
    pub fn is_active_track(&self, track_id: &str) -> bool {
        self.track_id.as_deref() == Some(track_id)
    }

    /// Fraction of the track played, in `[0, 1]`. Zero while duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub(crate) fn position_ms(&self) -> u64 {
        seconds_to_ms(self.position)
    }

    pub(crate) fn duration_ms(&self) -> u64 {
        seconds_to_ms(self.duration)
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}
