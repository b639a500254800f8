//! Playable media primitive supplied by the host.
//!
//! The core never decodes or renders audio itself. Each host (browser
//! `HTMLAudioElement`, native player on mobile, a test double on CI) provides a
//! [`MediaBackend`] that turns a fully-resolved URI into a [`MediaResource`].
//! A resource accepts play/pause/seek commands and reports its lifecycle
//! through the [`MediaEventSink`] it was created with.
//!
//! ## Lifecycle
//!
//! ```text
//! create(uri, sink) ──> Loaded{duration} ──> Playing ──> TimeUpdate* ──> Ended
//!        │                                     │  ▲
//!        │                                     ▼  │
//!        │                                    Paused
//!        └──────────────> Error{message} (at any point)
//! ```
//!
//! Once [`MediaResource::release`] returns, the resource must not be used
//! again. Hosts should stop delivering events to the sink after release, but
//! consumers must not rely on it: events racing with release are legal and
//! the controller filters them by resource identity.

use crate::{error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle notification emitted by a media resource.
///
/// Positions and durations are expressed in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MediaEvent {
    /// Enough data is available to start playback.
    Loaded {
        /// Total length, when the container reports one.
        duration: Option<f64>,
    },
    /// Total length became known or changed (e.g. streaming metadata).
    DurationChanged { duration: f64 },
    /// Audio output started or resumed.
    Playing,
    /// Audio output paused, possibly by the platform (interruption, headset unplug).
    Paused,
    /// Periodic progress report.
    TimeUpdate { position: f64 },
    /// Playback reached the end of the media.
    Ended,
    /// Fatal failure; the resource cannot continue.
    Error { message: String },
}

impl MediaEvent {
    /// Short, stable name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::Loaded { .. } => "loaded",
            MediaEvent::DurationChanged { .. } => "duration_changed",
            MediaEvent::Playing => "playing",
            MediaEvent::Paused => "paused",
            MediaEvent::TimeUpdate { .. } => "time_update",
            MediaEvent::Ended => "ended",
            MediaEvent::Error { .. } => "error",
        }
    }

    /// Returns `true` if the resource is finished after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaEvent::Ended | MediaEvent::Error { .. })
    }
}

/// Receiver for the events of exactly one media resource.
///
/// Implementations must be cheap and non-blocking; hosts may call `emit`
/// from their own event loop or audio callback thread.
pub trait MediaEventSink: PlatformSendSync {
    fn emit(&self, event: MediaEvent);
}

/// Runtime handle backing one track's playback.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaResource: PlatformSendSync {
    /// Start or resume playback.
    ///
    /// Resolves once audio is actually being produced, or fails when the
    /// source cannot be fetched/decoded or the platform rejects playback
    /// (autoplay policy, unsupported format).
    async fn play(&self) -> Result<()>;

    /// Pause output, keeping the loaded media.
    fn pause(&self) -> Result<()>;

    /// Jump to an absolute position in seconds.
    fn seek(&self, position: f64) -> Result<()>;

    /// Stop output, detach every listener and free platform resources.
    ///
    /// Must be idempotent.
    fn release(&self);
}

/// Factory for media resources.
pub trait MediaBackend: PlatformSendSync {
    /// Create a resource for `uri` that reports to `sink`.
    ///
    /// Creation is synchronous and only validates what can be validated
    /// up front; fetch errors are reported later through `play` or
    /// [`MediaEvent::Error`].
    fn create(&self, uri: &str, sink: Arc<dyn MediaEventSink>) -> Result<Arc<dyn MediaResource>>;
}
