//! # Playback Controller
//!
//! Owns the single active [`MediaResource`] and is the only writer of
//! [`PlaybackState`].
//!
//! ## Lifecycle
//!
//! ```text
//! IDLE --request--> LOADING --(ready)--> PLAYING
//! LOADING --(error)--> IDLE (error set)
//! PLAYING --pause--> PAUSED --resume--> PLAYING
//! PLAYING/PAUSED --(ended)--> IDLE
//! PLAYING/PAUSED/LOADING --stop or switch--> IDLE (resource released first)
//! any --(error)--> IDLE (error set, resource released)
//! ```
//!
//! ## Resource identity
//!
//! Every resource is tagged with the generation that was current when it
//! was created. Detaching a resource (switch, stop, end, failure) bumps the
//! generation under the lock *before* the resource is released, and every
//! media event and every in-flight `play()` re-checks its generation before
//! touching state. Events from a released resource are therefore dropped no
//! matter when the host delivers them, and a request that was pre-empted
//! while loading resolves to `false` without mutating anything.
//!
//! ## Commands
//!
//! Toggling the active track bumps a command counter on the same slot. A
//! `play()` started by an earlier command is abandoned once the counter
//! moves, so a pause issued while it is still pending is never undone when
//! it resolves.
//!
//! ## Locking
//!
//! The lock is never held across an `.await` or across a call into the media
//! bridge: hosts are allowed to emit events synchronously from inside
//! `create`, `play`, `pause` or `release`.

use crate::error::{PlaybackError, Result};
use crate::state::PlaybackState;
use bridge_traits::media::{MediaBackend, MediaEvent, MediaEventSink, MediaResource};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::redact_uri;
use core_runtime::time;
use futures::future::{self, Either};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, instrument, trace, warn};

/// Arbiter of every play/pause/switch/stop request.
///
/// Cloning is cheap; all clones drive the same resource and publish the same
/// state.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn MediaBackend>,
    config: PlayerConfig,
    events: Option<EventBus>,
    slot: Mutex<Slot>,
    state_tx: watch::Sender<PlaybackState>,
    ticket_tx: watch::Sender<Ticket>,
}

struct Slot {
    generation: u64,
    command: u64,
    resource: Option<Arc<dyn MediaResource>>,
}

impl Slot {
    fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
            command: self.command,
        }
    }
}

/// Identifies the resource (`generation`) and the user command on it
/// (`command`) that an in-flight `play()` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Ticket {
    generation: u64,
    command: u64,
}

impl PlaybackController {
    /// Create a controller over `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Config`] if `config` fails validation.
    pub fn new(backend: Arc<dyn MediaBackend>, config: PlayerConfig) -> Result<Self> {
        Self::build(backend, config, None)
    }

    /// Like [`new`](Self::new), additionally publishing transitions on `events`.
    pub fn with_event_bus(
        backend: Arc<dyn MediaBackend>,
        config: PlayerConfig,
        events: EventBus,
    ) -> Result<Self> {
        Self::build(backend, config, Some(events))
    }

    fn build(
        backend: Arc<dyn MediaBackend>,
        config: PlayerConfig,
        events: Option<EventBus>,
    ) -> Result<Self> {
        config.validate()?;

        let (state_tx, _) = watch::channel(PlaybackState::default());
        let (ticket_tx, _) = watch::channel(Ticket::default());

        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                config,
                events,
                slot: Mutex::new(Slot {
                    generation: 0,
                    command: 0,
                    resource: None,
                }),
                state_tx,
                ticket_tx,
            }),
        })
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    /// Current snapshot.
    pub fn state(&self) -> PlaybackState {
        self.inner.state_tx.borrow().clone()
    }

    /// Receiver that is notified with every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.inner.state_tx.subscribe()
    }

    /// Play, pause or switch to `track_id`.
    ///
    /// Requesting the active track toggles it. Any other track releases the
    /// current resource and starts loading a new one from `uri`.
    ///
    /// Returns whether the requested track is playing when the call
    /// completes. Failures never escape: they are reported through
    /// [`PlaybackState::error`] and a `false` return.
    #[instrument(skip_all, fields(track_id = %track_id))]
    pub async fn request(&self, track_id: &str, uri: &str, title: Option<&str>) -> bool {
        if track_id.trim().is_empty() {
            return self.inner.reject(PlaybackError::EmptyTrackId);
        }
        if uri.trim().is_empty() {
            return self.inner.reject(PlaybackError::EmptyUri);
        }

        if let Some((ticket, resource, playing)) = self.inner.claim_active(track_id) {
            return self.toggle(ticket, resource, playing).await;
        }

        self.switch(track_id, uri, title.map(str::to_string)).await
    }

    /// Release the current resource and reset to idle, clearing any error.
    ///
    /// Safe to call at any time, including when already idle.
    pub fn stop(&self) {
        let (generation, previous) = self.inner.retire(None).unwrap_or_default();
        self.inner
            .publish_if_current(generation, |state| *state = PlaybackState::default());

        if let Some(track_id) = previous.track_id {
            info!(track_id = %track_id, "Playback stopped");
            self.inner.emit(PlaybackEvent::Stopped { track_id });
        }
    }

    /// Jump to `seconds`, clamped to `[0, duration]`.
    ///
    /// No-op without an active resource.
    pub fn seek_to(&self, seconds: f64) {
        if !seconds.is_finite() {
            warn!(seconds, "Ignoring seek to non-finite position");
            return;
        }

        let (generation, resource, target) = {
            let slot = self.inner.slot.lock();
            let Some(resource) = slot.resource.clone() else {
                trace!("Seek ignored: no active resource");
                return;
            };
            let duration = self.inner.state_tx.borrow().duration;
            (slot.generation, resource, seconds.clamp(0.0, duration))
        };

        if let Err(err) = resource.seek(target) {
            warn!(error = %err, target, "Seek failed");
            return;
        }

        let mut seeked = None;
        self.inner.publish_if_current(generation, |state| {
            state.position = target;
            seeked = state.track_id.clone().map(|track_id| PlaybackEvent::Seeked {
                track_id,
                position_ms: state.position_ms(),
            });
        });
        if let Some(event) = seeked {
            debug!(position = target, "Seeked");
            self.inner.emit(event);
        }
    }

    /// Seek ahead of the current position by `seconds`, or by the
    /// configured step when `None`.
    pub fn seek_forward(&self, seconds: Option<f64>) {
        let step = seconds.unwrap_or(self.inner.config.seek_step_secs);
        let position = self.inner.state_tx.borrow().position;
        self.seek_to(position + step);
    }

    /// Seek behind the current position by `seconds`, or by the configured
    /// step when `None`.
    pub fn seek_backward(&self, seconds: Option<f64>) {
        let step = seconds.unwrap_or(self.inner.config.seek_step_secs);
        let position = self.inner.state_tx.borrow().position;
        self.seek_to(position - step);
    }

    async fn toggle(&self, ticket: Ticket, resource: Arc<dyn MediaResource>, playing: bool) -> bool {
        if !playing {
            debug!("Resuming active track");
            return self.start(ticket, &resource).await;
        }

        if let Err(err) = resource.pause() {
            warn!(error = %err, "Pause rejected by media resource");
            return true;
        }

        self.inner.mark_paused(ticket.generation);
        false
    }

    async fn switch(&self, track_id: &str, uri: &str, title: Option<String>) -> bool {
        let (generation, previous) = self.inner.retire(None).unwrap_or_default();
        if let Some(previous_id) = previous.track_id {
            debug!(previous = %previous_id, "Released previous track");
            self.inner.emit(PlaybackEvent::Stopped {
                track_id: previous_id,
            });
        }

        let loading = PlaybackState::loading(track_id, uri, title.clone());
        if !self
            .inner
            .publish_if_current(generation, |state| *state = loading)
        {
            debug!("Request superseded before loading began");
            return false;
        }

        info!(uri = %redact_uri(uri), "Loading track");
        self.inner.emit(PlaybackEvent::Loading {
            track_id: track_id.to_string(),
            title,
        });

        let sink: Arc<dyn MediaEventSink> = Arc::new(ResourceEvents {
            generation,
            controller: Arc::downgrade(&self.inner),
        });

        let (ticket, resource) = match self.inner.install(generation, uri, sink) {
            Ok(Some(installed)) => installed,
            Ok(None) => return false,
            Err(err) => {
                self.inner.fail(generation, err);
                return false;
            }
        };

        self.start(ticket, &resource).await
    }

    /// Issue `play()` bounded by the load timeout, abandoning it as soon as
    /// the resource is detached or another command is issued on it.
    async fn start(&self, ticket: Ticket, resource: &Arc<dyn MediaResource>) -> bool {
        let timeout = self.inner.config.load_timeout;

        let play = time::timeout(timeout, resource.play());
        let superseded = self.inner.superseded(ticket);
        futures::pin_mut!(play);
        futures::pin_mut!(superseded);

        let outcome = match future::select(play, superseded).await {
            Either::Left((outcome, _)) => outcome,
            Either::Right(_) => {
                debug!("Request superseded while starting playback");
                return false;
            }
        };

        match outcome {
            Ok(Ok(())) => self.inner.mark_started(ticket),
            Ok(Err(err)) => {
                self.inner.fail(ticket.generation, PlaybackError::from_play(err));
                false
            }
            Err(_) => {
                self.inner.fail(ticket.generation, PlaybackError::LoadTimeout(timeout));
                false
            }
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &*self.inner.state_tx.borrow())
            .field("config", &self.inner.config)
            .finish()
    }
}

// ============================================================================
// Shared state transitions
// ============================================================================

impl Inner {
    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::Playback(event)).ok();
        }
    }

    /// Apply `mutate` and notify subscribers if the snapshot changed.
    fn update(&self, mutate: impl FnOnce(&mut PlaybackState)) -> bool {
        self.state_tx.send_if_modified(|state| {
            let before = state.clone();
            mutate(state);
            *state != before
        })
    }

    /// Apply `mutate` only while `generation` is still current.
    fn publish_if_current(&self, generation: u64, mutate: impl FnOnce(&mut PlaybackState)) -> bool {
        self.publish_if(|slot| slot.generation == generation, mutate)
    }

    fn publish_if(
        &self,
        accept: impl FnOnce(&Slot) -> bool,
        mutate: impl FnOnce(&mut PlaybackState),
    ) -> bool {
        let slot = self.slot.lock();
        if !accept(&*slot) {
            return false;
        }
        self.update(mutate);
        true
    }

    /// Claim the resource of `track_id` for a new toggle command.
    ///
    /// Bumping the command counter abandons any `play()` still pending from
    /// an earlier command on the same resource.
    fn claim_active(&self, track_id: &str) -> Option<(Ticket, Arc<dyn MediaResource>, bool)> {
        let mut slot = self.slot.lock();
        let playing = {
            let state = self.state_tx.borrow();
            if !state.is_active_track(track_id) {
                return None;
            }
            state.is_playing
        };
        let resource = slot.resource.clone()?;

        slot.command += 1;
        let ticket = slot.ticket();
        self.ticket_tx.send_replace(ticket);
        Some((ticket, resource, playing))
    }

    /// Create the resource for `generation` and make it the active one.
    ///
    /// `Ok(None)` means the request was superseded while creating; the new
    /// resource has already been released.
    fn install(
        &self,
        generation: u64,
        uri: &str,
        sink: Arc<dyn MediaEventSink>,
    ) -> Result<Option<(Ticket, Arc<dyn MediaResource>)>> {
        let resource = self
            .backend
            .create(uri, sink)
            .map_err(PlaybackError::from_create)?;

        let mut slot = self.slot.lock();
        if slot.generation != generation {
            drop(slot);
            debug!("Request superseded while creating resource");
            resource.release();
            return Ok(None);
        }
        slot.resource = Some(Arc::clone(&resource));
        Ok(Some((slot.ticket(), resource)))
    }

    /// Detach and release the current resource.
    ///
    /// With `expected`, nothing happens unless that generation is current.
    /// Returns the new generation and the snapshot as it was before the
    /// caller publishes its follow-up state.
    fn retire(&self, expected: Option<u64>) -> Option<(u64, PlaybackState)> {
        let (generation, resource) = {
            let mut slot = self.slot.lock();
            if expected.is_some_and(|g| g != slot.generation) {
                return None;
            }
            slot.generation += 1;
            self.ticket_tx.send_replace(slot.ticket());
            (slot.generation, slot.resource.take())
        };

        if let Some(resource) = resource {
            if let Err(err) = resource.pause() {
                trace!(error = %err, "Pause before release failed");
            }
            resource.release();
        }

        Some((generation, self.state_tx.borrow().clone()))
    }

    /// Resolves once `ticket` is no longer the latest command on the
    /// active resource.
    async fn superseded(&self, ticket: Ticket) {
        let mut rx = self.ticket_tx.subscribe();
        rx.wait_for(|current| *current != ticket).await.ok();
    }

    fn reject(&self, err: PlaybackError) -> bool {
        warn!(error = %err, "Rejecting playback request");

        let message = err.to_string();
        let recorded = {
            let _slot = self.slot.lock();
            self.update(|state| {
                if state.is_idle() {
                    state.error = Some(message.clone());
                }
            })
        };

        if recorded {
            self.emit(PlaybackEvent::Error {
                track_id: None,
                message,
                recoverable: false,
            });
        }
        false
    }

    /// `play()` of `ticket` resolved. Moves to PLAYING unless the resource
    /// was detached or another command was issued on it meanwhile.
    fn mark_started(&self, ticket: Ticket) -> bool {
        let current = self.enter_playing(|slot| slot.ticket() == ticket);
        if !current {
            debug!("Play resolved after a newer command");
        }
        current
    }

    /// Move to PLAYING. Returns whether `generation` is still current.
    fn mark_playing(&self, generation: u64) -> bool {
        self.enter_playing(|slot| slot.generation == generation)
    }

    fn enter_playing(&self, accept: impl FnOnce(&Slot) -> bool) -> bool {
        let mut transition = None;
        let current = self.publish_if(accept, |state| {
            let Some(track_id) = state.track_id.clone() else {
                return;
            };
            if state.is_playing && !state.is_loading {
                return;
            }
            transition = Some(if state.is_loading {
                PlaybackEvent::Started {
                    track_id,
                    title: state.track_title.clone(),
                }
            } else {
                PlaybackEvent::Resumed {
                    track_id,
                    position_ms: state.position_ms(),
                }
            });
            state.is_loading = false;
            state.is_playing = true;
        });

        if let Some(event) = transition {
            if matches!(event, PlaybackEvent::Started { .. }) {
                info!("Playback started");
            } else {
                debug!("Playback resumed");
            }
            self.emit(event);
        }
        current
    }

    fn mark_paused(&self, generation: u64) {
        let mut transition = None;
        self.publish_if_current(generation, |state| {
            let Some(track_id) = state.track_id.clone() else {
                return;
            };
            if !state.is_playing {
                return;
            }
            state.is_playing = false;
            transition = Some(PlaybackEvent::Paused {
                track_id,
                position_ms: state.position_ms(),
            });
        });

        if let Some(event) = transition {
            debug!("Playback paused");
            self.emit(event);
        }
    }

    fn set_duration(&self, generation: u64, duration: f64) {
        if !duration.is_finite() || duration < 0.0 {
            trace!(duration, "Ignoring invalid duration");
            return;
        }
        self.publish_if_current(generation, |state| {
            state.duration = duration;
            if duration > 0.0 && state.position > duration {
                state.position = duration;
            }
        });
    }

    fn set_position(&self, generation: u64, position: f64) {
        if !position.is_finite() {
            return;
        }

        let mut progress = None;
        let emit_progress = self.config.emit_position_events;
        self.publish_if_current(generation, |state| {
            let mut position = position.max(0.0);
            if state.duration > 0.0 {
                position = position.min(state.duration);
            }
            if state.position == position {
                return;
            }
            state.position = position;
            if emit_progress {
                progress = state.track_id.clone().map(|track_id| PlaybackEvent::PositionChanged {
                    track_id,
                    position_ms: state.position_ms(),
                    duration_ms: state.duration_ms(),
                });
            }
        });

        if let Some(event) = progress {
            self.emit(event);
        }
    }

    /// Natural end of the track.
    fn finish(&self, generation: u64) {
        let Some((next, previous)) = self.retire(Some(generation)) else {
            return;
        };
        self.publish_if_current(next, |state| *state = PlaybackState::default());

        if let Some(track_id) = previous.track_id {
            info!(track_id = %track_id, "Track completed");
            self.emit(PlaybackEvent::Completed { track_id });
        }
    }

    /// Release the resource of `generation` and go idle with `err`.
    ///
    /// Does nothing if the resource was already detached.
    fn fail(&self, generation: u64, err: PlaybackError) {
        let Some((next, previous)) = self.retire(Some(generation)) else {
            debug!(error = %err, "Dropping failure of superseded resource");
            return;
        };

        let message = err.to_string();
        self.publish_if_current(next, |state| *state = PlaybackState::failed(message.clone()));

        warn!(
            track_id = previous.track_id.as_deref().unwrap_or_default(),
            error = %message,
            "Playback failed"
        );
        self.emit(PlaybackEvent::Error {
            track_id: previous.track_id,
            message,
            recoverable: err.is_transient(),
        });
    }

    fn on_media_event(&self, generation: u64, event: MediaEvent) {
        if self.slot.lock().generation != generation {
            trace!(event = event.name(), "Ignoring event from released resource");
            return;
        }
        if event.is_terminal() {
            debug!(event = event.name(), "Terminal media event");
        } else {
            trace!(event = event.name(), "Media event");
        }

        match event {
            MediaEvent::Loaded { duration } => {
                if let Some(duration) = duration {
                    self.set_duration(generation, duration);
                }
            }
            MediaEvent::DurationChanged { duration } => self.set_duration(generation, duration),
            MediaEvent::Playing => {
                self.mark_playing(generation);
            }
            MediaEvent::Paused => self.mark_paused(generation),
            MediaEvent::TimeUpdate { position } => self.set_position(generation, position),
            MediaEvent::Ended => self.finish(generation),
            MediaEvent::Error { message } => {
                self.fail(generation, PlaybackError::MediaFailed(message))
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(resource) = self.slot.get_mut().resource.take() {
            resource.release();
        }
    }
}

// ============================================================================
// Media event sink
// ============================================================================

/// Sink handed to one resource; routes its events back to the controller
/// tagged with the generation the resource was created for.
struct ResourceEvents {
    generation: u64,
    controller: Weak<Inner>,
}

impl MediaEventSink for ResourceEvents {
    fn emit(&self, event: MediaEvent) {
        if let Some(inner) = self.controller.upgrade() {
            inner.on_media_event(self.generation, event);
        }
    }
}
