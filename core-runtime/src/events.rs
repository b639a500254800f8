//! # Event Bus System
//!
//! Broadcast channel for playback notifications aimed at non-UI observers
//! (analytics, logging, "recently played" bookkeeping). UI widgets should read
//! the controller's snapshot channel instead: the bus carries discrete
//! transitions, the snapshot carries the authoritative state.
//!
//! ```text
//! ┌────────────────────┐   emit    ┌───────────┐  subscribe  ┌────────────┐
//! │ PlaybackController ├──────────>│ EventBus  ├────────────>│ Subscriber │
//! └────────────────────┘           │(broadcast)├────────────>│ Subscriber │
//!                                  └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Stopped {
//!     track_id: "rec-1".to_string(),
//! }))
//! .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Playback stopped");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n`
//!   events. Non-fatal; keep receiving.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.
//!
//! Emitting with no subscribers returns `Err`, which publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Playback-related events
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Started { .. })
            | CoreEvent::Playback(PlaybackEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Track the event refers to, if any.
    pub fn track_id(&self) -> Option<&str> {
        match self {
            CoreEvent::Playback(e) => e.track_id(),
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Discrete playback transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A new resource was created and is fetching.
    Loading {
        track_id: String,
        title: Option<String>,
    },
    /// The resource became ready and audio started.
    Started {
        track_id: String,
        title: Option<String>,
    },
    /// Playback paused (toggle or platform interruption).
    Paused {
        track_id: String,
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    /// Playback resumed after pause.
    Resumed {
        track_id: String,
        /// Position when resumed (milliseconds).
        position_ms: u64,
    },
    /// Playback stopped explicitly or replaced by another track.
    Stopped { track_id: String },
    /// Track finished playing naturally.
    Completed { track_id: String },
    /// Natural progress update.
    PositionChanged {
        track_id: String,
        position_ms: u64,
        duration_ms: u64,
    },
    /// Position changed because of a seek command.
    Seeked { track_id: String, position_ms: u64 },
    /// Load, start or runtime failure. The controller is idle afterwards.
    Error {
        track_id: Option<String>,
        message: String,
        /// Whether a new request for the same track may succeed.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Loading { .. } => "Track loading",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Track completed",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::Seeked { .. } => "Playback position sought",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }

    fn track_id(&self) -> Option<&str> {
        match self {
            PlaybackEvent::Loading { track_id, .. }
            | PlaybackEvent::Started { track_id, .. }
            | PlaybackEvent::Paused { track_id, .. }
            | PlaybackEvent::Resumed { track_id, .. }
            | PlaybackEvent::Stopped { track_id }
            | PlaybackEvent::Completed { track_id }
            | PlaybackEvent::PositionChanged { track_id, .. }
            | PlaybackEvent::Seeked { track_id, .. } => Some(track_id),
            PlaybackEvent::Error { track_id, .. } => track_id.as_deref(),
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every clone publishes into the same
/// channel. Each `subscribe()` creates an independent receiver that sees
/// events emitted after it was created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus that buffers up to `capacity` events per
    /// subscriber before the subscriber starts lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when nobody is subscribed.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let only_rec_7 = EventStream::new(bus.subscribe())
///     .filter(|event| event.track_id() == Some("rec-7"));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv` / `try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv); `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stopped(track_id: &str) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::Stopped {
            track_id: track_id.to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(stopped("rec-1")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Playback(PlaybackEvent::Started {
            track_id: "rec-1".to_string(),
            title: Some("Common Blackbird".to_string()),
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| event.severity() == EventSeverity::Error);

        bus.emit(stopped("rec-1")).ok();
        let failure = CoreEvent::Playback(PlaybackEvent::Error {
            track_id: Some("rec-2".to_string()),
            message: "404".to_string(),
            recoverable: true,
        });
        bus.emit(failure.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), failure);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(stopped(&format!("rec-{}", i))).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            track_id: None,
            message: "Failed".to_string(),
            recoverable: false,
        });
        assert_eq!(error.severity(), EventSeverity::Error);

        let completed = CoreEvent::Playback(PlaybackEvent::Completed {
            track_id: "rec-1".to_string(),
        });
        assert_eq!(completed.severity(), EventSeverity::Info);

        let progress = CoreEvent::Playback(PlaybackEvent::PositionChanged {
            track_id: "rec-1".to_string(),
            position_ms: 5000,
            duration_ms: 18000,
        });
        assert_eq!(progress.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_track_id_accessor() {
        assert_eq!(stopped("rec-9").track_id(), Some("rec-9"));
        let anonymous = CoreEvent::Playback(PlaybackEvent::Error {
            track_id: None,
            message: "empty track id".to_string(),
            recoverable: false,
        });
        assert_eq!(anonymous.track_id(), None);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Playback(PlaybackEvent::Seeked {
            track_id: "rec-3".to_string(),
            position_ms: 12_000,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Playback\""));
        assert!(json.contains("\"event\":\"Seeked\""));

        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_try_recv() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());

        bus.emit(stopped("rec-1")).ok();
        let received = stream.try_recv().unwrap().unwrap();
        assert_eq!(received, stopped("rec-1"));
    }
}
