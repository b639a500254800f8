//! Scripted media backend shared by the integration tests.
//!
//! Every created resource is recorded so tests can inspect calls, count
//! live resources and fire media events by hand, including after release.

#![allow(dead_code)]

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::media::{MediaBackend, MediaEvent, MediaEventSink, MediaResource};
use core_playback::PlaybackController;
use core_runtime::config::PlayerConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// How `play()` behaves for a given URI.
#[derive(Debug, Clone)]
pub enum PlayMode {
    /// Report `Loaded { duration }` and resolve immediately.
    Succeed { duration: f64 },
    /// Reject with `PlaybackRejected`.
    Reject(String),
    /// Resolve only after [`FakeResource::open_gate`].
    Gated { duration: f64 },
    /// Never resolve.
    Hang,
}

pub struct FakeResource {
    pub uri: String,
    mode: PlayMode,
    sink: Arc<dyn MediaEventSink>,
    gate: Notify,
    released: AtomicBool,
    pub play_calls: AtomicUsize,
    pub pause_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
    pub seeks: Mutex<Vec<f64>>,
}

impl FakeResource {
    /// Deliver an event to the controller, regardless of release.
    pub fn fire(&self, event: MediaEvent) {
        self.sink.emit(event);
    }

    pub fn open_gate(&self) {
        self.gate.notify_one();
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn plays(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }

    pub fn pauses(&self) -> usize {
        self.pause_calls.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl MediaResource for FakeResource {
    async fn play(&self) -> Result<()> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            PlayMode::Succeed { duration } => {
                self.sink.emit(MediaEvent::Loaded {
                    duration: Some(*duration),
                });
                Ok(())
            }
            PlayMode::Reject(message) => Err(BridgeError::PlaybackRejected(message.clone())),
            PlayMode::Gated { duration } => {
                self.gate.notified().await;
                self.sink.emit(MediaEvent::Loaded {
                    duration: Some(*duration),
                });
                Ok(())
            }
            PlayMode::Hang => std::future::pending().await,
        }
    }

    fn pause(&self) -> Result<()> {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn seek(&self, position: f64) -> Result<()> {
        self.seeks.lock().unwrap().push(position);
        Ok(())
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.released.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeBackend {
    modes: Mutex<HashMap<String, PlayMode>>,
    created: Mutex<Vec<Arc<FakeResource>>>,
    /// Highest number of unreleased resources observed at creation time.
    max_live: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_mode(&self, uri: &str, mode: PlayMode) {
        self.modes.lock().unwrap().insert(uri.to_string(), mode);
    }

    pub fn created(&self) -> Vec<Arc<FakeResource>> {
        self.created.lock().unwrap().clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn resource(&self, index: usize) -> Arc<FakeResource> {
        Arc::clone(&self.created.lock().unwrap()[index])
    }

    pub fn last(&self) -> Arc<FakeResource> {
        let created = self.created.lock().unwrap();
        Arc::clone(created.last().expect("no resource created"))
    }

    pub fn live_count(&self) -> usize {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.is_released())
            .count()
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

impl MediaBackend for FakeBackend {
    fn create(&self, uri: &str, sink: Arc<dyn MediaEventSink>) -> Result<Arc<dyn MediaResource>> {
        if !uri.starts_with("https://") {
            return Err(BridgeError::LoadFailed(format!("unsupported uri: {}", uri)));
        }

        let mode = self
            .modes
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .unwrap_or(PlayMode::Succeed { duration: 60.0 });

        let resource = Arc::new(FakeResource {
            uri: uri.to_string(),
            mode,
            sink,
            gate: Notify::new(),
            released: AtomicBool::new(false),
            play_calls: AtomicUsize::new(0),
            pause_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
            seeks: Mutex::new(Vec::new()),
        });

        let mut created = self.created.lock().unwrap();
        created.push(Arc::clone(&resource));
        let live = created.iter().filter(|r| !r.is_released()).count();
        self.max_live.fetch_max(live, Ordering::SeqCst);

        Ok(resource)
    }
}

pub fn test_config() -> PlayerConfig {
    PlayerConfig::default().with_load_timeout(Duration::from_millis(250))
}

pub fn controller(backend: &Arc<FakeBackend>) -> PlaybackController {
    PlaybackController::new(Arc::clone(backend) as Arc<dyn MediaBackend>, test_config())
        .expect("valid test config")
}

/// Checks the invariants every published snapshot must satisfy.
pub fn assert_invariants(state: &core_playback::PlaybackState) {
    assert!(
        !(state.is_playing && state.is_loading),
        "playing and loading at once: {:?}",
        state
    );
    if state.track_id.is_none() {
        assert!(!state.is_playing, "idle but playing: {:?}", state);
        assert!(!state.is_loading, "idle but loading: {:?}", state);
        assert_eq!(state.position, 0.0);
        assert_eq!(state.duration, 0.0);
        assert!(state.track_uri.is_none());
    } else {
        assert!(state.track_uri.is_some());
    }
    if state.error.is_some() {
        assert!(state.track_id.is_none(), "error while a track is active: {:?}", state);
    }
}
