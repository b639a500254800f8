//! # Playback Module
//!
//! Single-active-track playback for the companion app.
//!
//! ## Overview
//!
//! - [`PlaybackController`] owns the one live media resource, arbitrates
//!   play/pause/switch/stop requests from any number of widgets and is the
//!   only writer of [`PlaybackState`].
//! - [`PlaybackConsumer`] is the per-widget handle: it reads the shared
//!   snapshot and forwards user intent to the controller.
//!
//! The media itself comes from the host through
//! [`bridge_traits::media::MediaBackend`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bridge_traits::media::MediaBackend;
//! use core_playback::PlaybackController;
//! use core_runtime::config::PlayerConfig;
//! use std::sync::Arc;
//!
//! async fn play_wren(backend: Arc<dyn MediaBackend>) -> core_playback::Result<()> {
//!     let controller = PlaybackController::new(backend, PlayerConfig::from_env()?)?;
//!     let wren = controller.consumer("rec-17", "https://cdn.example/wren.mp3", None);
//!
//!     if !wren.toggle().await {
//!         eprintln!("playback failed: {:?}", controller.state().error);
//!     }
//!     Ok(())
//! }
//! ```

pub mod consumer;
pub mod controller;
pub mod error;
pub mod state;

pub use consumer::{PlaybackConsumer, TrackView};
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use state::{PlaybackPhase, PlaybackState};
