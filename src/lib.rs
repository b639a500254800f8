//! Workspace facade crate.
//!
//! Re-exports the playback core so host applications can depend on
//! `birdsong-workspace` alone instead of wiring each crate individually.
//!
//! - [`bridge`]: capability traits the host implements (media backend,
//!   logger sink)
//! - [`runtime`]: logging setup, player configuration, event bus
//! - [`playback`]: the single-active-track controller and its consumers

pub use bridge_traits as bridge;
pub use core_playback as playback;
pub use core_runtime as runtime;

pub use core_playback::{
    PlaybackConsumer, PlaybackController, PlaybackError, PlaybackPhase, PlaybackState, TrackView,
};
pub use core_runtime::config::PlayerConfig;
