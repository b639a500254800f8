//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the playback core:
//! - Logging and tracing setup ([`logging`])
//! - Player configuration ([`config`])
//! - Playback event bus ([`events`])
//! - Target-independent timers ([`time`])
//!
//! Nothing in here knows about media resources; the controller in
//! `core-playback` builds on these pieces.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod time;

pub use config::PlayerConfig;
pub use error::{Error, Result};
