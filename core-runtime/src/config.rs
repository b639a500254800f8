//! # Player Configuration
//!
//! Tunables for the playback core. Every field has a serde default so hosts
//! can ship a partial JSON document (or none at all) and override only what
//! they need.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::PlayerConfig;
//! use std::time::Duration;
//!
//! let config = PlayerConfig::default()
//!     .with_load_timeout(Duration::from_secs(15))
//!     .with_seek_step_secs(5.0);
//!
//! config.validate().expect("valid config");
//! ```
//!
//! ## Environment overrides
//!
//! [`PlayerConfig::from_env`] starts from the defaults and applies:
//!
//! | variable | field |
//! |---|---|
//! | `BIRDSONG_LOAD_TIMEOUT_MS` | `load_timeout` |
//! | `BIRDSONG_SEEK_STEP_SECS` | `seek_step_secs` |
//! | `BIRDSONG_EVENT_BUFFER` | `event_buffer_size` |

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_LOAD_TIMEOUT_MS: &str = "BIRDSONG_LOAD_TIMEOUT_MS";
pub const ENV_SEEK_STEP_SECS: &str = "BIRDSONG_SEEK_STEP_SECS";
pub const ENV_EVENT_BUFFER: &str = "BIRDSONG_EVENT_BUFFER";

/// Upper bound accepted for `load_timeout`.
const MAX_LOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Playback controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// How long a resource may stay in the loading phase before the request
    /// is failed with a timeout error.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_load_timeout")]
    pub load_timeout: Duration,

    /// Step used by `seek_forward` / `seek_backward` when the caller does not
    /// pass one, in seconds.
    ///
    /// Default: 10.
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,

    /// Capacity of the playback event bus.
    ///
    /// Default: 100.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Whether `TimeUpdate` progress is mirrored onto the event bus as
    /// `PositionChanged`. Snapshot subscribers always see position changes.
    ///
    /// Default: true.
    #[serde(default = "default_emit_position_events")]
    pub emit_position_events: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            load_timeout: default_load_timeout(),
            seek_step_secs: default_seek_step_secs(),
            event_buffer_size: default_event_buffer_size(),
            emit_position_events: default_emit_position_events(),
        }
    }
}

impl PlayerConfig {
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn with_seek_step_secs(mut self, seconds: f64) -> Self {
        self.seek_step_secs = seconds;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_position_events(mut self, enabled: bool) -> Self {
        self.emit_position_events = enabled;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.load_timeout.is_zero() {
            return Err(Error::Config(
                "load_timeout must be greater than 0".to_string(),
            ));
        }

        if self.load_timeout > MAX_LOAD_TIMEOUT {
            return Err(Error::Config(format!(
                "load_timeout exceeds maximum of {} seconds",
                MAX_LOAD_TIMEOUT.as_secs()
            )));
        }

        if !self.seek_step_secs.is_finite() || self.seek_step_secs <= 0.0 {
            return Err(Error::Config(
                "seek_step_secs must be a positive number".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Defaults overlaid with `BIRDSONG_*` environment variables, validated.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_LOAD_TIMEOUT_MS) {
            let millis: u64 = parse_var(ENV_LOAD_TIMEOUT_MS, &raw)?;
            config.load_timeout = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup(ENV_SEEK_STEP_SECS) {
            config.seek_step_secs = parse_var(ENV_SEEK_STEP_SECS, &raw)?;
        }

        if let Some(raw) = lookup(ENV_EVENT_BUFFER) {
            config.event_buffer_size = parse_var(ENV_EVENT_BUFFER, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {} ({})", key, raw, e)))
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_load_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_seek_step_secs() -> f64 {
    10.0
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

fn default_emit_position_events() -> bool {
    true
}
