//! # Playback Error Types
//!
//! Errors raised while servicing a playback request. They never escape
//! [`PlaybackController::request`](crate::PlaybackController::request): the
//! controller turns every one of them into the `error` field of the snapshot
//! and a `false` return.

use bridge_traits::error::BridgeError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Request Errors
    // ========================================================================
    /// Track identifier was empty or blank.
    #[error("Invalid request: track id must not be empty")]
    EmptyTrackId,

    /// Playable URI was empty or blank.
    #[error("Invalid request: uri must not be empty")]
    EmptyUri,

    // ========================================================================
    // Load Errors
    // ========================================================================
    /// The host could not create a resource for the URI.
    #[error("Failed to load track: {0}")]
    LoadFailed(String),

    /// The resource never became ready within the configured window.
    #[error("Timed out loading track after {}ms", .0.as_millis())]
    LoadTimeout(Duration),

    /// The resource reported a fatal error through its event sink.
    #[error("Media error: {0}")]
    MediaFailed(String),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Resource was created but refused to start or resume.
    #[error("Playback failed to start: {0}")]
    StartFailed(String),

    // ========================================================================
    // Setup Errors
    // ========================================================================
    /// The controller was given an invalid [`PlayerConfig`](core_runtime::config::PlayerConfig).
    #[error(transparent)]
    Config(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Returns `true` for requests rejected before any resource was touched.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, PlaybackError::EmptyTrackId | PlaybackError::EmptyUri)
    }

    /// Returns `true` if the media could not be fetched or decoded.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadFailed(_)
                | PlaybackError::LoadTimeout(_)
                | PlaybackError::MediaFailed(_)
        )
    }

    /// Returns `true` if repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadTimeout(_)
                | PlaybackError::MediaFailed(_)
                | PlaybackError::StartFailed(_)
        )
    }

    /// Classify a bridge error raised by `MediaBackend::create`.
    pub(crate) fn from_create(err: BridgeError) -> Self {
        match err {
            BridgeError::PlaybackRejected(msg) => PlaybackError::StartFailed(msg),
            other => PlaybackError::LoadFailed(other.to_string()),
        }
    }

    /// Classify a bridge error raised by `MediaResource::play`.
    pub(crate) fn from_play(err: BridgeError) -> Self {
        match err {
            BridgeError::LoadFailed(msg) | BridgeError::UnsupportedFormat(msg) => {
                PlaybackError::LoadFailed(msg)
            }
            other => PlaybackError::StartFailed(other.to_string()),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(PlaybackError::EmptyTrackId.is_invalid_request());
        assert!(PlaybackError::EmptyUri.is_invalid_request());
        assert!(!PlaybackError::EmptyUri.is_load_failure());

        assert!(PlaybackError::LoadFailed("404".into()).is_load_failure());
        assert!(!PlaybackError::LoadFailed("404".into()).is_transient());
        assert!(PlaybackError::LoadTimeout(Duration::from_secs(1)).is_transient());
        assert!(PlaybackError::StartFailed("autoplay".into()).is_transient());
    }

    #[test]
    fn test_timeout_message() {
        let err = PlaybackError::LoadTimeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Timed out loading track after 1500ms");
    }

    #[test]
    fn test_bridge_error_mapping() {
        let err = PlaybackError::from_create(BridgeError::LoadFailed("bad-uri".into()));
        assert!(matches!(err, PlaybackError::LoadFailed(_)));
        assert!(err.to_string().contains("bad-uri"));

        let err = PlaybackError::from_play(BridgeError::PlaybackRejected("autoplay".into()));
        assert!(matches!(err, PlaybackError::StartFailed(_)));

        let err = PlaybackError::from_play(BridgeError::UnsupportedFormat("aiff".into()));
        assert!(matches!(err, PlaybackError::LoadFailed(ref m) if m == "aiff"));
    }

    #[test]
    fn test_config_error_is_not_a_request_error() {
        let err: PlaybackError = core_runtime::Error::Config("bad".into()).into();
        assert!(!err.is_invalid_request());
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Configuration error: bad");
    }
}
