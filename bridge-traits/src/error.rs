use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Media source could not be loaded: {0}")]
    LoadFailed(String),

    #[error("Media playback was rejected: {0}")]
    PlaybackRejected(String),

    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
