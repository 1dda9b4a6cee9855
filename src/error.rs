use thiserror::Error;

/// Failures that can leave the library. Navigation rejections are not
/// errors and live in [`crate::gesture::NavRejection`].
#[derive(Debug, Error)]
pub enum KioskError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("video on node {node} failed to play: {reason}")]
    Playback { node: usize, reason: String },

    #[error("audio playback failed: {0}")]
    Audio(String),

    #[error("could not initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, KioskError>;
