//! Error types for the intro controller

use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or driving the intro
///
/// Native media problems observed during playback are not reported through
/// this type; they become lifecycle transitions and `on_video_error`
/// notifications instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The media element refused an operation
    #[error("Media element error: {0}")]
    MediaError(String),

    /// Operation not valid in the current controller state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
