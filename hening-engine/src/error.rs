//! Error types for hening-engine
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Nothing here crosses the session control surface: the session actor logs and
//! drops failures so the host only ever observes silence, never an error.

use thiserror::Error;

/// Main error type for hening-engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Playback command errors (released or invalid voice)
    #[error("Playback error: {0}")]
    Playback(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rejected timer transition
    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] crate::session::TransitionError),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<hening_common::Error> for Error {
    fn from(err: hening_common::Error) -> Self {
        match err {
            hening_common::Error::Io(e) => Error::Io(e),
            hening_common::Error::NotFound(msg) => Error::NotFound(msg),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Convenience Result type using hening-engine Error
pub type Result<T> = std::result::Result<T, Error>;
