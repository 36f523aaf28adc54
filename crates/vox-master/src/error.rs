//! Error types for the facade.

use vox_core::SinkError;
use vox_decode::DecodeError;

/// Error type for play requests.
#[derive(Debug)]
pub enum PlayError {
    /// Every voice is busy; the request was dropped, nothing changed
    NoFreeVoice,
    /// Payload decodes to a channel/sample combination the engine rejects
    UnsupportedFormat,
    /// Payload could not be decoded at all
    Decode(DecodeError),
    /// The output sink refused the operation
    Sink(SinkError),
}

impl std::fmt::Display for PlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayError::NoFreeVoice => write!(f, "No free voice available"),
            PlayError::UnsupportedFormat => write!(f, "Unsupported payload format"),
            PlayError::Decode(e) => write!(f, "Decode error: {}", e),
            PlayError::Sink(e) => write!(f, "Sink error: {}", e),
        }
    }
}

impl std::error::Error for PlayError {}

impl From<DecodeError> for PlayError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat => PlayError::UnsupportedFormat,
            other => PlayError::Decode(other),
        }
    }
}

impl From<SinkError> for PlayError {
    fn from(err: SinkError) -> Self {
        PlayError::Sink(err)
    }
}

/// Error type for manager construction.
#[derive(Debug)]
pub enum InitError {
    /// Voice count outside 1..=MAX_VOICES
    InvalidVoiceCount(usize),
    /// The output device could not be opened
    Sink(SinkError),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::InvalidVoiceCount(n) => write!(f, "Invalid voice count: {}", n),
            InitError::Sink(e) => write!(f, "Sink error: {}", e),
        }
    }
}

impl std::error::Error for InitError {}
