//! Playback and normalization wiring errors

use soundbit_loudness::LoudnessError;
use thiserror::Error;

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No audio context to attach processors to
    #[error("Audio host is not available")]
    HostUnavailable,

    /// Loading the processor module failed
    #[error("Failed to register processor '{name}': {reason}")]
    Registration { name: String, reason: String },

    /// A node was connected before its processor was registered
    #[error("Processor not registered: {0}")]
    ProcessorNotRegistered(String),

    /// Loudness analysis failed
    #[error("Loudness analysis failed: {0}")]
    Loudness(#[from] LoudnessError),

    /// The sound already finished playing
    #[error("Sound has already ended: {0}")]
    SoundEnded(String),

    /// Render thread could not be started or joined
    #[error("Render thread error: {0}")]
    RenderThread(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration loaded but out of range
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl PlaybackError {
    /// Create a registration error
    pub fn registration(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Registration {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        PlaybackError::Config(err.to_string())
    }
}
