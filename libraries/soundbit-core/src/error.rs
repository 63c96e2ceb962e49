/// Core error types for soundbit
use thiserror::Error;

/// Result type alias using `SoundbitError`
pub type Result<T> = std::result::Result<T, SoundbitError>;

/// Core error type for soundbit
#[derive(Error, Debug)]
pub enum SoundbitError {
    /// Audio buffer construction errors
    #[error("Invalid audio buffer: {0}")]
    InvalidBuffer(String),
}

impl SoundbitError {
    /// Create an invalid buffer error
    pub fn invalid_buffer(msg: impl Into<String>) -> Self {
        Self::InvalidBuffer(msg.into())
    }
}
