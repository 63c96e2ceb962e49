//! Error types for loudness analysis

use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur during loudness analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoudnessError {
    /// The buffer holds no samples, so it has no duration to integrate over
    #[error("No audio samples provided for analysis")]
    EmptyBuffer,

    /// A NaN or infinite sample was found in the analyzed channel
    #[error("Non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    /// Analysis frame size must be non-zero
    #[error("Invalid analysis frame size: {0}")]
    InvalidFrameSize(usize),

    /// RMS floor must be finite and strictly positive
    #[error("Invalid RMS floor: {0} (must be finite and > 0)")]
    InvalidRmsFloor(f64),

    /// Target loudness must be finite
    #[error("Invalid target loudness: {0} LUFS")]
    InvalidTarget(f64),
}
