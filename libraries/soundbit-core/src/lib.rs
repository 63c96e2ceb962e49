//! Soundbit Core
//!
//! Platform-agnostic audio types, traits, and error handling shared by the
//! soundbit crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Audio Types**: `SampleRate`, `AudioBuffer` (decoded, planar), `AudioBlock`
//!   (fixed-size realtime chunk)
//! - **Core Traits**: `AudioNode`, the unit of work invoked by the realtime
//!   render callback
//! - **Error Handling**: Unified `SoundbitError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use soundbit_core::{AudioBuffer, AudioBlock, SampleRate};
//!
//! // One second of stereo silence
//! let buffer = AudioBuffer::new(SampleRate::DVD_QUALITY, vec![vec![0.0; 48_000]; 2]).unwrap();
//! assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
//!
//! // A reusable 128-frame stereo block for the render callback
//! let block = AudioBlock::new(2, 128);
//! assert_eq!(block.frames(), 128);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SoundbitError};
pub use traits::{AudioNode, NodeInfo};
pub use types::{AudioBlock, AudioBuffer, ProcessStatus, SampleRate, RENDER_QUANTUM_FRAMES};
