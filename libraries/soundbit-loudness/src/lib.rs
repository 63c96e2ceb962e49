//! Loudness normalization for soundbits
//!
//! This crate provides:
//! - A windowed RMS/dBFS loudness estimator approximating integrated LUFS
//! - A realtime gain processor that brings playback to a fixed target loudness
//! - A lock-free single-slot mailbox carrying the measured loudness from the
//!   control thread to the render thread
//!
//! # Architecture
//!
//! ```text
//! Control thread:
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ AudioBuffer │ ──► │  Analyzer    │ ──► │ LoudnessPort  │ ── post(lufs)
//! └─────────────┘     └──────────────┘     └───────────────┘        │
//!                                                                   ▼
//! Render thread:                                          ┌──────────────────┐
//! ┌─────────────┐     ┌──────────────────────────┐        │ LoudnessMailbox  │
//! │ AudioBlock  │ ──► │ LoudnessNormalization-   │ ◄───── │ (AtomicU64 slot) │
//! └─────────────┘     │ Processor::process()     │        └──────────────────┘
//!                     └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use soundbit_core::{AudioBlock, AudioBuffer, AudioNode, SampleRate};
//! use soundbit_loudness::{estimate_loudness, LoudnessNode, LoudnessNormalizationProcessor};
//!
//! let samples: Vec<f32> = (0..48_000)
//!     .map(|i| 0.1 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48_000.0).sin())
//!     .collect();
//! let buffer = AudioBuffer::mono(SampleRate::DVD_QUALITY, samples).unwrap();
//!
//! let lufs = estimate_loudness(&buffer).unwrap();
//!
//! let mut processor = LoudnessNormalizationProcessor::new();
//! processor.set_target_loudness(lufs);
//!
//! let input = AudioBlock::from_channels(&[&buffer.channel(0)[..128]]);
//! let mut output = AudioBlock::new(1, 128);
//! processor.process(&input, &mut output);
//! ```

#![forbid(unsafe_code)]

mod analyzer;
mod error;
mod gain;
mod mailbox;
mod processor;

pub use analyzer::{estimate_loudness, LoudnessAnalyzer, LoudnessReport};
pub use error::{LoudnessError, Result};
pub use gain::{db_to_linear, gain_for_loudness};
pub use mailbox::{LoudnessMailbox, LoudnessPort};
pub use processor::{GainState, LoudnessNode, LoudnessNormalizationProcessor};

/// Playback target loudness (-14 LUFS, common for streaming platforms)
pub const TARGET_LUFS: f64 = -14.0;

/// Samples per analysis frame
pub const ANALYSIS_FRAME_SIZE: usize = 4096;

/// Lowest frame RMS used by the analyzer (-120 dBFS)
///
/// Silent frames are clamped to this value so loudness and gain stay finite.
pub const RMS_FLOOR: f64 = 1e-6;

/// Name under which the gain processor is registered with the audio host
pub const PROCESSOR_NAME: &str = "loudness-normalizer";
