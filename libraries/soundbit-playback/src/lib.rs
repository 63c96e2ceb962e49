//! Soundbit Playback - Wiring loudness normalization into playing sounds
//!
//! Connects the analyzer and the gain processor from `soundbit-loudness`
//! to an audio host:
//!
//! - [`AudioHost`] / [`Sound`]: what normalization needs from a host
//! - [`ProcessorRegistry`]: registers the processor with the host once
//! - [`Normalizer::normalize_audio`]: analyze, connect, post loudness,
//!   disconnect on end
//! - [`LocalHost`]: in-process host with one render thread per sound
//! - [`Soundboard`]: start/stop soundbits by id
//!
//! # Example
//!
//! ```no_run
//! use soundbit_core::{AudioBuffer, SampleRate};
//! use soundbit_playback::{LocalHost, NormalizerSettings, NullDestination, Soundboard};
//! use std::sync::Arc;
//!
//! # async fn run() -> soundbit_playback::Result<()> {
//! let settings = NormalizerSettings::load()?;
//! let host = Arc::new(LocalHost::from_settings(&settings));
//! let board = Soundboard::new(host, settings)?;
//!
//! let samples = vec![0.1; 48_000];
//! let buffer = Arc::new(AudioBuffer::mono(SampleRate::DVD_QUALITY, samples).unwrap());
//! board.toggle("rain", buffer, Box::new(NullDestination)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod graph;
pub mod host;
pub mod local;
pub mod normalizer;
pub mod registry;
pub mod settings;
pub mod soundboard;

pub use error::{PlaybackError, Result};
pub use graph::{CaptureDestination, Destination, NullDestination, RenderOptions};
pub use host::{AudioHost, EndCallback, NodeConnection, NodeId, Sound};
pub use local::{LocalHost, PlayingSound};
pub use normalizer::{NormalizedSound, Normalizer};
pub use registry::ProcessorRegistry;
pub use settings::NormalizerSettings;
pub use soundboard::{Soundboard, ToggleOutcome};
