/// Audio-related types
use crate::error::{Result, SoundbitError};
use serde::{Deserialize, Serialize};

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Common sample rates
    pub const CD_QUALITY: Self = Self(44_100);
    pub const DVD_QUALITY: Self = Self(48_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }
}

/// Fully decoded audio, one sample array per channel
///
/// Samples are stored as f32 in the range [-1.0, 1.0].
/// Planar format: `channels[c][frame]`. Every channel has the same length.
///
/// The buffer is immutable once built; playback owns it and the loudness
/// analyzer only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: SampleRate,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Create a new audio buffer from planar channel data
    ///
    /// # Errors
    /// Returns an error if the sample rate is zero, there are no channels,
    /// or the channels differ in length.
    pub fn new(sample_rate: SampleRate, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate.as_hz() == 0 {
            return Err(SoundbitError::invalid_buffer("sample rate must be non-zero"));
        }
        let Some(first) = channels.first() else {
            return Err(SoundbitError::invalid_buffer("buffer has no channels"));
        };
        let len = first.len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != len)
        {
            return Err(SoundbitError::invalid_buffer(format!(
                "channel {} has {} samples, expected {}",
                index,
                channel.len(),
                len
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Create a single-channel buffer
    pub fn mono(sample_rate: SampleRate, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Get the number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Get the samples of one channel
    ///
    /// # Panics
    /// Panics if `index >= channel_count()`.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Get the length in samples per channel (frames)
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Check if the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds (length / sample rate)
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / f64::from(self.sample_rate.as_hz())
    }
}
