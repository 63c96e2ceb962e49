/// Realtime block types
use super::AudioBuffer;

/// Frames per render quantum delivered by the render callback
pub const RENDER_QUANTUM_FRAMES: usize = 128;

/// Result of one `process()` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Keep invoking the node for subsequent blocks
    Continue,
    /// End of stream; the node should be removed from the graph
    Done,
}

/// A short multi-channel chunk of audio passed through the render path
///
/// Storage is planar and allocated once; the render thread reuses the same
/// blocks for every callback. A block with zero channels means "no input".
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    data: Vec<f32>,
    channels: usize,
    frames: usize,
}

impl AudioBlock {
    /// Allocate a silent block of `channels` x `frames`
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            data: vec![0.0; channels * frames],
            channels,
            frames,
        }
    }

    /// A block with no channels (end of input)
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    /// Build a block from planar channel slices (test and setup helper, allocates)
    ///
    /// Channels shorter than the longest one are padded with silence.
    pub fn from_channels(channels: &[&[f32]]) -> Self {
        let frames = channels.iter().map(|c| c.len()).max().unwrap_or(0);
        let mut block = Self::new(channels.len(), frames);
        for (index, samples) in channels.iter().enumerate() {
            block.channel_mut(index)[..samples.len()].copy_from_slice(samples);
        }
        block
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Frames per channel
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Samples of one channel
    ///
    /// # Panics
    /// Panics if `index >= channel_count()`.
    pub fn channel(&self, index: usize) -> &[f32] {
        assert!(index < self.channels, "channel {} out of range", index);
        &self.data[index * self.frames..(index + 1) * self.frames]
    }

    /// Mutable samples of one channel
    ///
    /// # Panics
    /// Panics if `index >= channel_count()`.
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        assert!(index < self.channels, "channel {} out of range", index);
        &mut self.data[index * self.frames..(index + 1) * self.frames]
    }

    /// Zero every sample
    pub fn silence(&mut self) {
        self.data.fill(0.0);
    }

    /// Copy another block's samples into this one
    ///
    /// Channels and frames that do not exist in `other` are silenced.
    pub fn copy_from(&mut self, other: &AudioBlock) {
        let shared_frames = self.frames.min(other.frames);
        for ch in 0..self.channels {
            let out = self.channel_mut(ch);
            if ch < other.channels {
                out[..shared_frames].copy_from_slice(&other.channel(ch)[..shared_frames]);
                out[shared_frames..].fill(0.0);
            } else {
                out.fill(0.0);
            }
        }
    }

    /// Fill the block from a decoded buffer starting at frame `start`
    ///
    /// Returns the number of frames copied; the remainder of the block is
    /// silenced. Buffer channels beyond the block's channel count are ignored.
    pub fn read_from_buffer(&mut self, buffer: &AudioBuffer, start: usize) -> usize {
        let available = buffer.len().saturating_sub(start);
        let count = available.min(self.frames);
        for ch in 0..self.channels {
            let out = self.channel_mut(ch);
            if ch < buffer.channel_count() {
                out[..count].copy_from_slice(&buffer.channel(ch)[start..start + count]);
                out[count..].fill(0.0);
            } else {
                out.fill(0.0);
            }
        }
        count
    }
}
