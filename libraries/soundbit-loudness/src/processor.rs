//! Realtime loudness normalization processor
//!
//! Runs inside the render thread. Until a measured loudness arrives through
//! its mailbox, audio passes through unchanged; afterwards every sample is
//! scaled by `10 ^ ((target - measured) / 20)`.

use crate::error::{LoudnessError, Result};
use crate::gain::gain_for_loudness;
use crate::mailbox::LoudnessPort;
use crate::{PROCESSOR_NAME, TARGET_LUFS};
use soundbit_core::{AudioBlock, AudioNode, NodeInfo, ProcessStatus};

/// Gain state of one processor instance
///
/// Moves from `Unset` to `Gained` once; never back within a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainState {
    /// No loudness received yet (identity)
    Unset,
    /// Loudness received and gain derived
    Gained {
        /// Measured loudness in LUFS
        measured_lufs: f64,
        /// Linear gain applied to every sample
        gain: f64,
    },
}

/// A realtime node that can be told the loudness of the sound it carries
pub trait LoudnessNode: AudioNode {
    /// Hand the measured loudness (LUFS) to the node
    ///
    /// Called from the control thread. Overwrites any value the render
    /// thread has not consumed yet.
    fn set_target_loudness(&self, measured_lufs: f64);
}

/// Loudness normalization processor
///
/// One instance per playback session. The control thread keeps a
/// [`LoudnessPort`] (see [`port`](Self::port)) while the processor itself
/// moves onto the render thread.
///
/// # Example
///
/// ```rust
/// use soundbit_core::{AudioBlock, AudioNode, ProcessStatus};
/// use soundbit_loudness::{LoudnessNormalizationProcessor, LoudnessNode};
///
/// let mut processor = LoudnessNormalizationProcessor::new();
/// processor.set_target_loudness(-20.0); // 6 dB too quiet
///
/// let input = AudioBlock::from_channels(&[&[0.25, -0.25]]);
/// let mut output = AudioBlock::new(1, 2);
/// assert_eq!(processor.process(&input, &mut output), ProcessStatus::Continue);
/// assert!((output.channel(0)[0] - 0.4988).abs() < 1e-3);
/// ```
#[derive(Debug)]
pub struct LoudnessNormalizationProcessor {
    port: LoudnessPort,
    /// Bits of the last mailbox value folded into `state`
    observed_bits: Option<u64>,
    state: GainState,
    blocks_processed: u64,
}

impl Default for LoudnessNormalizationProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl LoudnessNormalizationProcessor {
    /// Create a processor normalizing to [`TARGET_LUFS`]
    pub fn new() -> Self {
        Self::from_port(LoudnessPort::new(TARGET_LUFS))
    }

    /// Create a processor normalizing to a custom target
    ///
    /// # Errors
    /// Returns error if the target is not finite.
    pub fn with_target(target_lufs: f64) -> Result<Self> {
        if !target_lufs.is_finite() {
            return Err(LoudnessError::InvalidTarget(target_lufs));
        }
        Ok(Self::from_port(LoudnessPort::new(target_lufs)))
    }

    fn from_port(port: LoudnessPort) -> Self {
        Self {
            port,
            observed_bits: None,
            state: GainState::Unset,
            blocks_processed: 0,
        }
    }

    /// Control-side handle feeding this processor's mailbox
    pub fn port(&self) -> LoudnessPort {
        self.port.clone()
    }

    /// Target loudness in LUFS
    pub fn target_lufs(&self) -> f64 {
        self.port.target_lufs()
    }

    /// Current gain state, as of the last processed block
    pub fn state(&self) -> GainState {
        self.state
    }

    /// Linear gain currently applied (1.0 while unset)
    pub fn current_gain(&self) -> f64 {
        match self.state {
            GainState::Unset => 1.0,
            GainState::Gained { gain, .. } => gain,
        }
    }

    /// Number of `process()` calls so far
    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed
    }

    /// Fold the latest mailbox value into the gain state
    #[inline]
    fn poll_mailbox(&mut self) {
        let Some(bits) = self.port.mailbox().latest_bits() else {
            return;
        };
        if self.observed_bits == Some(bits) {
            return;
        }

        let measured_lufs = f64::from_bits(bits);
        self.state = GainState::Gained {
            measured_lufs,
            gain: gain_for_loudness(self.port.target_lufs(), measured_lufs),
        };
        self.observed_bits = Some(bits);
    }
}

impl AudioNode for LoudnessNormalizationProcessor {
    fn process(&mut self, input: &AudioBlock, output: &mut AudioBlock) -> ProcessStatus {
        self.blocks_processed += 1;
        self.poll_mailbox();

        if input.channel_count() == 0 {
            output.silence();
            return ProcessStatus::Done;
        }

        match self.state {
            GainState::Unset => output.copy_from(input),
            GainState::Gained { gain, .. } => {
                let frames = input.frames().min(output.frames());
                for ch in 0..output.channel_count() {
                    let out = output.channel_mut(ch);
                    if ch < input.channel_count() {
                        for (o, &i) in out[..frames].iter_mut().zip(&input.channel(ch)[..frames]) {
                            *o = (f64::from(i) * gain) as f32;
                        }
                        out[frames..].fill(0.0);
                    } else {
                        // No input channel to map from
                        out.fill(0.0);
                    }
                }
            }
        }

        ProcessStatus::Continue
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            name: PROCESSOR_NAME,
            display_name: "Loudness Normalizer",
        }
    }
}

impl LoudnessNode for LoudnessNormalizationProcessor {
    fn set_target_loudness(&self, measured_lufs: f64) {
        self.port.post(measured_lufs);
    }
}
