//! Integrated loudness estimation
//!
//! A lightweight approximation of integrated loudness (LUFS) for decoded
//! buffers. It measures the first channel only:
//! - Splits samples into fixed-size frames (the last, shorter frame is kept)
//! - Computes each frame's RMS and converts it to dBFS
//! - Averages the per-frame dBFS values
//! - Applies a fixed calibration for the ITU-R BS.1770 offset and duration
//!
//! There is no K-weighting filter and no gating of quiet passages; the
//! result is a heuristic, good enough to level short ambient sounds.

use crate::error::{LoudnessError, Result};
use crate::{ANALYSIS_FRAME_SIZE, RMS_FLOOR};
use soundbit_core::AudioBuffer;
use std::fmt;

/// BS.1770 K-weighting offset in dB
const K_WEIGHTING_OFFSET_DB: f64 = -0.691;

/// Empirical correction from mean frame dBFS to perceived loudness
const INTEGRATION_OFFSET_DB: f64 = -14.0;

/// Full result of a loudness analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessReport {
    /// Estimated integrated loudness in LUFS (more negative = quieter)
    pub integrated_lufs: f64,

    /// Arithmetic mean of the per-frame dBFS values
    pub mean_dbfs: f64,

    /// Number of frames measured, including a trailing partial frame
    pub frame_count: usize,

    /// Duration of the analyzed audio in seconds
    pub duration_secs: f64,
}

impl fmt::Display for LoudnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loudness: {:.1} LUFS, Mean: {:.1} dBFS over {} frames ({:.2}s)",
            self.integrated_lufs, self.mean_dbfs, self.frame_count, self.duration_secs
        )
    }
}

/// Windowed RMS loudness analyzer
///
/// Stateless apart from its settings; one analyzer can measure any number of
/// buffers, from any thread.
///
/// # Example
///
/// ```rust
/// use soundbit_core::{AudioBuffer, SampleRate};
/// use soundbit_loudness::LoudnessAnalyzer;
///
/// let buffer = AudioBuffer::mono(SampleRate::CD_QUALITY, vec![0.25; 44_100]).unwrap();
/// let report = LoudnessAnalyzer::default().analyze(&buffer).unwrap();
/// println!("{}", report);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessAnalyzer {
    frame_size: usize,
    rms_floor: f64,
}

impl Default for LoudnessAnalyzer {
    fn default() -> Self {
        Self {
            frame_size: ANALYSIS_FRAME_SIZE,
            rms_floor: RMS_FLOOR,
        }
    }
}

impl LoudnessAnalyzer {
    /// Create an analyzer with custom frame size and RMS floor
    ///
    /// # Errors
    /// Returns error if the frame size is zero or the floor is not a positive
    /// finite number.
    pub fn new(frame_size: usize, rms_floor: f64) -> Result<Self> {
        if frame_size == 0 {
            return Err(LoudnessError::InvalidFrameSize(frame_size));
        }
        if !(rms_floor.is_finite() && rms_floor > 0.0) {
            return Err(LoudnessError::InvalidRmsFloor(rms_floor));
        }

        Ok(Self {
            frame_size,
            rms_floor,
        })
    }

    /// Samples per analysis frame
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Lowest RMS value a frame can contribute
    pub fn rms_floor(&self) -> f64 {
        self.rms_floor
    }

    /// Measure a decoded buffer
    ///
    /// # Errors
    /// Returns [`LoudnessError::EmptyBuffer`] for a buffer without samples and
    /// [`LoudnessError::NonFiniteSample`] if the first channel holds NaN or
    /// infinite values.
    pub fn analyze(&self, buffer: &AudioBuffer) -> Result<LoudnessReport> {
        if buffer.is_empty() {
            return Err(LoudnessError::EmptyBuffer);
        }

        let samples = buffer.channel(0);
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(LoudnessError::NonFiniteSample { index });
        }

        let mut dbfs_sum = 0.0_f64;
        let mut frame_count = 0_usize;
        for frame in samples.chunks(self.frame_size) {
            let sum_squares: f64 = frame
                .iter()
                .map(|&s| {
                    let s = f64::from(s);
                    s * s
                })
                .sum();
            let rms = (sum_squares / frame.len() as f64).sqrt().max(self.rms_floor);
            dbfs_sum += 20.0 * rms.log10();
            frame_count += 1;
        }

        let mean_dbfs = dbfs_sum / frame_count as f64;
        let duration_secs = buffer.duration_secs();
        let integrated_lufs = K_WEIGHTING_OFFSET_DB + mean_dbfs - 10.0 * duration_secs.log10()
            + INTEGRATION_OFFSET_DB;

        Ok(LoudnessReport {
            integrated_lufs,
            mean_dbfs,
            frame_count,
            duration_secs,
        })
    }
}

/// Estimate integrated loudness in LUFS with the default analyzer settings
pub fn estimate_loudness(buffer: &AudioBuffer) -> Result<f64> {
    LoudnessAnalyzer::default()
        .analyze(buffer)
        .map(|report| report.integrated_lufs)
}
