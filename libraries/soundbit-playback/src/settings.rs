//! Normalization settings
//!
//! Loaded from `soundbit.toml` and `SOUNDBIT_*` environment variables.

use crate::error::{PlaybackError, Result};
use crate::graph::RenderOptions;
use serde::{Deserialize, Serialize};
use soundbit_core::RENDER_QUANTUM_FRAMES;
use soundbit_loudness::{LoudnessAnalyzer, ANALYSIS_FRAME_SIZE, RMS_FLOOR, TARGET_LUFS};
use std::path::{Path, PathBuf};

/// Default settings file, looked up in the working directory
pub const SETTINGS_FILE: &str = "soundbit.toml";

/// Environment variable prefix (e.g., `SOUNDBIT_TARGET_LUFS=-16`)
pub const ENV_PREFIX: &str = "SOUNDBIT";

/// Settings for soundbit normalization and playback
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NormalizerSettings {
    /// Normalize soundbits at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Loudness every sound is brought to, in LUFS
    #[serde(default = "default_target_lufs")]
    pub target_lufs: f64,

    /// Analysis frame size in samples
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,

    /// Lowest per-frame RMS used by the analyzer
    #[serde(default = "default_rms_floor")]
    pub rms_floor: f64,

    /// Frames per render quantum
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Pace the render thread at the block cadence (false renders offline)
    #[serde(default = "default_realtime")]
    pub realtime: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_target_lufs() -> f64 {
    TARGET_LUFS
}

fn default_frame_size() -> usize {
    ANALYSIS_FRAME_SIZE
}

fn default_rms_floor() -> f64 {
    RMS_FLOOR
}

fn default_block_size() -> usize {
    RENDER_QUANTUM_FRAMES
}

fn default_realtime() -> bool {
    true
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            target_lufs: default_target_lufs(),
            frame_size: default_frame_size(),
            rms_floor: default_rms_floor(),
            block_size: default_block_size(),
            realtime: default_realtime(),
        }
    }
}

impl NormalizerSettings {
    /// Load settings from `soundbit.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder();

        let path = PathBuf::from(SETTINGS_FILE);
        if path.exists() {
            settings = settings.add_source(config::File::from(path));
        }

        // Override with environment variables (prefixed with SOUNDBIT_)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: Self = settings.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Load settings from a specific file only
    pub fn load_from(path: &Path) -> Result<Self> {
        let loaded: Self = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if !(self.target_lufs.is_finite() && (-70.0..=0.0).contains(&self.target_lufs)) {
            return Err(PlaybackError::InvalidSettings(format!(
                "target_lufs {} must be between -70 and 0",
                self.target_lufs
            )));
        }
        if self.frame_size == 0 {
            return Err(PlaybackError::InvalidSettings(
                "frame_size must be greater than 0".to_string(),
            ));
        }
        if !(self.rms_floor.is_finite() && self.rms_floor > 0.0) {
            return Err(PlaybackError::InvalidSettings(format!(
                "rms_floor {} must be a positive number",
                self.rms_floor
            )));
        }
        if !(1..=8192).contains(&self.block_size) {
            return Err(PlaybackError::InvalidSettings(format!(
                "block_size {} must be between 1 and 8192",
                self.block_size
            )));
        }
        Ok(())
    }

    /// Analyzer configured from these settings
    pub fn analyzer(&self) -> Result<LoudnessAnalyzer> {
        Ok(LoudnessAnalyzer::new(self.frame_size, self.rms_floor)?)
    }

    /// Render thread options
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            block_size: self.block_size,
            realtime: self.realtime,
        }
    }
}
