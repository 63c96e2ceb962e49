//! Per-sound loudness normalization
//!
//! ```text
//! Sound source -> [LoudnessNormalizationProcessor] -> output
//!                          ^
//!                          | LoudnessPort::post(measured)
//!                     Normalizer (control side)
//! ```

use crate::error::Result;
use crate::host::{AudioHost, NodeConnection, Sound};
use crate::registry::ProcessorRegistry;
use crate::settings::NormalizerSettings;
use soundbit_loudness::{
    LoudnessAnalyzer, LoudnessNormalizationProcessor, LoudnessPort, LoudnessReport, TARGET_LUFS,
};
use std::sync::Arc;

/// Wires a loudness normalization processor into sounds
pub struct Normalizer {
    host: Arc<dyn AudioHost>,
    analyzer: LoudnessAnalyzer,
    target_lufs: f64,
}

impl Normalizer {
    /// Normalizer with default analysis settings and a -14 LUFS target
    pub fn new(host: Arc<dyn AudioHost>) -> Self {
        Self {
            host,
            analyzer: LoudnessAnalyzer::default(),
            target_lufs: TARGET_LUFS,
        }
    }

    /// Normalizer configured from settings
    pub fn with_settings(host: Arc<dyn AudioHost>, settings: &NormalizerSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            host,
            analyzer: settings.analyzer()?,
            target_lufs: settings.target_lufs,
        })
    }

    /// Loudness every sound is brought to
    pub fn target_lufs(&self) -> f64 {
        self.target_lufs
    }

    /// The host's registration guard
    pub fn registry(&self) -> &ProcessorRegistry {
        self.host.processor_registry()
    }

    /// Normalize a playing sound
    ///
    /// Registers the processor with the host (once per host, however many
    /// normalizers share it), measures the sound's buffer, inserts a fresh
    /// processor between the source and the output and posts the measured
    /// loudness to it. The processor is disconnected when the sound ends.
    ///
    /// # Errors
    /// Registration, analysis and connection failures are returned as-is.
    /// The sound keeps playing without normalization in that case.
    pub async fn normalize_audio(&self, sound: &dyn Sound) -> Result<NormalizedSound> {
        self.registry().ensure_registered(self.host.as_ref()).await?;

        let report = self.analyzer.analyze(&sound.buffer())?;
        tracing::debug!("Sound '{}': {}", sound.id(), report);

        let processor = LoudnessNormalizationProcessor::with_target(self.target_lufs)?;
        let port = processor.port();
        let connection = sound.connect_node(Box::new(processor))?;

        port.post(report.integrated_lufs);

        let on_end = connection.clone();
        sound.on_end(Box::new(move || on_end.disconnect()));

        tracing::info!(
            "Normalizing '{}' from {:.1} LUFS to {:.1} LUFS",
            sound.id(),
            report.integrated_lufs,
            self.target_lufs
        );

        Ok(NormalizedSound {
            port,
            connection,
            report,
        })
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("registry", self.registry())
            .field("analyzer", &self.analyzer)
            .field("target_lufs", &self.target_lufs)
            .finish_non_exhaustive()
    }
}

/// A sound with a normalization processor attached
#[derive(Debug, Clone)]
pub struct NormalizedSound {
    port: LoudnessPort,
    connection: NodeConnection,
    report: LoudnessReport,
}

impl NormalizedSound {
    /// Loudness measured for the sound
    pub fn report(&self) -> &LoudnessReport {
        &self.report
    }

    /// Gain the processor applies once it has picked up the measurement
    pub fn gain(&self) -> f64 {
        soundbit_loudness::gain_for_loudness(self.port.target_lufs(), self.report.integrated_lufs)
    }

    /// Port to re-post a loudness to the processor
    pub fn port(&self) -> &LoudnessPort {
        &self.port
    }

    /// The processor's place in the graph
    pub fn connection(&self) -> &NodeConnection {
        &self.connection
    }

    /// Remove the processor before the sound ends
    pub fn disconnect(&self) {
        self.connection.disconnect();
    }
}
