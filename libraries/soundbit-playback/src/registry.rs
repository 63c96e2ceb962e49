//! One-time processor registration

use crate::error::{PlaybackError, Result};
use crate::host::AudioHost;
use soundbit_loudness::PROCESSOR_NAME;
use tokio::sync::OnceCell;

/// Guards the host's processor registration
///
/// Each [`AudioHost`] owns one, so every normalizer on that host shares it.
/// Concurrent and repeated calls register at most once. A failed attempt
/// is not remembered, so a later normalization may try again; nothing is
/// retried within a single call.
#[derive(Debug)]
pub struct ProcessorRegistry {
    name: &'static str,
    registered: OnceCell<()>,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new(PROCESSOR_NAME)
    }
}

impl ProcessorRegistry {
    /// Create a guard for the processor registered under `name`
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            registered: OnceCell::new(),
        }
    }

    /// Processor name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether registration has succeeded
    pub fn is_registered(&self) -> bool {
        self.registered.initialized()
    }

    /// Register with `host` unless already done
    pub async fn ensure_registered(&self, host: &dyn AudioHost) -> Result<()> {
        self.registered
            .get_or_try_init(|| async {
                if !host.is_available() {
                    return Err(PlaybackError::HostUnavailable);
                }
                host.register_processor(self.name).await?;
                tracing::info!("Registered audio processor '{}'", self.name);
                Ok(())
            })
            .await
            .map(|_| ())
    }
}
