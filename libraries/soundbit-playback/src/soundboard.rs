//! Soundbit sessions
//!
//! Triggering a soundbit toggles it: a playing soundbit is stopped, an idle
//! one starts with a fresh normalization processor.

use crate::error::Result;
use crate::graph::Destination;
use crate::host::Sound;
use crate::local::{LocalHost, PlayingSound};
use crate::normalizer::Normalizer;
use crate::settings::NormalizerSettings;
use soundbit_core::AudioBuffer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type PlayingMap = Arc<Mutex<HashMap<String, Arc<PlayingSound>>>>;

fn lock(playing: &PlayingMap) -> MutexGuard<'_, HashMap<String, Arc<PlayingSound>>> {
    playing.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of [`Soundboard::toggle`]
#[derive(Debug)]
pub enum ToggleOutcome {
    /// A new playback session started
    Started(Arc<PlayingSound>),
    /// The running session was stopped
    Stopped,
}

/// Tracks playing soundbits by id
#[derive(Debug)]
pub struct Soundboard {
    host: Arc<LocalHost>,
    normalizer: Normalizer,
    settings: NormalizerSettings,
    playing: PlayingMap,
}

impl Soundboard {
    /// Create a soundboard playing through `host`
    pub fn new(host: Arc<LocalHost>, settings: NormalizerSettings) -> Result<Self> {
        let normalizer = Normalizer::with_settings(host.clone(), &settings)?;
        Ok(Self {
            host,
            normalizer,
            settings,
            playing: Arc::default(),
        })
    }

    /// The normalizer applied to started soundbits
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Stop soundbit `id` if it is playing, otherwise start it
    ///
    /// A failed normalization is logged and the soundbit plays at its
    /// original level.
    pub async fn toggle(
        &self,
        id: &str,
        buffer: Arc<AudioBuffer>,
        destination: Box<dyn Destination>,
    ) -> Result<ToggleOutcome> {
        let running = lock(&self.playing).remove(id);
        if let Some(sound) = running {
            sound.stop();
            tracing::info!("Stopped soundbit '{}'", id);
            return Ok(ToggleOutcome::Stopped);
        }

        let sound = self.host.load(id, buffer, destination)?;

        if self.settings.enabled {
            if let Err(e) = self.normalizer.normalize_audio(&*sound).await {
                tracing::warn!("Playing '{}' without normalization: {}", id, e);
            }
        }

        let playing = self.playing.clone();
        let key = id.to_string();
        let session = sound.session();
        sound.on_end(Box::new(move || {
            let mut playing = lock(&playing);
            if playing.get(&key).is_some_and(|s| s.session() == session) {
                playing.remove(&key);
            }
        }));

        lock(&self.playing).insert(id.to_string(), sound.clone());
        if let Err(e) = sound.play() {
            lock(&self.playing).remove(id);
            return Err(e);
        }
        tracing::info!("Started soundbit '{}'", id);

        Ok(ToggleOutcome::Started(sound))
    }

    /// Whether soundbit `id` is playing
    pub fn is_playing(&self, id: &str) -> bool {
        lock(&self.playing).contains_key(id)
    }

    /// Number of soundbits playing
    pub fn playing_count(&self) -> usize {
        lock(&self.playing).len()
    }

    /// Stop every playing soundbit
    pub fn stop_all(&self) {
        let sounds: Vec<_> = lock(&self.playing).drain().map(|(_, s)| s).collect();
        for sound in sounds {
            sound.stop();
        }
    }
}
