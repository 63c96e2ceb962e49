//! In-process audio host
//!
//! `LocalHost` plays decoded buffers through a [`RenderGraph`] on a render
//! thread of their own, one per sound.

use crate::error::{PlaybackError, Result};
use crate::graph::{spawn_render_thread, Destination, GraphCommand, RenderGraph, RenderOptions};
use crate::host::{AudioHost, EndCallback, NodeConnection, Sound};
use crate::registry::ProcessorRegistry;
use crate::settings::NormalizerSettings;
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Sender};
use soundbit_core::{AudioBuffer, AudioNode};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Processor names the host knows how to instantiate
#[derive(Debug, Default)]
struct Registrations {
    names: Mutex<HashSet<String>>,
}

impl Registrations {
    fn insert(&self, name: &str) {
        lock(&self.names).insert(name.to_string());
    }

    fn contains(&self, name: &str) -> bool {
        lock(&self.names).contains(name)
    }
}

/// Fires end listeners exactly once
#[derive(Default)]
struct EndSignal {
    state: Mutex<EndState>,
}

#[derive(Default)]
struct EndState {
    ended: bool,
    listeners: Vec<EndCallback>,
}

impl EndSignal {
    fn subscribe(&self, callback: EndCallback) {
        let mut state = lock(&self.state);
        if state.ended {
            drop(state);
            callback();
        } else {
            state.listeners.push(callback);
        }
    }

    fn fire(&self) {
        let listeners = {
            let mut state = lock(&self.state);
            if state.ended {
                return;
            }
            state.ended = true;
            std::mem::take(&mut state.listeners)
        };
        for listener in listeners {
            listener();
        }
    }

    fn has_fired(&self) -> bool {
        lock(&self.state).ended
    }
}

/// Audio host that renders sounds in-process
#[derive(Debug)]
pub struct LocalHost {
    available: bool,
    options: RenderOptions,
    registrations: Arc<Registrations>,
    registration_calls: AtomicUsize,
    registry: ProcessorRegistry,
    next_session: AtomicU64,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl LocalHost {
    /// Create a host rendering with `options`
    pub fn new(options: RenderOptions) -> Self {
        Self {
            available: true,
            options,
            registrations: Arc::default(),
            registration_calls: AtomicUsize::new(0),
            registry: ProcessorRegistry::default(),
            next_session: AtomicU64::new(1),
        }
    }

    /// Create a host rendering with the block size and pacing from settings
    pub fn from_settings(settings: &NormalizerSettings) -> Self {
        Self::new(settings.render_options())
    }

    /// A host without an audio context (every operation fails)
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    /// Render options used for new sounds
    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// How many times `register_processor` actually ran
    pub fn registration_calls(&self) -> usize {
        self.registration_calls.load(Ordering::SeqCst)
    }

    /// Whether a processor name has been registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.registrations.contains(name)
    }

    /// Prepare a sound for playback; call [`PlayingSound::play`] to start it
    pub fn load(
        &self,
        id: impl Into<String>,
        buffer: Arc<AudioBuffer>,
        destination: Box<dyn Destination>,
    ) -> Result<Arc<PlayingSound>> {
        if !self.available {
            return Err(PlaybackError::HostUnavailable);
        }

        let (commands, receiver) = unbounded();
        let graph = RenderGraph::new(
            buffer.clone(),
            self.options.block_size,
            receiver,
            destination,
        );
        let session = self.next_session.fetch_add(1, Ordering::Relaxed);

        Ok(Arc::new(PlayingSound {
            id: id.into(),
            session,
            buffer,
            options: self.options,
            commands,
            registrations: self.registrations.clone(),
            next_node_id: AtomicU64::new(1),
            pending_graph: Mutex::new(Some(graph)),
            render_thread: Mutex::new(None),
            stop: Arc::new(AtomicBool::new(false)),
            end: Arc::new(EndSignal::default()),
        }))
    }
}

#[async_trait]
impl AudioHost for LocalHost {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn register_processor(&self, name: &'static str) -> Result<()> {
        if !self.available {
            return Err(PlaybackError::HostUnavailable);
        }
        self.registration_calls.fetch_add(1, Ordering::SeqCst);
        self.registrations.insert(name);
        Ok(())
    }

    fn processor_registry(&self) -> &ProcessorRegistry {
        &self.registry
    }
}

/// A sound loaded on a [`LocalHost`]
pub struct PlayingSound {
    id: String,
    session: u64,
    buffer: Arc<AudioBuffer>,
    options: RenderOptions,
    commands: Sender<GraphCommand>,
    registrations: Arc<Registrations>,
    next_node_id: AtomicU64,
    pending_graph: Mutex<Option<RenderGraph>>,
    render_thread: Mutex<Option<JoinHandle<()>>>,
    stop: Arc<AtomicBool>,
    end: Arc<EndSignal>,
}

impl PlayingSound {
    /// Host-unique playback session number
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Start the render thread (no-op if already started)
    ///
    /// If the thread cannot be spawned the sound ends right away, so end
    /// listeners still run.
    pub fn play(&self) -> Result<()> {
        self.play_with(|name, graph, options, stop, on_exit| {
            spawn_render_thread(name, graph, options, stop, on_exit)
        })
    }

    fn play_with<F>(&self, spawn: F) -> Result<()>
    where
        F: FnOnce(
            &str,
            RenderGraph,
            RenderOptions,
            Arc<AtomicBool>,
            EndCallback,
        ) -> std::io::Result<JoinHandle<()>>,
    {
        let Some(graph) = lock(&self.pending_graph).take() else {
            return Ok(());
        };

        let end = self.end.clone();
        let on_exit: EndCallback = Box::new(move || end.fire());
        let handle = match spawn(&self.id, graph, self.options, self.stop.clone(), on_exit) {
            Ok(handle) => handle,
            Err(e) => {
                self.end.fire();
                return Err(PlaybackError::RenderThread(e.to_string()));
            }
        };

        *lock(&self.render_thread) = Some(handle);
        tracing::debug!("Started playback of '{}' (session {})", self.id, self.session);
        Ok(())
    }

    /// Stop playback; end listeners run once the render thread exits
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        if lock(&self.pending_graph).take().is_some() {
            // Never started, so no render thread will fire the signal
            self.end.fire();
        }
        tracing::debug!("Stopped playback of '{}' (session {})", self.id, self.session);
    }

    /// Block until the render thread has exited
    pub fn wait(&self) -> Result<()> {
        let handle = lock(&self.render_thread).take();
        if let Some(handle) = handle {
            handle.join().map_err(|_| {
                PlaybackError::RenderThread(format!("render thread for '{}' panicked", self.id))
            })?;
        }
        Ok(())
    }

    /// Whether the sound has been started and has not ended yet
    pub fn is_playing(&self) -> bool {
        lock(&self.pending_graph).is_none() && !self.end.has_fired()
    }

    /// Whether playback has ended
    pub fn has_ended(&self) -> bool {
        self.end.has_fired()
    }
}

impl Sound for PlayingSound {
    fn id(&self) -> &str {
        &self.id
    }

    fn buffer(&self) -> Arc<AudioBuffer> {
        self.buffer.clone()
    }

    fn connect_node(&self, node: Box<dyn AudioNode>) -> Result<NodeConnection> {
        let name = node.info().name;
        if !self.registrations.contains(name) {
            return Err(PlaybackError::ProcessorNotRegistered(name.to_string()));
        }
        if self.end.has_fired() {
            return Err(PlaybackError::SoundEnded(self.id.clone()));
        }

        let id = self.next_node_id.fetch_add(1, Ordering::Relaxed);
        self.commands
            .send(GraphCommand::Insert { id, node })
            .map_err(|_| PlaybackError::SoundEnded(self.id.clone()))?;

        let commands = self.commands.clone();
        Ok(NodeConnection::new(id, move |node_id| {
            // The graph may already be gone; nothing left to remove then
            let _ = commands.send(GraphCommand::Remove(node_id));
        }))
    }

    fn on_end(&self, callback: EndCallback) {
        self.end.subscribe(callback);
    }
}

impl std::fmt::Debug for PlayingSound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayingSound")
            .field("id", &self.id)
            .field("session", &self.session)
            .field("frames", &self.buffer.len())
            .field("ended", &self.has_ended())
            .finish()
    }
}
