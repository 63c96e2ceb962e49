//! In-process render graph
//!
//! `source -> [node]* -> destination`, driven one block at a time by a
//! dedicated render thread. The control thread talks to the graph only
//! through a command channel that the render thread drains with
//! `try_recv` at every block boundary.

use crate::host::NodeId;
use crossbeam_channel::Receiver;
use soundbit_core::{AudioBlock, AudioBuffer, AudioNode, ProcessStatus, RENDER_QUANTUM_FRAMES};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Nodes a graph holds without reallocating
const NODE_CAPACITY: usize = 8;

/// Render thread options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Frames per block
    pub block_size: usize,
    /// Sleep one block period between blocks (false renders as fast as possible)
    pub realtime: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            block_size: RENDER_QUANTUM_FRAMES,
            realtime: true,
        }
    }
}

impl RenderOptions {
    /// Offline rendering with the default block size
    pub fn offline() -> Self {
        Self {
            realtime: false,
            ..Self::default()
        }
    }
}

/// Final stage of the graph (the output device)
pub trait Destination: Send {
    /// Consume the first `frames` frames of a rendered block
    fn write(&mut self, block: &AudioBlock, frames: usize);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullDestination;

impl Destination for NullDestination {
    fn write(&mut self, _block: &AudioBlock, _frames: usize) {}
}

/// Records rendered audio (planar) for offline rendering and inspection
///
/// Takes a lock per block, so it is not meant for a hard-realtime device.
#[derive(Debug, Default, Clone)]
pub struct CaptureDestination {
    captured: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl CaptureDestination {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far, one `Vec` per channel
    pub fn captured(&self) -> Vec<Vec<f32>> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Frames written so far
    pub fn frames(&self) -> usize {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .map_or(0, Vec::len)
    }
}

impl Destination for CaptureDestination {
    fn write(&mut self, block: &AudioBlock, frames: usize) {
        let mut captured = self.captured.lock().unwrap_or_else(PoisonError::into_inner);
        if captured.len() < block.channel_count() {
            captured.resize_with(block.channel_count(), Vec::new);
        }
        for (ch, channel) in captured.iter_mut().enumerate().take(block.channel_count()) {
            channel.extend_from_slice(&block.channel(ch)[..frames]);
        }
    }
}

/// Commands from the control thread
pub(crate) enum GraphCommand {
    Insert { id: NodeId, node: Box<dyn AudioNode> },
    Remove(NodeId),
}

struct GraphNode {
    id: NodeId,
    node: Box<dyn AudioNode>,
    finished: bool,
}

/// Realtime side of one sound's playback chain
pub(crate) struct RenderGraph {
    source: Arc<AudioBuffer>,
    position: usize,
    nodes: Vec<GraphNode>,
    blocks: [AudioBlock; 2],
    end_of_input: AudioBlock,
    commands: Receiver<GraphCommand>,
    destination: Box<dyn Destination>,
}

impl RenderGraph {
    pub(crate) fn new(
        source: Arc<AudioBuffer>,
        block_size: usize,
        commands: Receiver<GraphCommand>,
        destination: Box<dyn Destination>,
    ) -> Self {
        let channels = source.channel_count();
        Self {
            source,
            position: 0,
            nodes: Vec::with_capacity(NODE_CAPACITY),
            blocks: [
                AudioBlock::new(channels, block_size),
                AudioBlock::new(channels, block_size),
            ],
            end_of_input: AudioBlock::empty(),
            commands,
            destination,
        }
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                GraphCommand::Insert { id, node } => self.nodes.push(GraphNode {
                    id,
                    node,
                    finished: false,
                }),
                GraphCommand::Remove(id) => self.nodes.retain(|n| n.id != id),
            }
        }
    }

    /// Render one block; returns false once the source is exhausted
    pub(crate) fn render_block(&mut self) -> bool {
        self.apply_commands();

        let frames = self.blocks[0].read_from_buffer(&self.source, self.position);
        if frames == 0 {
            self.finish();
            return false;
        }
        self.position += frames;

        // Ping-pong between the two blocks; `current` holds the latest signal
        let mut current = 0;
        for graph_node in &mut self.nodes {
            let (first, second) = self.blocks.split_at_mut(1);
            let (input, output) = if current == 0 {
                (&first[0], &mut second[0])
            } else {
                (&second[0], &mut first[0])
            };

            match graph_node.node.process(input, output) {
                ProcessStatus::Continue => current = 1 - current,
                ProcessStatus::Done => graph_node.finished = true,
            }
        }
        self.nodes.retain(|n| !n.finished);

        self.destination.write(&self.blocks[current], frames);
        true
    }

    /// Tell every node the input is gone, then drop them
    fn finish(&mut self) {
        for graph_node in &mut self.nodes {
            graph_node.node.process(&self.end_of_input, &mut self.blocks[1]);
        }
        self.nodes.clear();
    }

    #[cfg(test)]
    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Spawn the render thread for a graph
///
/// `on_exit` runs on the render thread after the last block, whether the
/// source ran out or `stop` was raised.
pub(crate) fn spawn_render_thread(
    name: &str,
    mut graph: RenderGraph,
    options: RenderOptions,
    stop: Arc<AtomicBool>,
    on_exit: impl FnOnce() + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    let sample_rate = graph.source.sample_rate().as_hz();
    let block_period = options
        .realtime
        .then(|| Duration::from_secs_f64(options.block_size as f64 / f64::from(sample_rate)));

    thread::Builder::new()
        .name(format!("soundbit-render-{}", name))
        .spawn(move || {
            while !stop.load(Ordering::Acquire) {
                if !graph.render_block() {
                    break;
                }
                if let Some(period) = block_period {
                    thread::sleep(period);
                }
            }
            drop(graph);
            on_exit();
        })
}
