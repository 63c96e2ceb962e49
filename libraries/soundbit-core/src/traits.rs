//! Core traits
//!
//! Interfaces implemented by nodes that live inside the realtime render path.

use crate::types::{AudioBlock, ProcessStatus};

/// Static description of an audio node, for logging and introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    /// Registered processor name (e.g., "loudness-normalizer")
    pub name: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
}

/// A processing node inserted between a sound source and the output
///
/// # Safety
/// - `process()` must NOT allocate memory (real-time constraint)
/// - Nodes must be Send so they can move onto the render thread
///
/// # Real-Time Constraints
/// - No allocations
/// - No blocking operations (no locks, no waiting on the control thread)
/// - Deterministic execution time
pub trait AudioNode: Send {
    /// Process one render quantum
    ///
    /// `input` and `output` are distinct buffers owned by the graph and only
    /// borrowed for the duration of this call.
    ///
    /// Returns [`ProcessStatus::Done`] when the node has nothing more to
    /// produce and should be dropped from the graph.
    fn process(&mut self, input: &AudioBlock, output: &mut AudioBlock) -> ProcessStatus;

    /// Get node information
    fn info(&self) -> NodeInfo;
}
