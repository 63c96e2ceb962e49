//! Interfaces to the audio host
//!
//! The host owns decoding, the playback graph and the realtime callback.
//! Normalization only needs to register a processor once, read a sound's
//! decoded buffer, insert a node after the sound's source and hear about the
//! sound ending.

use crate::error::Result;
use crate::registry::ProcessorRegistry;
use async_trait::async_trait;
use soundbit_core::{AudioBuffer, AudioNode};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Callback fired once when a sound finishes
pub type EndCallback = Box<dyn FnOnce() + Send + 'static>;

/// Identifier of a node inside one sound's graph
pub type NodeId = u64;

/// The audio service processors are registered with
#[async_trait]
pub trait AudioHost: Send + Sync {
    /// Whether an audio context exists (it may not before user interaction)
    fn is_available(&self) -> bool;

    /// Load the processing module for `name`
    ///
    /// May suspend; may fail. Callers are expected to go through
    /// [`processor_registry`](Self::processor_registry) so this runs at most
    /// once per successful registration.
    async fn register_processor(&self, name: &'static str) -> Result<()>;

    /// Registration guard for this host, shared by every normalizer using it
    fn processor_registry(&self) -> &ProcessorRegistry;
}

/// An active playback handle
pub trait Sound: Send + Sync {
    /// Identifier of the sound (e.g., the soundbit it belongs to)
    fn id(&self) -> &str;

    /// The fully decoded buffer being played
    fn buffer(&self) -> Arc<AudioBuffer>;

    /// Insert a node between the sound's source and the output
    fn connect_node(&self, node: Box<dyn AudioNode>) -> Result<NodeConnection>;

    /// Run `callback` when playback ends (immediately if it already has)
    fn on_end(&self, callback: EndCallback);
}

struct ConnectionInner {
    node_id: NodeId,
    connected: AtomicBool,
    disconnect: Box<dyn Fn(NodeId) + Send + Sync>,
}

/// Control-side handle to a node inserted into a graph
///
/// `disconnect()` is idempotent and never waits for the render thread: the
/// node is dropped from the graph at the next block boundary.
#[derive(Clone)]
pub struct NodeConnection {
    inner: Arc<ConnectionInner>,
}

impl NodeConnection {
    /// Wrap a host-specific disconnect action
    pub fn new(node_id: NodeId, disconnect: impl Fn(NodeId) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                node_id,
                connected: AtomicBool::new(true),
                disconnect: Box::new(disconnect),
            }),
        }
    }

    /// Node identifier within its graph
    pub fn node_id(&self) -> NodeId {
        self.inner.node_id
    }

    /// Whether `disconnect()` has not been called yet
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Remove the node from the graph
    pub fn disconnect(&self) {
        if self.inner.connected.swap(false, Ordering::AcqRel) {
            (self.inner.disconnect)(self.inner.node_id);
            tracing::debug!("Disconnected node {}", self.inner.node_id);
        }
    }
}

impl fmt::Debug for NodeConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConnection")
            .field("node_id", &self.inner.node_id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_disconnect_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let connection = NodeConnection::new(7, move |id| {
            assert_eq!(id, 7);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let clone = connection.clone();

        assert!(connection.is_connected());
        connection.disconnect();
        clone.disconnect();
        connection.disconnect();

        assert!(!clone.is_connected());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_output() {
        let connection = NodeConnection::new(3, |_| {});
        assert_eq!(
            format!("{:?}", connection),
            "NodeConnection { node_id: 3, connected: true }"
        );
    }
}
