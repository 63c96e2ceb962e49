/// Core types for soundbit
mod audio;
mod block;

pub use audio::{AudioBuffer, SampleRate};
pub use block::{AudioBlock, ProcessStatus, RENDER_QUANTUM_FRAMES};
