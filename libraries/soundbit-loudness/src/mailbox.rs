//! Control thread -> render thread loudness hand-off
//!
//! A single slot holding the most recently measured loudness. The control
//! thread overwrites it; the render thread reads it at block boundaries.
//! Neither side ever blocks, and nothing is queued: last write wins.

use crate::gain::gain_for_loudness;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Bit pattern marking an empty slot (a NaN payload `post` never stores)
const UNSET: u64 = u64::MAX;

/// Lock-free single-slot mailbox for a loudness value in LUFS
#[derive(Debug)]
pub struct LoudnessMailbox {
    slot: AtomicU64,
}

impl Default for LoudnessMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl LoudnessMailbox {
    /// Create an empty mailbox
    pub fn new() -> Self {
        Self {
            slot: AtomicU64::new(UNSET),
        }
    }

    /// Overwrite the slot with a new measurement
    pub fn post(&self, lufs: f64) {
        let bits = lufs.to_bits();
        let bits = if bits == UNSET { f64::NAN.to_bits() } else { bits };
        self.slot.store(bits, Ordering::Release);
    }

    /// Latest posted value, if any
    pub fn latest(&self) -> Option<f64> {
        self.latest_bits().map(f64::from_bits)
    }

    /// Whether any value has been posted
    pub fn is_set(&self) -> bool {
        self.latest_bits().is_some()
    }

    /// Raw bit pattern of the latest value (cheap change detection)
    #[inline]
    pub(crate) fn latest_bits(&self) -> Option<u64> {
        match self.slot.load(Ordering::Acquire) {
            UNSET => None,
            bits => Some(bits),
        }
    }
}

/// Control-side handle for posting loudness to a processor
///
/// Cloning is cheap; every clone feeds the same processor.
#[derive(Debug, Clone)]
pub struct LoudnessPort {
    mailbox: Arc<LoudnessMailbox>,
    target_lufs: f64,
}

impl LoudnessPort {
    pub(crate) fn new(target_lufs: f64) -> Self {
        Self {
            mailbox: Arc::new(LoudnessMailbox::new()),
            target_lufs,
        }
    }

    /// Post a measured loudness (LUFS); replaces any value not yet consumed
    pub fn post(&self, measured_lufs: f64) {
        if measured_lufs.is_finite() {
            tracing::debug!(
                "Posting loudness {:.2} LUFS (gain {:.3}x toward {:.1} LUFS)",
                measured_lufs,
                gain_for_loudness(self.target_lufs, measured_lufs),
                self.target_lufs
            );
        } else {
            tracing::warn!(
                "Non-finite loudness {} posted; playback will use unity gain",
                measured_lufs
            );
        }
        self.mailbox.post(measured_lufs);
    }

    /// Target loudness the receiving processor normalizes to
    pub fn target_lufs(&self) -> f64 {
        self.target_lufs
    }

    pub(crate) fn mailbox(&self) -> &LoudnessMailbox {
        &self.mailbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_mailbox_starts_empty() {
        let mailbox = LoudnessMailbox::new();
        assert!(!mailbox.is_set());
        assert_eq!(mailbox.latest(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mailbox = LoudnessMailbox::new();
        mailbox.post(-20.0);
        mailbox.post(-8.0);
        assert_eq!(mailbox.latest(), Some(-8.0));
    }

    #[test]
    fn test_sentinel_nan_is_canonicalized() {
        let mailbox = LoudnessMailbox::new();
        mailbox.post(f64::from_bits(UNSET));
        assert!(mailbox.is_set());
        assert!(mailbox.latest().unwrap().is_nan());
    }

    #[test]
    fn test_port_clones_share_slot() {
        let port = LoudnessPort::new(-14.0);
        let other = port.clone();

        other.post(-30.0);
        assert_eq!(port.mailbox().latest(), Some(-30.0));
        assert_eq!(port.target_lufs(), -14.0);
    }

    #[test]
    fn test_post_from_another_thread() {
        let port = LoudnessPort::new(-14.0);
        let writer = port.clone();

        thread::spawn(move || writer.post(-18.5)).join().unwrap();

        assert_eq!(port.mailbox().latest(), Some(-18.5));
    }
}
