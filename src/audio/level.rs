// Master output level - written by the UI, read per frame by the callback

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::sequencer::transport::DEFAULT_MASTER_LEVEL;

/// Output gain in 0.0..=1.0, shared as raw f32 bits
///
/// Clones share the same value. Writes outside the range are clamped and
/// non-finite writes are dropped, so the callback never sees a bad gain.
#[derive(Debug, Clone)]
pub struct MasterLevel {
    bits: Arc<AtomicU32>,
}

impl MasterLevel {
    pub fn new(level: f32) -> Self {
        let level = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            DEFAULT_MASTER_LEVEL
        };
        Self {
            bits: Arc::new(AtomicU32::new(level.to_bits())),
        }
    }

    pub fn set(&self, level: f32) {
        if level.is_finite() {
            self.bits
                .store(level.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for MasterLevel {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_LEVEL)
    }
}
