// Clock - monotonic time source in the audio device's clock domain

use crate::audio::timing::AudioTiming;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Time source used to schedule triggers
///
/// `now()` must be monotonic and expressed in the same reference frame the
/// synthesizer uses for trigger times.
pub trait Clock: Send + Sync {
    /// Current time in seconds
    fn now(&self) -> f64;
}

/// Clock driven by the output device's frame counter
#[derive(Clone)]
pub struct AudioClock {
    timing: AudioTiming,
}

impl AudioClock {
    pub fn new(timing: AudioTiming) -> Self {
        Self { timing }
    }
}

impl Clock for AudioClock {
    fn now(&self) -> f64 {
        self.timing.seconds()
    }
}

/// Hand-driven clock for tests, benches and offline rendering
#[derive(Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1.5);
        assert_eq!(clock.now(), 1.5);
        clock.advance(0.25);
        assert_eq!(clock.now(), 1.75);

        let shared = clock.clone();
        clock.set(3.0);
        assert_eq!(shared.now(), 3.0);
    }

    #[test]
    fn test_audio_clock_follows_frames() {
        let timing = AudioTiming::new(48000.0);
        let clock = AudioClock::new(timing.clone());
        assert_eq!(clock.now(), 0.0);
        timing.advance(24000);
        assert!((clock.now() - 0.5).abs() < 1e-12);
    }
}
