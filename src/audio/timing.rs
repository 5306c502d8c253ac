// Audio timing - sample counter shared between the callback and the sequencer

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Count of frames consumed by the output device
///
/// The audio callback advances it; everyone else reads it to know "now"
/// in the device's clock domain.
#[derive(Clone)]
pub struct AudioTiming {
    /// Current sample position (incremented by audio callback)
    sample_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    /// Frames rendered so far
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Acquire)
    }

    /// Advance sample position (called from audio callback)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::AcqRel);
    }

    /// Device time in seconds
    pub fn seconds(&self) -> f64 {
        self.current_sample() as f64 / self.sample_rate
    }

    /// Absolute time in seconds to an absolute frame index (rounded)
    pub fn seconds_to_samples(&self, seconds: f64) -> u64 {
        if seconds <= 0.0 {
            0
        } else {
            (seconds * self.sample_rate).round() as u64
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_creation() {
        let timing = AudioTiming::new(48000.0);
        assert_eq!(timing.current_sample(), 0);
        assert_eq!(timing.sample_rate(), 48000.0);
        assert_eq!(timing.seconds(), 0.0);
    }

    #[test]
    fn test_advance_samples() {
        let timing = AudioTiming::new(48000.0);
        timing.advance(480);
        assert_eq!(timing.current_sample(), 480);
        timing.advance(480);
        assert_eq!(timing.current_sample(), 960);
        assert!((timing.seconds() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_seconds_to_samples() {
        let timing = AudioTiming::new(48000.0);
        assert_eq!(timing.seconds_to_samples(1.0), 48000);
        assert_eq!(timing.seconds_to_samples(0.125), 6000);
        assert_eq!(timing.seconds_to_samples(-0.5), 0);
    }

    #[test]
    fn test_clones_share_position() {
        let timing = AudioTiming::new(44100.0);
        let reader = timing.clone();
        timing.advance(441);
        assert_eq!(reader.current_sample(), 441);
    }
}
