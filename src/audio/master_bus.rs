// Master bus - last stage before the device buffer

use crate::audio::level::MasterLevel;

/// Master level smoothing time
const MASTER_SMOOTHING_MS: f32 = 10.0;

// Decaying drum tails produce plenty of these
const DENORMAL_THRESHOLD: f32 = 1e-15;

#[inline]
fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

/// Applies the master level and keeps the mix inside [-1, 1]
///
/// Level changes are followed by a one-pole smoother so slider moves do
/// not click. Accented hits stacked on one step can sum above 1.0; tanh
/// rounds them off instead of wrapping.
pub struct MasterBus {
    level: MasterLevel,
    gain: f32,
    coefficient: f32,
}

impl MasterBus {
    pub fn new(level: MasterLevel, sample_rate: f32) -> Self {
        let smoothing_samples = MASTER_SMOOTHING_MS * 0.001 * sample_rate;
        Self {
            gain: level.get(),
            coefficient: (1.0 / smoothing_samples).min(1.0),
            level,
        }
    }

    /// Gain currently applied, after smoothing
    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn process(&mut self, mix: f32) -> f32 {
        self.gain = flush_denormal(self.gain + self.coefficient * (self.level.get() - self.gain));
        (flush_denormal(mix) * self.gain).tanh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    #[test]
    fn test_starts_at_current_level() {
        let bus = MasterBus::new(MasterLevel::new(0.4), SAMPLE_RATE);
        assert_eq!(bus.gain(), 0.4);
    }

    #[test]
    fn test_level_change_is_smoothed() {
        let level = MasterLevel::new(0.0);
        let mut bus = MasterBus::new(level.clone(), SAMPLE_RATE);
        level.set(1.0);

        let first = bus.process(0.5);
        assert!(first > 0.0 && first < 0.01, "jumped to {}", first);

        // 100ms is ten time constants
        for _ in 0..4410 {
            bus.process(0.5);
        }
        assert!((bus.gain() - 1.0).abs() < 0.01);
        assert!(bus.gain() <= 1.0);
    }

    #[test]
    fn test_loud_mix_is_soft_clipped() {
        let mut bus = MasterBus::new(MasterLevel::new(1.0), SAMPLE_RATE);
        let out = bus.process(10.0);
        assert!(out <= 1.0 && out > 0.99);
        let out = bus.process(-10.0);
        assert!(out >= -1.0 && out < -0.99);
        assert!((bus.process(0.5) - 0.5f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_denormal_mix_is_silenced() {
        let mut bus = MasterBus::new(MasterLevel::new(1.0), SAMPLE_RATE);
        assert_eq!(bus.process(1e-20), 0.0);
    }
}
