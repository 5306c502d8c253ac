// Exponential ramp envelope
//
// Moves a value geometrically from `start` to `target` over a fixed number
// of samples, then holds the target. Drives both gain decays and pitch sweeps
// of the drum voices.

/// Floor reached by every gain decay (-60 dB)
pub const DECAY_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpRamp {
    value: f32,
    target: f32,
    /// Per-sample multiplier
    ratio: f32,
    remaining: u32,
}

impl ExpRamp {
    /// Ramp from `start` to `target` in `duration_secs`
    ///
    /// Both ends must be strictly positive. A zero duration jumps to the
    /// target on the first sample.
    pub fn new(start: f32, target: f32, duration_secs: f32, sample_rate: f32) -> Self {
        let start = start.max(f32::MIN_POSITIVE);
        let target = target.max(f32::MIN_POSITIVE);
        let samples = (duration_secs.max(0.0) * sample_rate).round() as u32;

        if samples == 0 {
            return Self::constant(target);
        }

        Self {
            value: start,
            target,
            ratio: (target / start).powf(1.0 / samples as f32),
            remaining: samples,
        }
    }

    /// Gain decay from `gain` down to the -60 dB floor
    pub fn decay(gain: f32, duration_secs: f32, sample_rate: f32) -> Self {
        Self::new(gain, DECAY_FLOOR, duration_secs, sample_rate)
    }

    pub fn constant(value: f32) -> Self {
        Self {
            value,
            target: value,
            ratio: 1.0,
            remaining: 0,
        }
    }

    /// Current value, then advance one sample
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        let current = self.value;
        if self.remaining > 0 {
            self.remaining -= 1;
            self.value = if self.remaining == 0 {
                self.target
            } else {
                self.value * self.ratio
            };
        }
        current
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}
