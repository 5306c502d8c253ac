// Tone oscillator for the pitched drum layers
//
// Every tone layer sweeps its pitch, so the frequency is passed in with each
// sample instead of being held as state.

use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

impl Waveform {
    /// Value at `phase` in [0, 1), zero-crossing upwards at phase 0
    #[inline]
    fn at(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 { 1.0 } else { -1.0 }
            }
            Waveform::Triangle => {
                if phase < 0.25 {
                    phase * 4.0
                } else if phase < 0.75 {
                    2.0 - phase * 4.0
                } else {
                    phase * 4.0 - 4.0
                }
            }
        }
    }
}

/// Phase accumulator starting at phase 0 when a hit begins
pub struct ToneOscillator {
    waveform: Waveform,
    phase: f32,
    inv_sample_rate: f32,
}

impl ToneOscillator {
    pub fn new(waveform: Waveform, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            inv_sample_rate: 1.0 / sample_rate,
        }
    }

    /// Emit the current sample, then advance by `freq`
    ///
    /// The increment is capped at Nyquist so a runaway sweep cannot skip
    /// whole cycles.
    #[inline]
    pub fn next_sample(&mut self, freq: f32) -> f32 {
        let sample = self.waveform.at(self.phase);
        self.phase += (freq * self.inv_sample_rate).clamp(0.0, 0.5);
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;
    const EPSILON: f32 = 0.001;

    #[test]
    fn test_hits_start_at_phase_zero() {
        for waveform in [Waveform::Sine, Waveform::Triangle] {
            let mut osc = ToneOscillator::new(waveform, SAMPLE_RATE);
            assert!(osc.next_sample(150.0).abs() < EPSILON, "{:?}", waveform);
        }
        let mut square = ToneOscillator::new(Waveform::Square, SAMPLE_RATE);
        assert_eq!(square.next_sample(150.0), 1.0);
    }

    #[test]
    fn test_phase_advances_with_frequency() {
        let mut osc = ToneOscillator::new(Waveform::Sine, SAMPLE_RATE);
        osc.next_sample(441.0);
        assert!((osc.phase - 0.01).abs() < 1e-6);
        osc.next_sample(882.0);
        assert!((osc.phase - 0.03).abs() < 1e-6);
    }

    #[test]
    fn test_increment_capped_at_nyquist() {
        let mut osc = ToneOscillator::new(Waveform::Square, SAMPLE_RATE);
        osc.next_sample(1.0e6);
        assert!((osc.phase - 0.5).abs() < 1e-6);
        osc.next_sample(-500.0);
        assert!((osc.phase - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_square_wave() {
        let mut osc = ToneOscillator::new(Waveform::Square, SAMPLE_RATE);
        for _ in 0..1000 {
            let sample = osc.next_sample(1150.0);
            assert!(sample == 1.0 || sample == -1.0, "Square sample not ±1.0: {}", sample);
        }
    }

    #[test]
    fn test_triangle_range_during_sweep() {
        let mut osc = ToneOscillator::new(Waveform::Triangle, SAMPLE_RATE);
        for i in 0..10000 {
            let sample = osc.next_sample(400.0 - i as f32 * 0.03);
            assert!((-1.0..=1.0).contains(&sample), "Triangle sample out of range: {}", sample);
            assert!(osc.phase >= 0.0 && osc.phase < 1.0);
        }
    }
}
