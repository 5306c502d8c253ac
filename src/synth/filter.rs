// Filter - State Variable Filter (topology-preserving transform)
//
// 2-pole state variable filter with trapezoidal integrators.
//
// References:
// - Andrew Simper, "Linear Trapezoidal Integrated SVF" (Cytomic, 2013)
// - Vadim Zavalishin, "The Art of VA Filter Design"
//
// Characteristics:
// - 12dB/octave slope (2-pole)
// - Stable for any cutoff below Nyquist, so hi-hat bands at 8-10 kHz work
//   at 44.1 kHz
// - Band-pass output normalised to unity gain at the centre frequency

use std::f32::consts::PI;

/// Filter type/mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Low-pass filter (12dB/octave)
    #[default]
    LowPass,
    /// High-pass filter (12dB/octave)
    HighPass,
    /// Band-pass filter (6dB/octave on each side)
    BandPass,
}

/// Filter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Cutoff (or centre) frequency in Hz
    pub cutoff: f32,
    /// Q factor (0.5 - 20.0)
    pub resonance: f32,
    pub filter_type: FilterType,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            cutoff: 1000.0,
            resonance: 0.707, // Butterworth response
            filter_type: FilterType::LowPass,
        }
    }
}

/// State Variable Filter
///
/// Parameters are fixed for the lifetime of a drum hit, so coefficients are
/// computed once in `new`.
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    filter_type: FilterType,

    // Coefficients
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,

    // Integrator states
    ic1eq: f32,
    ic2eq: f32,
}

impl StateVariableFilter {
    pub fn new(params: FilterParams, sample_rate: f32) -> Self {
        // Keep the cutoff strictly below Nyquist
        let max_cutoff = sample_rate * 0.49;
        let cutoff = params.cutoff.clamp(20.0, max_cutoff);
        let q = params.resonance.clamp(0.5, 20.0);

        let g = (PI * cutoff / sample_rate).tan();
        let k = 1.0 / q;
        let a1 = 1.0 / (1.0 + g * (g + k));
        let a2 = g * a1;
        let a3 = g * a2;

        Self {
            filter_type: params.filter_type,
            k,
            a1,
            a2,
            a3,
            ic1eq: 0.0,
            ic2eq: 0.0,
        }
    }

    /// Clear integrator states
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        match self.filter_type {
            FilterType::LowPass => v2,
            FilterType::HighPass => input - self.k * v1 - v2,
            FilterType::BandPass => self.k * v1,
        }
    }
}
