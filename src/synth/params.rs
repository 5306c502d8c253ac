// Voice parameters - static synthesis recipes for the drum voices
//
// Every tuple is (normal, accented). Accented hits are louder and tuned
// slightly brighter.

use crate::synth::filter::FilterType;

pub use crate::synth::oscillator::Waveform;

/// Filter stage applied to a noise layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    HighPass,
    BandPass,
}

impl From<BandKind> for FilterType {
    fn from(kind: BandKind) -> Self {
        match kind {
            BandKind::HighPass => FilterType::HighPass,
            BandKind::BandPass => FilterType::BandPass,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterBand {
    pub kind: BandKind,
    pub cutoff_hz: (f32, f32),
    pub q: f32,
}

impl FilterBand {
    pub const fn new(kind: BandKind, cutoff_hz: (f32, f32)) -> Self {
        Self {
            kind,
            cutoff_hz,
            q: 1.0,
        }
    }

    pub const fn with_q(mut self, q: f32) -> Self {
        self.q = q;
        self
    }
}

/// Oscillator with an exponential pitch sweep and exponential decay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneLayer {
    pub waveform: Waveform,
    pub start_hz: (f32, f32),
    pub end_hz: (f32, f32),
    /// Time to glide from start to end frequency (0 = fixed pitch)
    pub sweep_secs: f32,
    pub gain: (f32, f32),
    /// Time for the gain to fall to -60 dB
    pub decay_secs: f32,
    pub stop_secs: f32,
}

/// White noise through up to two filter stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseLayer {
    pub bands: [Option<FilterBand>; 2],
    pub gain: (f32, f32),
    pub decay_secs: f32,
    pub stop_secs: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    pub tone: Option<ToneLayer>,
    pub noise: Option<NoiseLayer>,
}

impl VoiceParams {
    /// Length of the longest layer in seconds
    pub fn length_secs(&self) -> f32 {
        let tone = self.tone.map_or(0.0, |t| t.stop_secs);
        let noise = self.noise.map_or(0.0, |n| n.stop_secs);
        tone.max(noise)
    }
}

/// Pick the normal or accented member of a parameter pair
#[inline]
pub fn pick(pair: (f32, f32), accented: bool) -> f32 {
    if accented { pair.1 } else { pair.0 }
}
