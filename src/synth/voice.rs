// Drum voice - one sounding hit built from a tonal layer and a noise layer

use super::envelope::ExpRamp;
use super::filter::{FilterParams, StateVariableFilter};
use super::oscillator::ToneOscillator;
use super::params::{NoiseLayer, ToneLayer, pick};
use crate::sequencer::instrument::Instrument;

/// White noise from a linear congruential generator
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u32,
}

impl NoiseSource {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform sample in [-1, 1)
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        (self.state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
    }
}

struct ToneVoice {
    osc: ToneOscillator,
    pitch: ExpRamp,
    gain: ExpRamp,
    remaining: u32,
}

impl ToneVoice {
    fn new(layer: &ToneLayer, accented: bool, sample_rate: f32) -> Self {
        Self {
            osc: ToneOscillator::new(layer.waveform, sample_rate),
            pitch: ExpRamp::new(
                pick(layer.start_hz, accented),
                pick(layer.end_hz, accented),
                layer.sweep_secs,
                sample_rate,
            ),
            gain: ExpRamp::decay(pick(layer.gain, accented), layer.decay_secs, sample_rate),
            remaining: (layer.stop_secs * sample_rate) as u32,
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        if self.remaining == 0 {
            return 0.0;
        }
        self.remaining -= 1;
        self.osc.next_sample(self.pitch.next_value()) * self.gain.next_value()
    }
}

struct NoiseVoice {
    source: NoiseSource,
    filters: [Option<StateVariableFilter>; 2],
    gain: ExpRamp,
    remaining: u32,
}

impl NoiseVoice {
    fn new(layer: &NoiseLayer, accented: bool, sample_rate: f32, seed: u32) -> Self {
        let filters = layer.bands.map(|band| {
            band.map(|band| {
                StateVariableFilter::new(
                    FilterParams {
                        cutoff: pick(band.cutoff_hz, accented),
                        resonance: band.q,
                        filter_type: band.kind.into(),
                    },
                    sample_rate,
                )
            })
        });

        Self {
            source: NoiseSource::new(seed),
            filters,
            gain: ExpRamp::decay(pick(layer.gain, accented), layer.decay_secs, sample_rate),
            remaining: (layer.stop_secs * sample_rate) as u32,
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        if self.remaining == 0 {
            return 0.0;
        }
        self.remaining -= 1;
        let mut sample = self.source.next_sample();
        for filter in self.filters.iter_mut().flatten() {
            sample = filter.process(sample);
        }
        sample * self.gain.next_value()
    }
}

/// A pre-allocated voice slot
///
/// Retriggering a slot replaces whatever it was playing.
pub struct DrumVoice {
    sample_rate: f32,
    instrument: Option<Instrument>,
    tone: Option<ToneVoice>,
    noise: Option<NoiseVoice>,
    /// Trigger counter value when started (lower = older)
    age: u64,
}

impl DrumVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            instrument: None,
            tone: None,
            noise: None,
            age: 0,
        }
    }

    pub fn trigger(&mut self, instrument: Instrument, accented: bool, age: u64) {
        let params = instrument.voice();
        // Decorrelate noise between hits
        let seed = (age as u32).wrapping_mul(2654435761) ^ 0x9E37_79B9;

        self.instrument = Some(instrument);
        self.age = age;
        self.tone = params
            .tone
            .map(|layer| ToneVoice::new(&layer, accented, self.sample_rate));
        self.noise = params
            .noise
            .map(|layer| NoiseVoice::new(&layer, accented, self.sample_rate, seed));
    }

    pub fn is_active(&self) -> bool {
        self.tone.as_ref().is_some_and(|t| t.remaining > 0)
            || self.noise.as_ref().is_some_and(|n| n.remaining > 0)
    }

    pub fn instrument(&self) -> Option<Instrument> {
        self.instrument.filter(|_| self.is_active())
    }

    pub fn get_age(&self) -> u64 {
        self.age
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut sample = 0.0;
        if let Some(tone) = self.tone.as_mut() {
            sample += tone.next_sample();
        }
        if let Some(noise) = self.noise.as_mut() {
            sample += noise.next_sample();
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    fn render(voice: &mut DrumVoice, samples: usize) -> Vec<f32> {
        (0..samples).map(|_| voice.next_sample()).collect()
    }

    #[test]
    fn test_idle_voice_is_silent() {
        let mut voice = DrumVoice::new(SAMPLE_RATE);
        assert!(!voice.is_active());
        assert!(render(&mut voice, 64).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_kick_stops_after_half_a_second() {
        let mut voice = DrumVoice::new(SAMPLE_RATE);
        voice.trigger(Instrument::Kick, false, 1);
        assert!(voice.is_active());
        assert_eq!(voice.instrument(), Some(Instrument::Kick));

        render(&mut voice, (0.5 * SAMPLE_RATE) as usize);
        assert!(!voice.is_active());
        assert_eq!(voice.instrument(), None);
        assert_eq!(voice.next_sample(), 0.0);
    }

    #[test]
    fn test_every_voice_ends_with_its_longest_layer() {
        for instrument in Instrument::ALL {
            let mut voice = DrumVoice::new(SAMPLE_RATE);
            voice.trigger(instrument, true, 1);
            let length = (instrument.voice().length_secs() * SAMPLE_RATE) as usize;
            render(&mut voice, length.saturating_sub(64));
            assert!(voice.is_active(), "{:?} ended early", instrument);
            render(&mut voice, 128);
            assert!(!voice.is_active(), "{:?} still playing", instrument);
        }
    }

    #[test]
    fn test_every_instrument_produces_sound() {
        for instrument in Instrument::ALL {
            let mut voice = DrumVoice::new(SAMPLE_RATE);
            voice.trigger(instrument, false, 7);
            let peak = render(&mut voice, 1200)
                .iter()
                .fold(0.0f32, |acc, s| acc.max(s.abs()));
            assert!(peak > 0.01, "{:?} peak {}", instrument, peak);
        }
    }

    #[test]
    fn test_accent_is_louder() {
        let energy = |accented: bool| {
            let mut voice = DrumVoice::new(SAMPLE_RATE);
            voice.trigger(Instrument::Kick, accented, 3);
            render(&mut voice, 4800).iter().map(|s| s * s).sum::<f32>()
        };
        assert!(energy(true) > energy(false));
    }

    #[test]
    fn test_noise_source_range() {
        let mut noise = NoiseSource::new(12345);
        for _ in 0..10000 {
            let s = noise.next_sample();
            assert!((-1.0..1.0).contains(&s));
        }
    }
}
