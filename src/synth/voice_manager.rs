// Voice Manager - polyphony and sample-accurate trigger start

use super::voice::DrumVoice;
use crate::sequencer::instrument::Instrument;

const MAX_VOICES: usize = 32;
/// Triggers waiting for their start frame
const MAX_PENDING: usize = 256;

#[derive(Debug, Clone, Copy)]
struct PendingTrigger {
    start_sample: u64,
    instrument: Instrument,
    accented: bool,
}

/// Drum voice pool fed by timed triggers
///
/// All storage is allocated up front so the audio callback never allocates.
pub struct VoiceManager {
    voices: [DrumVoice; MAX_VOICES],
    pending: Vec<PendingTrigger>,
    /// Earliest start frame in `pending` (u64::MAX when empty)
    next_due: u64,
    /// Age counter incremented on each trigger for voice stealing priority
    age_counter: u64,
}

impl VoiceManager {
    pub fn new(sample_rate: f32) -> Self {
        let voices = std::array::from_fn(|_| DrumVoice::new(sample_rate));

        Self {
            voices,
            pending: Vec::with_capacity(MAX_PENDING),
            next_due: u64::MAX,
            age_counter: 0,
        }
    }

    /// Queue a hit to start at an absolute frame index
    ///
    /// Returns false (and drops the hit) when the queue is full.
    pub fn schedule(&mut self, start_sample: u64, instrument: Instrument, accented: bool) -> bool {
        if self.pending.len() >= MAX_PENDING {
            return false;
        }
        self.pending.push(PendingTrigger {
            start_sample,
            instrument,
            accented,
        });
        self.next_due = self.next_due.min(start_sample);
        true
    }

    /// Start a hit right now
    pub fn trigger(&mut self, instrument: Instrument, accented: bool) {
        self.age_counter = self.age_counter.wrapping_add(1);

        let index = self
            .voices
            .iter()
            .position(|v| !v.is_active())
            .unwrap_or_else(|| self.find_voice_to_steal());
        self.voices[index].trigger(instrument, accented, self.age_counter);
    }

    /// Oldest sounding voice
    fn find_voice_to_steal(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, voice)| voice.get_age())
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Start every queued hit due at or before `sample`
    ///
    /// Late hits (start frame already passed) start immediately. Hits due on
    /// the same frame start in the order they were queued.
    pub fn start_due(&mut self, sample: u64) {
        if sample < self.next_due {
            return;
        }

        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].start_sample <= sample {
                let due = self.pending.remove(i);
                self.trigger(due.instrument, due.accented);
            } else {
                i += 1;
            }
        }

        self.next_due = self
            .pending
            .iter()
            .map(|p| p.start_sample)
            .min()
            .unwrap_or(u64::MAX);
    }

    /// Mix all voices for one frame
    pub fn next_sample(&mut self) -> f32 {
        self.voices.iter_mut().map(|v| v.next_sample()).sum::<f32>()
    }

    /// Start due hits for this frame, then render it
    #[inline]
    pub fn process_frame(&mut self, sample: u64) -> f32 {
        self.start_due(sample);
        self.next_sample()
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
