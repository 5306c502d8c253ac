// Sequencer snapshot - immutable view of what the scheduler plays

use super::bank::PatternStore;
use super::pattern::{AccentPattern, Pattern};
use super::scheduler::step_duration;
use super::transport::TransportParams;

/// Everything one scheduler pass reads
///
/// Built by the UI thread after each edit and swapped in atomically, so the
/// scheduler never observes a half-applied change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerSnapshot {
    /// Pattern of the current bank
    pub pattern: Pattern,
    pub accents: AccentPattern,
    pub bpm: f64,
    pub swing_percent: u32,
}

impl SequencerSnapshot {
    pub fn capture(store: &PatternStore, params: &TransportParams) -> Self {
        Self {
            pattern: store.bank(params.current_bank).copied().unwrap_or_default(),
            accents: *store.accents(),
            bpm: params.bpm as f64,
            swing_percent: params.swing_percent,
        }
    }

    pub fn step_duration(&self) -> f64 {
        step_duration(self.bpm)
    }
}

impl Default for SequencerSnapshot {
    fn default() -> Self {
        Self::capture(&PatternStore::default(), &TransportParams::default())
    }
}
