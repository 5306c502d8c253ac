// Live editing - pad and keyboard edits, with an audible preview while playing

use super::bank::PatternStore;
use super::instrument::Instrument;
use super::pattern::{STEPS, StepIndex};
use super::scheduler::{PlayCursor, step_duration};
use super::trigger::{TriggerEvent, TriggerSink};

/// Where playback stands when an edit happens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub cursor: PlayCursor,
    pub bpm: f64,
    pub now: f64,
}

/// Clock time of the next occurrence of `target` on the unswung grid
///
/// Counts forward from the step the scheduler will commit next, wrapping
/// at the end of the bar.
pub fn preview_time(cursor: PlayCursor, target: StepIndex, step_duration: f64) -> f64 {
    let current = cursor.play_index;
    let steps_ahead = if target >= current {
        target - current
    } else {
        STEPS - current + target
    };
    cursor.next_trigger_time + steps_ahead as f64 * step_duration
}

/// Turns user edits into pattern mutations
///
/// A pad switched on during playback is also sent straight to the
/// synthesizer at its next grid time. The scheduler will commit the same
/// step again when it gets there, so the hit can sound twice.
pub struct LiveEditController {
    preview: Option<Box<dyn TriggerSink>>,
}

impl LiveEditController {
    pub fn new(preview: Box<dyn TriggerSink>) -> Self {
        Self {
            preview: Some(preview),
        }
    }

    /// Edits only, no preview output
    pub fn disconnected() -> Self {
        Self { preview: None }
    }

    /// Flip a pad; returns its new value (None for an invalid address)
    pub fn toggle_pad(
        &mut self,
        store: &mut PatternStore,
        bank: usize,
        instrument: Instrument,
        step: StepIndex,
        playback: Option<Playback>,
    ) -> Option<bool> {
        let on = store.toggle_pad(bank, instrument, step)?;

        if let (true, Some(playback), Some(sink)) = (on, playback, self.preview.as_mut()) {
            let when = preview_time(playback.cursor, step, step_duration(playback.bpm));
            if when > playback.now {
                sink.trigger(TriggerEvent::new(instrument, when, store.accents().get(step)));
            }
        }

        Some(on)
    }

    /// Flip an accent cell (never previews)
    pub fn toggle_accent(&mut self, store: &mut PatternStore, step: StepIndex) -> Option<bool> {
        store.toggle_accent(step)
    }

    /// Flip `instrument` at the step that is currently sounding
    ///
    /// Does nothing before the first step of a run has been scheduled.
    pub fn record_hit(
        &mut self,
        store: &mut PatternStore,
        bank: usize,
        instrument: Instrument,
        current_step: Option<StepIndex>,
    ) -> Option<StepIndex> {
        let step = current_step?;
        store.toggle_pad(bank, instrument, step)?;
        Some(step)
    }
}
